//! Policy comparison under common random numbers.
//!
//! Trajectory `i` is seeded identically for every policy, so differences
//! between policies are measured on the same demand (or event) paths.

mod comparer;
mod report;
mod statistics;

pub use comparer::*;
pub use report::*;
pub use statistics::*;
