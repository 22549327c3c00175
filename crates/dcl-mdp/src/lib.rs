//! Simulation engine seam and policies.
//!
//! The core never owns MDP dynamics. It drives any [`Mdp`] through a
//! [`Trajectory`] and asks a [`Policy`] for each decision.
//!
//! # Module Structure
//!
//! - `mdp` — The [`Mdp`] trait and its horizon
//! - `observation` — Feature vectors and legal-action masks
//! - `trajectory` — One seeded rollout with period and return bookkeeping
//! - `policy` — The [`Policy`] capability and the uniform random baseline
//! - `rollout` — Rollout improvement over any base policy
//! - `lostsales` — Lost-sales inventory reference implementation

mod lostsales;
mod mdp;
mod observation;
mod policy;
mod rollout;
mod trajectory;

pub use lostsales::*;
pub use mdp::*;
pub use observation::*;
pub use policy::*;
pub use rollout::*;
pub use trajectory::*;
