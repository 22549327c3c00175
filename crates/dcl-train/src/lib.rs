//! Deep controlled learning: sample, fit, reload, repeat.
//!
//! # Module Structure
//!
//! - `sample` — One labelled decision
//! - `dataset` — Ordered samples of one generation, with provenance
//! - `generator` — Parallel, index-seeded sample collection
//! - `stopping` — Early stopping on validation loss
//! - `trainer` — Masked classification epochs with checkpoint-on-save
//! - `store` — Generation-keyed checkpoint and dataset storage
//! - `generations` — The sequential generation loop

mod dataset;
mod generations;
mod generator;
mod sample;
mod stopping;
mod store;
mod trainer;

pub use dataset::*;
pub use generations::*;
pub use generator::*;
pub use sample::*;
pub use stopping::*;
pub use store::*;
pub use trainer::*;
