//! Masked scoring models on libtorch.
//!
//! A scoring model maps features to one score per action and knows nothing
//! about training. Legality enters only through [`mask`], which floors
//! illegal scores before normalizing.
//!
//! # Module Structure
//!
//! - `scorer` — [`Scorer`] and the trainable [`Network`] seam
//! - `masking` — Masked log-softmax and negative log-likelihood on tensors
//! - `batch` — Labelled rows stacked into tensors
//! - `mlp` — Dense ReLU network in a `tch` var store
//! - `adam` — `tch` Adam over a network's var store
//! - `checkpoint` — Var store weights plus JSON sidecar
//! - `policy` — Greedy masked-argmax policy over a frozen scorer

mod adam;
mod batch;
mod checkpoint;
mod masking;
mod mlp;
mod policy;
mod scorer;

pub use adam::*;
pub use batch::*;
pub use checkpoint::*;
pub use masking::*;
pub use mlp::*;
pub use policy::*;
pub use scorer::*;
