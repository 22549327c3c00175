//! Deep controlled learning for sequential decision problems.
//!
//! This facade crate re-exports all public dcl crates for convenient access.
//!
//! ## Crate Organization
//!
//! ### Core Types
//! - [`core`] — Type aliases, constants, errors and seed derivation
//! - [`mdp`] — Simulation seam, policies, rollout improvement, lost-sales MDP
//!
//! ### Learning
//! - [`nn`] — Masked scoring models, objective, optimizer and checkpoints
//! - [`train`] — Sample generation, training, and the generation loop
//!
//! ### Evaluation
//! - [`compare`] — Common-random-number policy comparison

pub use dcl_core        as core;
pub use dcl_mdp         as mdp;
pub use dcl_nn          as nn;
pub use dcl_train       as train;
pub use dcl_compare     as compare;
