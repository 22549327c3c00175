//! Masked classification objective.
//!
//! Illegal actions are floored to [`MASK_VALUE`] before log-softmax, never
//! after, so the resulting distribution sums to one over the legal actions
//! and is exactly zero elsewhere.

use crate::*;
use dcl_core::*;
use dcl_mdp::Mask;
use tch::Kind;
use tch::Tensor;

/// Replace scores where `legal` is false with the floor value.
pub fn mask(scores: &Tensor, legal: &Tensor) -> Tensor {
    scores.masked_fill(&legal.logical_not(), MASK_VALUE as f64)
}

/// Log-probabilities over the last dimension, restricted to the legal actions.
pub fn masked_log_softmax(scores: &Tensor, legal: &Tensor) -> Tensor {
    mask(scores, legal).log_softmax(-1, Kind::Float)
}

/// Mean negative log-likelihood of `labels` `[batch]` under masked `scores` `[batch, actions]`.
///
/// The gradient with respect to the scores is zero on illegal entries.
pub fn masked_nll(scores: &Tensor, legal: &Tensor, labels: &Tensor) -> Tensor {
    -masked_log_softmax(scores, legal)
        .gather(-1, &labels.unsqueeze(-1), false)
        .squeeze_dim(-1)
        .mean(Kind::Float)
}

/// Action probabilities of one score vector restricted to the legal actions.
pub fn masked_softmax(scores: &[Score], legal: &Mask) -> Result<Vec<Probability>> {
    if scores.len() != legal.len() {
        return Err(Error::ActionMismatch {
            expected: legal.len(),
            found: scores.len(),
        });
    }
    if legal.none() {
        return Err(Error::AllMasked);
    }
    let probs = mask(&Tensor::from_slice(scores), &Tensor::from_slice(legal.as_slice()))
        .softmax(-1, Kind::Float);
    Vec::<Probability>::try_from(&probs).map_err(torch)
}

/// Highest-scoring legal action; ties go to the lowest index.
pub fn argmax(scores: &[Score], legal: &Mask) -> Result<Action> {
    legal
        .legal()
        .filter(|a| *a < scores.len())
        .fold(None, |best: Option<Action>, a| match best {
            Some(b) if scores[b] >= scores[a] => Some(b),
            _ => Some(a),
        })
        .ok_or(Error::AllMasked)
}
