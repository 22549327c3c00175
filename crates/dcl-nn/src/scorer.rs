use dcl_core::*;
use tch::Tensor;
use tch::nn::VarStore;

/// Maps a feature vector to one raw score per action.
pub trait Scorer: Send + Sync {
    fn inputs(&self) -> usize;
    fn outputs(&self) -> usize;
    fn score(&self, features: &[f32]) -> Result<Vec<Score>>;
}

/// A [`Scorer`] whose parameters are trainable tensors in one [`VarStore`].
pub trait Network: Scorer + Sized {
    fn vars(&self) -> &VarStore;
    /// Raw scores `[batch, outputs]` for features `[batch, inputs]`, tracked by autograd.
    fn forward(&self, features: &Tensor) -> Tensor;
    /// Independent copy of the current parameters.
    fn snapshot(&self) -> Result<Self>;
}

/// Lift a libtorch failure into the workspace error.
pub fn torch(error: tch::TchError) -> Error {
    Error::Tensor(error.to_string())
}
