use crate::*;
use dcl_core::*;
use tch::Tensor;
use tch::nn;
use tch::nn::OptimizerConfig;

/// Adam with bias-corrected moment estimates over one network's parameters.
pub struct Adam {
    optimizer: nn::Optimizer,
    steps: usize,
}

impl Adam {
    pub fn new<N>(model: &N, rate: Score, beta1: Score, beta2: Score) -> Result<Self>
    where
        N: Network,
    {
        let optimizer = nn::Adam {
            beta1: beta1 as f64,
            beta2: beta2 as f64,
            eps: ADAM_EPSILON as f64,
            ..Default::default()
        }
        .build(model.vars(), rate as f64)
        .map_err(torch)?;
        Ok(Self {
            optimizer,
            steps: 0,
        })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Backpropagate `loss`, move every parameter against its gradient,
    /// and return the loss value.
    pub fn step(&mut self, loss: &Tensor) -> Result<Score> {
        self.optimizer.backward_step(loss);
        self.steps += 1;
        f64::try_from(loss).map(|l| l as Score).map_err(torch)
    }
}
