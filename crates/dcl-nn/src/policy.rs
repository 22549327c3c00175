use crate::*;
use dcl_core::*;
use dcl_mdp::Mdp;
use dcl_mdp::Policy;
use dcl_mdp::Trajectory;
use rand::rngs::SmallRng;
use std::sync::Arc;

/// Greedy policy over a frozen scorer: the best-scoring legal action.
///
/// The scorer sits behind an `Arc` so that every rollout worker reads the
/// same parameters without copying them.
pub struct NeuralPolicy<S>
where
    S: Scorer,
{
    scorer: Arc<S>,
    id: String,
}

impl<S> NeuralPolicy<S>
where
    S: Scorer,
{
    pub fn new(scorer: S, id: impl Into<String>) -> Self {
        Self {
            scorer: Arc::new(scorer),
            id: id.into(),
        }
    }
    pub fn scorer(&self) -> &S {
        &self.scorer
    }
}

impl NeuralPolicy<Mlp> {
    /// Rebuild a policy from a checkpoint, refusing one trained for other dimensions.
    pub fn load<M: Mdp>(checkpoint: &Checkpoint, mdp: &M) -> Result<Self> {
        let (mlp, meta) = checkpoint.load()?;
        meta.verify(mdp)?;
        Ok(Self::new(mlp, format!("{}/gen{}", meta.mdp, meta.generation)))
    }
}

impl<S> Clone for NeuralPolicy<S>
where
    S: Scorer,
{
    fn clone(&self) -> Self {
        Self {
            scorer: self.scorer.clone(),
            id: self.id.clone(),
        }
    }
}

impl<M, S> Policy<M> for NeuralPolicy<S>
where
    M: Mdp,
    S: Scorer,
{
    fn id(&self) -> String {
        self.id.clone()
    }
    fn act(&self, trajectory: &Trajectory<'_, M>, _: &mut SmallRng) -> Result<Action> {
        let observation = trajectory.observation();
        let scores = self.scorer.score(observation.features())?;
        argmax(&scores, observation.mask()).map_err(|e| match e {
            Error::AllMasked => Error::NoLegalActions {
                context: trajectory.context(),
            },
            other => other,
        })
    }
    fn score(&self, features: &[f32]) -> Option<Vec<Score>> {
        self.scorer.score(features).ok()
    }
}
