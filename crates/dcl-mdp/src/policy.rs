use crate::*;
use dcl_core::*;
use rand::Rng;
use rand::rngs::SmallRng;
use std::sync::Arc;

/// Anything that picks an action for a trajectory.
///
/// Policies are immutable: evaluation never mutates them, and any randomness
/// they need comes from the `rng` the caller hands in, so the same seed
/// always reproduces the same choices.
pub trait Policy<M>: Send + Sync
where
    M: Mdp,
{
    /// Identifier used in reports and checkpoints.
    fn id(&self) -> String;
    /// Choose an action for the current decision point.
    fn act(&self, trajectory: &Trajectory<'_, M>, rng: &mut SmallRng) -> Result<Action>;
    /// Per-action scores, for policies that have them.
    fn score(&self, features: &[f32]) -> Option<Vec<Score>> {
        let _ = features;
        None
    }
    /// [`Policy::act`], rejecting actions that are illegal under the current mask.
    fn decide(&self, trajectory: &Trajectory<'_, M>, rng: &mut SmallRng) -> Result<Action> {
        let action = self.act(trajectory, rng)?;
        if trajectory.legal(action) {
            Ok(action)
        } else {
            Err(Error::IllegalAction {
                policy: self.id(),
                action,
                context: trajectory.context(),
            })
        }
    }
}

impl<M, P> Policy<M> for &P
where
    M: Mdp,
    P: Policy<M> + ?Sized,
{
    fn id(&self) -> String {
        (**self).id()
    }
    fn act(&self, trajectory: &Trajectory<'_, M>, rng: &mut SmallRng) -> Result<Action> {
        (**self).act(trajectory, rng)
    }
    fn score(&self, features: &[f32]) -> Option<Vec<Score>> {
        (**self).score(features)
    }
}

impl<M, P> Policy<M> for Box<P>
where
    M: Mdp,
    P: Policy<M> + ?Sized,
{
    fn id(&self) -> String {
        self.as_ref().id()
    }
    fn act(&self, trajectory: &Trajectory<'_, M>, rng: &mut SmallRng) -> Result<Action> {
        self.as_ref().act(trajectory, rng)
    }
    fn score(&self, features: &[f32]) -> Option<Vec<Score>> {
        self.as_ref().score(features)
    }
}

impl<M, P> Policy<M> for Arc<P>
where
    M: Mdp,
    P: Policy<M> + ?Sized,
{
    fn id(&self) -> String {
        self.as_ref().id()
    }
    fn act(&self, trajectory: &Trajectory<'_, M>, rng: &mut SmallRng) -> Result<Action> {
        self.as_ref().act(trajectory, rng)
    }
    fn score(&self, features: &[f32]) -> Option<Vec<Score>> {
        self.as_ref().score(features)
    }
}

/// Uniform over the legal actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Random;

impl<M> Policy<M> for Random
where
    M: Mdp,
{
    fn id(&self) -> String {
        String::from("random")
    }
    fn act(&self, trajectory: &Trajectory<'_, M>, rng: &mut SmallRng) -> Result<Action> {
        let legal = trajectory.mask().legal().collect::<Vec<_>>();
        match legal.len() {
            0 => Err(Error::NoLegalActions {
                context: trajectory.context(),
            }),
            n => Ok(legal[rng.random_range(0..n)]),
        }
    }
}
