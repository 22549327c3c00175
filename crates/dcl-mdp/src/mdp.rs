use crate::*;
use dcl_core::*;
use rand::rngs::SmallRng;
use std::fmt::Debug;

/// Whether trajectories end on their own or are truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    /// Every trajectory reaches a terminal state.
    Finite,
    /// Trajectories never terminate and are truncated by the caller.
    Infinite,
}

/// A sequential decision problem, as far as the learning loop needs to see it.
///
/// Implementors own the dynamics. `transition` applies an action and then
/// every random event up to the next decision point, returning the reward
/// collected in between. Action indices are dense in `[0, actions())`.
pub trait Mdp: Send + Sync {
    type State: Clone + Debug + Send + Sync;

    /// Stable name used to key checkpoints.
    fn identifier(&self) -> String;
    /// Size of the action space.
    fn actions(&self) -> usize;
    /// Length of the feature vector.
    fn features(&self) -> usize;
    fn horizon(&self) -> Horizon;
    fn discount(&self) -> Reward {
        1.0
    }

    fn initial(&self, rng: &mut SmallRng) -> Self::State;
    fn terminal(&self, state: &Self::State) -> bool;
    fn legal(&self, state: &Self::State, action: Action) -> bool;
    fn encode(&self, state: &Self::State) -> Vec<f32>;
    fn transition(&self, state: &mut Self::State, action: Action, rng: &mut SmallRng) -> Reward;

    fn mask(&self, state: &Self::State) -> Mask {
        (0..self.actions())
            .map(|action| self.legal(state, action))
            .collect::<Vec<bool>>()
            .into()
    }
    fn observe(&self, state: &Self::State) -> Observation {
        Observation::new(self.encode(state), self.mask(state))
    }
}
