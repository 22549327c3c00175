use crate::*;
use dcl_core::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Outcome of one decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Observation,
    pub reward: Reward,
    pub terminated: bool,
    pub truncated: bool,
}

/// One seeded rollout of an [`Mdp`].
///
/// Owns the simulation state and its event stream. The caller only sees
/// period count, cumulative return, features and mask, and the latter two
/// are always computed from the same state.
pub struct Trajectory<'a, M>
where
    M: Mdp,
{
    mdp: &'a M,
    state: M::State,
    events: SmallRng,
    seed: Seed,
    period: usize,
    weight: Reward,
    cumulative: Reward,
    limit: Option<usize>,
}

impl<'a, M> Trajectory<'a, M>
where
    M: Mdp,
{
    /// Start a trajectory whose event stream is fully determined by `seed`.
    pub fn reset(mdp: &'a M, seed: Seed) -> Self {
        let mut events = SmallRng::seed_from_u64(seed);
        let state = mdp.initial(&mut events);
        Self {
            mdp,
            state,
            events,
            seed,
            period: 0,
            weight: 1.,
            cumulative: 0.,
            limit: None,
        }
    }
    /// Report `truncated` once `limit` periods have elapsed.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
    /// Branch from the current state with a fresh event stream and zeroed bookkeeping.
    pub fn fork(&self, seed: Seed) -> Self {
        Self {
            mdp: self.mdp,
            state: self.state.clone(),
            events: SmallRng::seed_from_u64(seed),
            seed,
            period: 0,
            weight: 1.,
            cumulative: 0.,
            limit: None,
        }
    }

    pub fn mdp(&self) -> &'a M {
        self.mdp
    }
    pub fn state(&self) -> &M::State {
        &self.state
    }
    pub fn seed(&self) -> Seed {
        self.seed
    }
    pub fn period(&self) -> usize {
        self.period
    }
    pub fn cumulative(&self) -> Reward {
        self.cumulative
    }
    pub fn terminal(&self) -> bool {
        self.mdp.terminal(&self.state)
    }
    pub fn truncated(&self) -> bool {
        !self.terminal() && self.limit.is_some_and(|limit| self.period >= limit)
    }
    pub fn features(&self) -> Vec<f32> {
        self.mdp.encode(&self.state)
    }
    pub fn mask(&self) -> Mask {
        self.mdp.mask(&self.state)
    }
    pub fn observation(&self) -> Observation {
        self.mdp.observe(&self.state)
    }
    pub fn legal(&self, action: Action) -> bool {
        action < self.mdp.actions() && self.mdp.legal(&self.state, action)
    }
    pub fn context(&self) -> Context {
        Context::new(self.seed, self.period)
    }

    /// A non-terminal state must leave at least one action open.
    pub fn check(&self) -> Result<()> {
        if !self.terminal() && self.mask().none() {
            Err(Error::NoLegalActions {
                context: self.context(),
            })
        } else {
            Ok(())
        }
    }

    /// Apply `action` and advance to the next decision, returning the reward.
    pub fn apply(&mut self, action: Action) -> Result<Reward> {
        if self.terminal() {
            return Err(Error::Config(format!(
                "trajectory {} stepped past its terminal state",
                self.seed
            )));
        }
        if !self.legal(action) {
            return Err(Error::IllegalAction {
                policy: String::from("caller"),
                action,
                context: self.context(),
            });
        }
        let reward = self
            .mdp
            .transition(&mut self.state, action, &mut self.events);
        self.cumulative += self.weight * reward;
        self.weight *= self.mdp.discount();
        self.period += 1;
        self.check()?;
        Ok(reward)
    }

    /// Apply `action` and report the full step outcome.
    pub fn step(&mut self, action: Action) -> Result<Step> {
        let reward = self.apply(action)?;
        Ok(Step {
            observation: self.observation(),
            reward,
            terminated: self.terminal(),
            truncated: self.truncated(),
        })
    }

    /// Ask `policy` for a legal action and apply it.
    pub fn play<P>(&mut self, policy: &P, rng: &mut SmallRng) -> Result<(Action, Reward)>
    where
        P: Policy<M> + ?Sized,
    {
        let action = policy.decide(self, rng)?;
        let reward = self.apply(action)?;
        Ok((action, reward))
    }
}

impl<M> Clone for Trajectory<'_, M>
where
    M: Mdp,
{
    fn clone(&self) -> Self {
        Self {
            mdp: self.mdp,
            state: self.state.clone(),
            events: self.events.clone(),
            seed: self.seed,
            period: self.period,
            weight: self.weight,
            cumulative: self.cumulative,
            limit: self.limit,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::Rng;

    /// Walk right along a line of `length` cells; action 0 steps, action 1 jumps two.
    /// The last cell is terminal. Jumping is illegal one cell before the end.
    pub struct Line {
        pub length: usize,
    }

    impl Mdp for Line {
        type State = usize;
        fn identifier(&self) -> String {
            String::from("line")
        }
        fn actions(&self) -> usize {
            2
        }
        fn features(&self) -> usize {
            1
        }
        fn horizon(&self) -> Horizon {
            Horizon::Finite
        }
        fn initial(&self, _: &mut SmallRng) -> usize {
            0
        }
        fn terminal(&self, state: &usize) -> bool {
            *state + 1 >= self.length
        }
        fn legal(&self, state: &usize, action: Action) -> bool {
            match action {
                0 => true,
                1 => *state + 2 < self.length,
                _ => false,
            }
        }
        fn encode(&self, state: &usize) -> Vec<f32> {
            vec![*state as f32]
        }
        fn transition(&self, state: &mut usize, action: Action, rng: &mut SmallRng) -> Reward {
            *state += action + 1;
            -1. - rng.random::<f64>()
        }
    }

    #[test]
    fn reset_is_seed_deterministic() {
        let ref mdp = Line { length: 6 };
        let mut a = Trajectory::reset(mdp, 9);
        let mut b = Trajectory::reset(mdp, 9);
        assert_eq!(a.apply(0).unwrap(), b.apply(0).unwrap());
    }

    #[test]
    fn step_keeps_features_and_mask_consistent() {
        let ref mdp = Line { length: 4 };
        let mut trajectory = Trajectory::reset(mdp, 1);
        let step = trajectory.step(1).unwrap();
        assert_eq!(step.observation.features(), &[2.]);
        assert_eq!(step.observation.mask().as_slice(), &[true, false]);
        assert!(!step.terminated);
        let step = trajectory.step(0).unwrap();
        assert!(step.terminated);
        assert_eq!(trajectory.period(), 2);
    }

    #[test]
    fn illegal_action_is_rejected_with_context() {
        let ref mdp = Line { length: 2 };
        let mut trajectory = Trajectory::reset(mdp, 77);
        match trajectory.apply(1) {
            Err(Error::IllegalAction { action, context, .. }) => {
                assert_eq!(action, 1);
                assert_eq!(context.seed, 77);
                assert_eq!(context.step, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn truncation_follows_limit() {
        let ref mdp = Line { length: 100 };
        let mut trajectory = Trajectory::reset(mdp, 0).limit(2);
        assert!(!trajectory.step(0).unwrap().truncated);
        assert!(trajectory.step(0).unwrap().truncated);
    }

    #[test]
    fn fork_shares_state_not_bookkeeping() {
        let ref mdp = Line { length: 10 };
        let mut trajectory = Trajectory::reset(mdp, 3);
        trajectory.apply(0).unwrap();
        let fork = trajectory.fork(5);
        assert_eq!(fork.state(), trajectory.state());
        assert_eq!(fork.period(), 0);
        assert_eq!(fork.cumulative(), 0.);
    }
}
