use crate::*;
use dcl_core::*;
use dcl_mdp::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use serde::Deserialize;
use serde::Serialize;

/// Optional rollout improvement applied on top of the acting policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    pub replications: usize,
    pub horizon: usize,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            replications: ROLLOUT_REPLICATIONS,
            horizon: ROLLOUT_HORIZON,
        }
    }
}

/// How many decisions to record per generation, and from which seeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub trajectories: usize,
    pub steps: usize,
    /// Unrecorded periods before sampling (infinite horizon only).
    pub warmup: usize,
    pub seed: Seed,
    /// Drop decision points with a single legal action.
    pub skip_trivial: bool,
    pub rollout: Option<RolloutConfig>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            trajectories: SAMPLE_TRAJECTORIES,
            steps: SAMPLE_STEPS,
            warmup: SAMPLE_WARMUP,
            seed: SAMPLE_SEED,
            skip_trivial: false,
            rollout: None,
        }
    }
}

/// Rolls out the acting policy over independently seeded trajectories
/// and records every decision it makes.
///
/// Trajectory `i` of generation `g` draws its events from
/// `seed(config.seed, g * trajectories + i)`, so the result does not depend
/// on how rayon schedules the trajectories.
pub struct SampleGenerator {
    config: SampleConfig,
    generation: Generation,
}

impl SampleGenerator {
    pub fn new(config: SampleConfig) -> Self {
        Self {
            config,
            generation: 0,
        }
    }
    pub fn generation(mut self, generation: Generation) -> Self {
        self.generation = generation;
        self
    }
    pub fn config(&self) -> &SampleConfig {
        &self.config
    }

    fn seed(&self, index: usize) -> Seed {
        let index = self.generation * self.config.trajectories + index;
        dcl_core::seed(self.config.seed, index, Stream::Sampling)
    }

    /// Collect labelled samples from `policy`, wrapped in rollout improvement if configured.
    pub fn generate<M, P>(&self, mdp: &M, policy: &P) -> Result<Dataset>
    where
        M: Mdp,
        P: Policy<M> + ?Sized,
    {
        let dataset = match self.config.rollout {
            Some(ref rollout) => {
                let improved = Rollout::new(policy, rollout.replications, rollout.horizon);
                self.collect(mdp, &improved)
            }
            None => self.collect(mdp, policy),
        };
        dataset.map_err(|e| e.during(self.generation))
    }

    fn collect<M, P>(&self, mdp: &M, policy: &P) -> Result<Dataset>
    where
        M: Mdp,
        P: Policy<M> + ?Sized,
    {
        if self.config.trajectories == 0 || self.config.steps == 0 {
            return Err(Error::Config(String::from(
                "sampling needs at least one trajectory and one step",
            )));
        }
        log::info!(
            "{:<32}{:<32}",
            format!("sampling generation {}", self.generation),
            policy.id()
        );
        let ref progress = Progress::new("trajectories", self.config.trajectories);
        let samples = (0..self.config.trajectories)
            .into_par_iter()
            .map(|i| self.trajectory(mdp, policy, i))
            .inspect(|r| {
                if let Ok(samples) = r {
                    progress.tick(samples.len())
                }
            })
            .collect::<Result<Vec<Vec<Sample>>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<Sample>>();
        log::info!("{}", progress.summary());
        Ok(Dataset::new(self.generation, policy.id(), samples))
    }

    fn trajectory<M, P>(&self, mdp: &M, policy: &P, index: usize) -> Result<Vec<Sample>>
    where
        M: Mdp,
        P: Policy<M> + ?Sized,
    {
        let seed = self.seed(index);
        let ref mut rng = SmallRng::seed_from_u64(dcl_core::seed(seed, 0, Stream::Policy));
        let ref mut trajectory = Trajectory::reset(mdp, seed);
        trajectory.check()?;
        if mdp.horizon() == Horizon::Infinite {
            for _ in 0..self.config.warmup {
                trajectory.play(policy, rng)?;
            }
        }
        let mut samples = Vec::with_capacity(self.config.steps);
        for _ in 0..self.config.steps {
            if trajectory.terminal() {
                break;
            }
            let (features, mask) = trajectory.observation().into_parts();
            let action = policy.decide(trajectory, rng)?;
            if !(self.config.skip_trivial && mask.count() == 1) {
                samples.push(Sample::new(features, mask, action)?);
            }
            trajectory.apply(action)?;
        }
        if mdp.horizon() == Horizon::Finite && !trajectory.terminal() {
            return Err(Error::Unterminated {
                limit: self.config.steps,
                context: trajectory.context(),
            });
        }
        Ok(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(trajectories: usize, steps: usize) -> SampleConfig {
        SampleConfig {
            trajectories,
            steps,
            ..SampleConfig::default()
        }
    }

    #[test]
    fn infinite_horizon_records_every_step() {
        let ref mdp = LostSales::default();
        let data = SampleGenerator::new(config(6, 25))
            .generate(mdp, &Random)
            .unwrap();
        assert_eq!(data.len(), 150);
        assert_eq!(data.policy(), "random");
        assert!(data.validate().is_ok());
        assert_eq!(data.width(), Some((mdp.features(), mdp.actions())));
    }

    #[test]
    fn generation_is_reproducible() {
        let ref mdp = LostSales::default();
        let a = SampleGenerator::new(config(8, 20))
            .generation(2)
            .generate(mdp, &Random)
            .unwrap();
        let b = SampleGenerator::new(config(8, 20))
            .generation(2)
            .generate(mdp, &Random)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.generation(), 2);
    }

    #[test]
    fn generations_draw_different_trajectories() {
        let ref mdp = LostSales::default();
        let a = SampleGenerator::new(config(4, 20))
            .generation(0)
            .generate(mdp, &Random)
            .unwrap();
        let b = SampleGenerator::new(config(4, 20))
            .generation(1)
            .generate(mdp, &Random)
            .unwrap();
        assert_ne!(a.samples(), b.samples());
    }

    #[test]
    fn labels_follow_the_acting_policy() {
        let ref mdp = LostSales::default();
        let ref policy = BaseStock::new(mdp);
        let data = SampleGenerator::new(config(4, 30))
            .generate(mdp, policy)
            .unwrap();
        for sample in data.samples() {
            let total = sample.features().iter().sum::<f32>() as i64;
            let order = (policy.level() - total).clamp(0, mdp.max_order() as i64) as usize;
            assert_eq!(sample.action(), order);
        }
    }

    #[test]
    fn warmup_shifts_the_first_recorded_state() {
        let ref mdp = LostSales::default();
        let cold = SampleGenerator::new(config(1, 5))
            .generate(mdp, &Random)
            .unwrap();
        let warm = SampleGenerator::new(SampleConfig {
            warmup: 3,
            ..config(1, 5)
        })
        .generate(mdp, &Random)
        .unwrap();
        assert_eq!(cold.len(), warm.len());
        assert!(cold.samples()[0].features().iter().all(|x| *x == 0.));
        assert_ne!(cold.samples(), warm.samples());
    }

    #[test]
    fn zero_trajectories_is_a_configuration_error() {
        let ref mdp = LostSales::default();
        let result = SampleGenerator::new(config(0, 10)).generate(mdp, &Random);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn rollout_changes_the_acting_policy() {
        let ref mdp = LostSales::default();
        let data = SampleGenerator::new(SampleConfig {
            rollout: Some(RolloutConfig {
                replications: 2,
                horizon: 4,
            }),
            ..config(2, 5)
        })
        .generate(mdp, &Random)
        .unwrap();
        assert_eq!(data.policy(), "rollout(random)");
        assert_eq!(data.len(), 10);
    }

    /// Counts periods; no action is legal from period `edge` on.
    struct Cliff {
        edge: usize,
    }

    impl Mdp for Cliff {
        type State = usize;
        fn identifier(&self) -> String {
            String::from("cliff")
        }
        fn actions(&self) -> usize {
            2
        }
        fn features(&self) -> usize {
            1
        }
        fn horizon(&self) -> Horizon {
            Horizon::Infinite
        }
        fn initial(&self, _: &mut SmallRng) -> usize {
            0
        }
        fn terminal(&self, _: &usize) -> bool {
            false
        }
        fn legal(&self, period: &usize, _: Action) -> bool {
            *period < self.edge
        }
        fn encode(&self, period: &usize) -> Vec<f32> {
            vec![*period as f32]
        }
        fn transition(&self, period: &mut usize, _: Action, _: &mut SmallRng) -> Reward {
            *period += 1;
            0.
        }
    }

    /// Answers an action index past the end of the action space.
    struct OutOfRange;
    impl<M: Mdp> Policy<M> for OutOfRange {
        fn id(&self) -> String {
            String::from("out_of_range")
        }
        fn act(&self, trajectory: &Trajectory<'_, M>, _: &mut SmallRng) -> Result<Action> {
            Ok(trajectory.mdp().actions())
        }
    }

    fn seeds(config: &SampleConfig, generation: Generation) -> Vec<Seed> {
        (0..config.trajectories)
            .map(|i| generation * config.trajectories + i)
            .map(|i| dcl_core::seed(config.seed, i, Stream::Sampling))
            .collect()
    }

    #[test]
    fn illegal_action_reports_generation_seed_and_step() {
        let ref mdp = LostSales::default();
        let ref config = config(3, 10);
        let result = SampleGenerator::new(config.clone())
            .generation(2)
            .generate(mdp, &OutOfRange);
        match result {
            Err(Error::IllegalAction {
                policy,
                action,
                context,
            }) => {
                assert_eq!(policy, "out_of_range");
                assert_eq!(action, mdp.actions());
                assert_eq!(context.generation, Some(2));
                assert_eq!(context.step, 0);
                assert!(seeds(config, 2).contains(&context.seed));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dead_end_reports_generation_seed_and_step() {
        let ref mdp = Cliff { edge: 3 };
        let ref config = config(2, 10);
        let result = SampleGenerator::new(config.clone())
            .generation(1)
            .generate(mdp, &Random);
        match result {
            Err(Error::NoLegalActions { context }) => {
                assert_eq!(context.generation, Some(1));
                assert_eq!(context.step, 3);
                assert!(seeds(config, 1).contains(&context.seed));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dead_start_fails_before_any_decision() {
        let ref mdp = Cliff { edge: 0 };
        let result = SampleGenerator::new(config(1, 10))
            .generation(4)
            .generate(mdp, &Random);
        match result {
            Err(Error::NoLegalActions { context }) => {
                assert_eq!(context.generation, Some(4));
                assert_eq!(context.step, 0);
                assert_eq!(context.seed, seeds(&config(1, 10), 4)[0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
