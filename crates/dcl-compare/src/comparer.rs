use crate::*;
use dcl_core::*;
use dcl_mdp::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use serde::Deserialize;
use serde::Serialize;

/// Trajectory count, length, warmup and base seed of an evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub trajectories: usize,
    pub steps: usize,
    pub warmup: usize,
    pub seed: Seed,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            trajectories: COMPARE_TRAJECTORIES,
            steps: COMPARE_STEPS,
            warmup: COMPARE_WARMUP,
            seed: COMPARE_SEED,
        }
    }
}

/// Evaluates policies on the same set of seeded trajectories.
pub struct Comparer {
    config: CompareConfig,
}

impl Comparer {
    pub fn new(config: CompareConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// One summary per policy, in input order.
    pub fn compare<M, P>(&self, mdp: &M, policies: &[P]) -> Result<Report>
    where
        M: Mdp,
        P: Policy<M>,
    {
        let returns = self.returns(mdp, policies)?;
        let summaries = (0..returns.policies())
            .map(|p| self.summary(&returns, policies[p].id(), p, None))
            .collect();
        Ok(Report {
            benchmark: None,
            summaries,
        })
    }

    /// Like [`Comparer::compare`], with paired differences to `policies[benchmark]`.
    pub fn compare_against<M, P>(&self, mdp: &M, policies: &[P], benchmark: usize) -> Result<Report>
    where
        M: Mdp,
        P: Policy<M>,
    {
        if benchmark >= policies.len() {
            return Err(Error::Config(format!(
                "benchmark index {} out of {} policies",
                benchmark,
                policies.len()
            )));
        }
        let returns = self.returns(mdp, policies)?;
        let summaries = (0..returns.policies())
            .map(|p| self.summary(&returns, policies[p].id(), p, Some(benchmark)))
            .collect();
        Ok(Report {
            benchmark: Some(policies[benchmark].id()),
            summaries,
        })
    }

    /// Evaluate a single policy.
    pub fn assess<M, P>(&self, mdp: &M, policy: &P) -> Result<Summary>
    where
        M: Mdp,
        P: Policy<M> + ?Sized,
    {
        self.validate()?;
        let returns = Returns::new(vec![self.evaluate(mdp, policy)?]);
        Ok(self.summary(&returns, policy.id(), 0, None))
    }

    fn summary(&self, returns: &Returns, policy: String, p: usize, benchmark: Option<usize>) -> Summary {
        let difference = benchmark.map(|b| returns.mean(p) - returns.mean(b));
        let difference_error = benchmark.map(|b| returns.paired_error(p, b));
        Summary {
            policy,
            mean: returns.mean(p),
            error: returns.error(p),
            trajectories: returns.trajectories(),
            difference,
            difference_error,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.config.trajectories < 2 {
            return Err(Error::Config(format!(
                "comparison needs at least 2 trajectories, got {}",
                self.config.trajectories
            )));
        }
        if self.config.steps == 0 {
            return Err(Error::Config(String::from(
                "comparison needs at least one step per trajectory",
            )));
        }
        Ok(())
    }

    fn returns<M, P>(&self, mdp: &M, policies: &[P]) -> Result<Returns>
    where
        M: Mdp,
        P: Policy<M>,
    {
        self.validate()?;
        let rows = policies
            .iter()
            .map(|policy| self.evaluate(mdp, policy))
            .collect::<Result<Vec<_>>>()?;
        Ok(Returns::new(rows))
    }

    /// Per-trajectory returns of `policy`, in trajectory order.
    pub fn evaluate<M, P>(&self, mdp: &M, policy: &P) -> Result<Vec<Reward>>
    where
        M: Mdp,
        P: Policy<M> + ?Sized,
    {
        let ref progress = Progress::new("evaluations", self.config.trajectories);
        let returns = (0..self.config.trajectories)
            .into_par_iter()
            .map(|i| self.rollout(mdp, policy, i))
            .inspect(|_| progress.tick(1))
            .collect::<Result<Vec<Reward>>>()?;
        log::info!(
            "{:<32}{:<32}",
            policy.id(),
            format!("evaluated in {:.1?}", progress.elapsed())
        );
        Ok(returns)
    }

    /// Return accumulated after `warmup` periods, over at most `steps` more.
    fn rollout<M, P>(&self, mdp: &M, policy: &P, index: usize) -> Result<Reward>
    where
        M: Mdp,
        P: Policy<M> + ?Sized,
    {
        let seed = dcl_core::seed(self.config.seed, index, Stream::Evaluation);
        let ref mut rng = SmallRng::seed_from_u64(dcl_core::seed(seed, 0, Stream::Policy));
        let ref mut trajectory = Trajectory::reset(mdp, seed);
        trajectory.check()?;
        for _ in 0..self.config.warmup {
            if trajectory.terminal() {
                break;
            }
            trajectory.play(policy, rng)?;
        }
        let baseline = trajectory.cumulative();
        for _ in 0..self.config.steps {
            if trajectory.terminal() {
                break;
            }
            trajectory.play(policy, rng)?;
        }
        if mdp.horizon() == Horizon::Finite && !trajectory.terminal() {
            return Err(Error::Unterminated {
                limit: self.config.warmup + self.config.steps,
                context: trajectory.context(),
            });
        }
        Ok(trajectory.cumulative() - baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparer(trajectories: usize, steps: usize) -> Comparer {
        Comparer::new(CompareConfig {
            trajectories,
            steps,
            ..CompareConfig::default()
        })
    }

    fn policies(mdp: &LostSales) -> Vec<Box<dyn Policy<LostSales>>> {
        vec![Box::new(Random), Box::new(BaseStock::new(mdp))]
    }

    #[test]
    fn identical_inputs_give_identical_means() {
        let ref mdp = LostSales::default();
        let a = comparer(32, 50).compare(mdp, &policies(mdp)).unwrap();
        let b = comparer(32, 50).compare(mdp, &policies(mdp)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn results_do_not_depend_on_policy_order() {
        let ref mdp = LostSales::default();
        let forward = comparer(24, 40).compare(mdp, &policies(mdp)).unwrap();
        let mut reversed = policies(mdp);
        reversed.reverse();
        let backward = comparer(24, 40).compare(mdp, &reversed).unwrap();
        assert_eq!(forward.summaries()[0], backward.summaries()[1]);
        assert_eq!(forward.summaries()[1], backward.summaries()[0]);
    }

    #[test]
    fn base_stock_beats_random() {
        let ref mdp = LostSales::default();
        let report = comparer(32, 100)
            .compare_against(mdp, &policies(mdp), 0)
            .unwrap();
        let ref base = report.summaries()[1];
        assert!(base.mean > report.summaries()[0].mean);
        assert!(base.difference.unwrap() > 0.);
        assert_eq!(report.benchmark.as_deref(), Some("random"));
    }

    #[test]
    fn benchmark_against_itself_is_zero() {
        let ref mdp = LostSales::default();
        let report = comparer(16, 30)
            .compare_against(mdp, &policies(mdp), 1)
            .unwrap();
        let ref base = report.summaries()[1];
        assert_eq!(base.difference, Some(0.));
        assert_eq!(base.difference_error, Some(0.));
    }

    #[test]
    fn assess_matches_compare() {
        let ref mdp = LostSales::default();
        let report = comparer(16, 30).compare(mdp, &policies(mdp)).unwrap();
        let single = comparer(16, 30).assess(mdp, &BaseStock::new(mdp)).unwrap();
        assert_eq!(report.summaries()[1], single);
    }

    #[test]
    fn warmup_is_simulated_but_not_counted() {
        let ref mdp = LostSales::default();
        let ref policy = BaseStock::new(mdp);
        let cold = Comparer::new(CompareConfig {
            trajectories: 8,
            steps: 20,
            warmup: 0,
            seed: 5,
        })
        .evaluate(mdp, policy)
        .unwrap();
        let warm = Comparer::new(CompareConfig {
            trajectories: 8,
            steps: 20,
            warmup: 10,
            seed: 5,
        })
        .evaluate(mdp, policy)
        .unwrap();
        assert_eq!(cold.len(), warm.len());
        assert_ne!(cold, warm);
    }

    #[test]
    fn single_trajectory_is_a_configuration_error() {
        let ref mdp = LostSales::default();
        let result = comparer(1, 10).compare(mdp, &policies(mdp));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn deterministic_policy_on_constant_rewards_has_zero_error() {
        let ref mdp = LostSales::new(LostSalesConfig {
            demand: 0.,
            ..LostSalesConfig::default()
        })
        .unwrap();
        let summary = comparer(8, 10).assess(mdp, &BaseStock::new(mdp)).unwrap();
        assert_eq!(summary.error, 0.);
    }

    #[test]
    fn finite_horizon_must_terminate() {
        struct Loop;
        impl Mdp for Loop {
            type State = ();
            fn identifier(&self) -> String {
                String::from("loop")
            }
            fn actions(&self) -> usize {
                1
            }
            fn features(&self) -> usize {
                1
            }
            fn horizon(&self) -> Horizon {
                Horizon::Finite
            }
            fn initial(&self, _: &mut SmallRng) {}
            fn terminal(&self, _: &()) -> bool {
                false
            }
            fn legal(&self, _: &(), _: Action) -> bool {
                true
            }
            fn encode(&self, _: &()) -> Vec<f32> {
                vec![0.]
            }
            fn transition(&self, _: &mut (), _: Action, _: &mut SmallRng) -> Reward {
                -1.
            }
        }
        let result = comparer(4, 10).assess(&Loop, &Random);
        assert!(matches!(result, Err(Error::Unterminated { limit: 10, .. })));
    }
}
