use crate::*;
use dcl_core::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// One step of policy improvement over a base policy.
///
/// Every legal action is tried from the current state and followed by the
/// base policy for `horizon` periods, `replications` times. Replication `r`
/// uses the same event seed for every candidate action, so actions are
/// compared under common random numbers. The action with the highest mean
/// return wins; ties go to the lowest index.
#[derive(Debug, Clone)]
pub struct Rollout<P> {
    base: P,
    replications: usize,
    horizon: usize,
}

impl<P> Rollout<P> {
    pub fn new(base: P, replications: usize, horizon: usize) -> Self {
        Self {
            base,
            replications: replications.max(1),
            horizon,
        }
    }
    pub fn base(&self) -> &P {
        &self.base
    }
}

impl<P> Rollout<P> {
    fn simulate<M>(&self, root: &Trajectory<'_, M>, action: Action, seed: Seed) -> Result<Reward>
    where
        M: Mdp,
        P: Policy<M>,
    {
        let ref mut rng = SmallRng::seed_from_u64(dcl_core::seed(seed, 0, Stream::Policy));
        let mut branch = root.fork(seed);
        branch.apply(action)?;
        while branch.period() < self.horizon && !branch.terminal() {
            branch.play(&self.base, rng)?;
        }
        Ok(branch.cumulative())
    }
}

impl<M, P> Policy<M> for Rollout<P>
where
    M: Mdp,
    P: Policy<M>,
{
    fn id(&self) -> String {
        format!("rollout({})", self.base.id())
    }
    fn act(&self, trajectory: &Trajectory<'_, M>, rng: &mut SmallRng) -> Result<Action> {
        let legal = trajectory.mask().legal().collect::<Vec<_>>();
        if legal.is_empty() {
            return Err(Error::NoLegalActions {
                context: trajectory.context(),
            });
        }
        if legal.len() == 1 {
            return Ok(legal[0]);
        }
        let key = rng.random::<Seed>();
        let mut best = (legal[0], Reward::NEG_INFINITY);
        for action in legal {
            let total = (0..self.replications)
                .map(|r| self.simulate(trajectory, action, dcl_core::seed(key, r, Stream::Rollout)))
                .sum::<Result<Reward>>()?;
            let mean = total / self.replications as Reward;
            if mean > best.1 {
                best = (action, mean);
            }
        }
        Ok(best.0)
    }
}
