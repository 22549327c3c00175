use dcl_core::*;

/// Per-trajectory returns of several policies over the same trajectories.
///
/// Row `p` holds policy `p`'s returns; column `i` is trajectory `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Returns(Vec<Vec<Reward>>);

impl Returns {
    pub fn new(rows: Vec<Vec<Reward>>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].len() == w[1].len()));
        Self(rows)
    }
    pub fn policies(&self) -> usize {
        self.0.len()
    }
    pub fn trajectories(&self) -> usize {
        self.0.first().map(Vec::len).unwrap_or(0)
    }
    pub fn row(&self, p: usize) -> &[Reward] {
        &self.0[p]
    }

    pub fn mean(&self, p: usize) -> Reward {
        self.row(p).iter().sum::<Reward>() / self.trajectories() as Reward
    }

    /// Sample covariance (divisor `n - 1`) of two policies' returns.
    pub fn covariance(&self, p: usize, q: usize) -> Reward {
        let n = self.trajectories();
        if n < 2 {
            return 0.;
        }
        let (mp, mq) = (self.mean(p), self.mean(q));
        self.row(p)
            .iter()
            .zip(self.row(q))
            .map(|(x, y)| (x - mp) * (y - mq))
            .sum::<Reward>()
            / (n - 1) as Reward
    }

    /// Standard error of the mean return.
    pub fn error(&self, p: usize) -> Reward {
        Self::root(self.covariance(p, p) / self.trajectories() as Reward)
    }

    /// Standard error of the mean paired difference between `p` and `q`.
    pub fn paired_error(&self, p: usize, q: usize) -> Reward {
        let variance = self.covariance(p, p) + self.covariance(q, q) - 2. * self.covariance(p, q);
        Self::root(variance / self.trajectories() as Reward)
    }

    /// Rounding can push a zero variance slightly negative.
    fn root(variance: Reward) -> Reward {
        variance.max(0.).sqrt()
    }
}
