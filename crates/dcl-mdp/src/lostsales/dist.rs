use dcl_core::*;
use rand::Rng;
use rand::rngs::SmallRng;

/// Distribution over the non-negative integers `offset..offset + pmf.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteDist {
    offset: i64,
    pmf: Vec<f64>,
    cdf: Vec<f64>,
}

impl DiscreteDist {
    /// Point mass at zero.
    pub fn zero() -> Self {
        Self::from_pmf(0, vec![1.])
    }

    /// Poisson with the given mean, truncated once the remaining tail mass
    /// drops below [`DISTRIBUTION_TAIL`] and renormalized.
    pub fn poisson(mean: f64) -> Result<Self> {
        // exp(-mean) underflows past ~745
        if !(mean.is_finite() && mean >= 0. && mean < 700.) {
            return Err(Error::Config(format!("poisson mean {} is invalid", mean)));
        }
        if mean == 0. {
            return Ok(Self::zero());
        }
        let mut pmf = Vec::new();
        let mut p = (-mean).exp();
        let mut mass = 0.;
        let mut k = 0;
        while mass < 1. - DISTRIBUTION_TAIL || (k as f64) < mean {
            pmf.push(p);
            mass += p;
            k += 1;
            p *= mean / k as f64;
            if p == 0. && (k as f64) > mean {
                break;
            }
        }
        Ok(Self::from_pmf(0, pmf))
    }

    fn from_pmf(offset: i64, pmf: Vec<f64>) -> Self {
        let total = pmf.iter().sum::<f64>();
        let pmf = pmf.into_iter().map(|p| p / total).collect::<Vec<_>>();
        let cdf = pmf
            .iter()
            .scan(0., |acc, p| {
                *acc += p;
                Some(*acc)
            })
            .collect::<Vec<_>>();
        Self { offset, pmf, cdf }
    }

    pub fn min(&self) -> i64 {
        self.offset
    }
    pub fn max(&self) -> i64 {
        self.offset + self.pmf.len() as i64 - 1
    }
    pub fn probability(&self, value: i64) -> f64 {
        usize::try_from(value - self.offset)
            .ok()
            .and_then(|i| self.pmf.get(i))
            .copied()
            .unwrap_or(0.)
    }
    pub fn mean(&self) -> f64 {
        self.pmf
            .iter()
            .enumerate()
            .map(|(i, p)| (self.offset + i as i64) as f64 * p)
            .sum()
    }

    /// Smallest value whose cumulative probability reaches `alpha`.
    pub fn fractile(&self, alpha: f64) -> i64 {
        self.cdf
            .iter()
            .position(|c| *c >= alpha - 1e-12)
            .map(|i| self.offset + i as i64)
            .unwrap_or(self.max())
    }

    /// Distribution of the sum of two independent draws.
    pub fn add(&self, other: &Self) -> Self {
        let mut pmf = vec![0.; self.pmf.len() + other.pmf.len() - 1];
        for (i, p) in self.pmf.iter().enumerate() {
            for (j, q) in other.pmf.iter().enumerate() {
                pmf[i + j] += p * q;
            }
        }
        Self::from_pmf(self.offset + other.offset, pmf)
    }

    /// Inverse-CDF draw.
    pub fn sample(&self, rng: &mut SmallRng) -> i64 {
        let u = rng.random::<f64>();
        self.cdf
            .partition_point(|c| *c <= u)
            .min(self.pmf.len() - 1) as i64
            + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn poisson_is_normalized() {
        let dist = DiscreteDist::poisson(4.).unwrap();
        let total = (dist.min()..=dist.max())
            .map(|k| dist.probability(k))
            .sum::<f64>();
        assert!((total - 1.).abs() < 1e-9);
        assert!((dist.mean() - 4.).abs() < 1e-6);
    }

    #[test]
    fn poisson_fractiles() {
        let dist = DiscreteDist::poisson(4.).unwrap();
        assert_eq!(dist.fractile(0.5), 4);
        assert_eq!(dist.fractile(0.8), 6);
        assert_eq!(dist.fractile(0.), 0);
    }

    #[test]
    fn convolution_adds_means() {
        let dist = DiscreteDist::poisson(4.).unwrap();
        let four = (0..4).fold(DiscreteDist::zero(), |acc, _| acc.add(&dist));
        assert!((four.mean() - 16.).abs() < 1e-6);
    }

    #[test]
    fn sampling_matches_mean() {
        let dist = DiscreteDist::poisson(4.).unwrap();
        let ref mut rng = SmallRng::seed_from_u64(0);
        let n = 20000;
        let mean = (0..n).map(|_| dist.sample(rng)).sum::<i64>() as f64 / n as f64;
        assert!((mean - 4.).abs() < 0.1, "{}", mean);
    }

    #[test]
    fn negative_mean_is_rejected() {
        assert!(DiscreteDist::poisson(-1.).is_err());
    }
}
