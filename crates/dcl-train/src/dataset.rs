use crate::*;
use dcl_core::*;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// Samples of one generation in generation order, with their provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    generation: Generation,
    policy: String,
    samples: Vec<Sample>,
}

/// What a generation record keeps of its dataset once training is done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub generation: Generation,
    /// Identifier of the policy that produced every sample.
    pub policy: String,
    pub samples: usize,
    pub train: usize,
    pub valid: usize,
    pub path: Option<PathBuf>,
}

impl Dataset {
    pub fn new(generation: Generation, policy: String, samples: Vec<Sample>) -> Self {
        Self {
            generation,
            policy,
            samples,
        }
    }
    pub fn generation(&self) -> Generation {
        self.generation
    }
    pub fn policy(&self) -> &str {
        &self.policy
    }
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Contiguous prefix for training, the remaining suffix for validation.
    pub fn split(&self, fraction: f64) -> (&[Sample], &[Sample]) {
        let cut = ((self.len() as f64 * fraction) as usize).min(self.len());
        self.samples.split_at(cut)
    }

    /// Feature and action dimensions shared by every sample.
    pub fn width(&self) -> Option<(usize, usize)> {
        self.samples
            .first()
            .map(|s| (s.features().len(), s.mask().len()))
    }

    /// Every sample has the same dimensions and a legal label.
    pub fn validate(&self) -> Result<()> {
        let Some((inputs, outputs)) = self.width() else {
            return Ok(());
        };
        for (i, sample) in self.samples.iter().enumerate() {
            if sample.features().len() != inputs || sample.mask().len() != outputs {
                return Err(Error::MalformedDataset(format!(
                    "sample {} has shape ({}, {}), expected ({}, {})",
                    i,
                    sample.features().len(),
                    sample.mask().len(),
                    inputs,
                    outputs
                )));
            }
            sample.check()?;
        }
        Ok(())
    }

    pub fn manifest(&self, fraction: f64, path: Option<PathBuf>) -> Manifest {
        let (train, valid) = self.split(fraction);
        Manifest {
            generation: self.generation,
            policy: self.policy.clone(),
            samples: self.len(),
            train: train.len(),
            valid: valid.len(),
            path,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        dcl_nn::durable(path, &serde_json::to_vec(self)?)
    }
    pub fn load(path: &Path) -> Result<Self> {
        let dataset = serde_json::from_slice::<Self>(&std::fs::read(path)?)
            .map_err(|e| Error::MalformedDataset(format!("{}: {}", path.display(), e)))?;
        dataset.validate()?;
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcl_mdp::Mask;

    fn dataset(n: usize) -> Dataset {
        let samples = (0..n)
            .map(|i| Sample::new(vec![i as f32], Mask::from(vec![true, true]), i % 2).unwrap())
            .collect();
        Dataset::new(0, String::from("random"), samples)
    }

    #[test]
    fn split_is_a_positional_prefix() {
        let data = dataset(20);
        let (train, valid) = data.split(TRAIN_FRACTION);
        assert_eq!(train.len(), 19);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].features(), &[19.]);
    }

    #[test]
    fn small_datasets_round_the_cut_down() {
        let data = dataset(10);
        let (train, valid) = data.split(TRAIN_FRACTION);
        assert_eq!(train.len(), 9);
        assert_eq!(valid.len(), 1);
        let one = dataset(1);
        let (train, valid) = one.split(TRAIN_FRACTION);
        assert_eq!(train.len(), 0);
        assert_eq!(valid.len(), 1);
    }

    #[test]
    fn ragged_samples_are_malformed() {
        let mut data = dataset(3);
        data.samples
            .push(Sample::new(vec![0., 0.], Mask::from(vec![true, true]), 0).unwrap());
        assert!(matches!(data.validate(), Err(Error::MalformedDataset(_))));
    }

    #[test]
    fn persisted_dataset_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples0.json");
        let data = dataset(5);
        data.save(&path).unwrap();
        assert_eq!(Dataset::load(&path).unwrap(), data);
    }

    #[test]
    fn illegal_labels_on_disk_are_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples0.json");
        std::fs::write(
            &path,
            r#"{"generation":0,"policy":"x","samples":[{"features":[1.0],"allowed_actions":[true,false],"action_label":1}]}"#,
        )
        .unwrap();
        assert!(matches!(
            Dataset::load(&path),
            Err(Error::MalformedDataset(_))
        ));
    }
}
