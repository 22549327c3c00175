use crate::*;
use dcl_core::*;
use dcl_nn::*;
use serde::Deserialize;
use serde::Serialize;

/// Optimizer, split and stopping parameters for one generation's training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub max_epochs: usize,
    pub patience: usize,
    pub delta: Score,
    /// Leading fraction of the dataset used for training.
    pub fraction: f64,
    pub batch: usize,
    pub rate: Score,
    pub beta1: Score,
    pub beta2: Score,
    pub architecture: Architecture,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_epochs: MAX_EPOCH,
            patience: EARLY_STOPPING_PATIENCE,
            delta: EARLY_STOPPING_DELTA,
            fraction: TRAIN_FRACTION,
            batch: BATCH_SIZE,
            rate: LEARNING_RATE,
            beta1: ADAM_BETA1,
            beta2: ADAM_BETA2,
            architecture: Architecture::default(),
        }
    }
}

/// Loss curves of one training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean per-example loss observed while optimising, per epoch.
    pub train: Vec<Score>,
    /// Mean validation loss after each epoch's updates. Empty without a validation subset.
    pub valid: Vec<Score>,
    /// Zero-based epoch of the last saved model.
    pub best_epoch: Option<usize>,
    pub best_loss: Option<Score>,
    pub early_stopped: bool,
}

/// Fits a [`Network`] to a [`Dataset`] by masked classification.
///
/// Batches are taken in dataset order and each one is a single forward and
/// backward pass on the CPU, so the same dataset and initial parameters
/// always yield the same model.
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train a fresh model built by `factory(inputs, outputs)`.
    ///
    /// `checkpoint` is called with the model every time early stopping asks
    /// for a save; the model returned is the last one handed to it.
    pub fn train<N, F, C>(&self, dataset: &Dataset, factory: F, mut checkpoint: C) -> Result<(N, Metrics)>
    where
        N: Network,
        F: FnOnce(usize, usize) -> Result<N>,
        C: FnMut(&N) -> Result<()>,
    {
        if self.config.max_epochs == 0 || self.config.batch == 0 {
            return Err(Error::Config(String::from(
                "training needs at least one epoch and a positive batch size",
            )));
        }
        let (inputs, outputs) = dataset
            .width()
            .ok_or_else(|| Error::Config(String::from("cannot train on an empty dataset")))?;
        let model = factory(inputs, outputs)?;
        if model.inputs() != inputs {
            return Err(Error::FeatureMismatch {
                expected: model.inputs(),
                found: inputs,
            });
        }
        if model.outputs() != outputs {
            return Err(Error::ActionMismatch {
                expected: model.outputs(),
                found: outputs,
            });
        }
        let (train, valid) = dataset.split(self.config.fraction);
        if train.is_empty() {
            return Err(Error::Config(format!(
                "training subset of {} samples at fraction {} is empty",
                dataset.len(),
                self.config.fraction
            )));
        }
        if valid.is_empty() {
            log::warn!("no validation samples; saving every epoch without early stopping");
        }
        log::info!(
            "{:<32}{:<32}",
            format!("training on {} samples", train.len()),
            format!("validating on {}", valid.len())
        );

        let ref mut adam = Adam::new(&model, self.config.rate, self.config.beta1, self.config.beta2)?;
        let ref mut stopping = EarlyStopping::new(self.config.patience, self.config.delta);
        let mut metrics = Metrics::default();
        let mut best = None;
        for epoch in 0..self.config.max_epochs {
            let train_loss = self.epoch(&model, adam, train)?;
            metrics.train.push(train_loss);
            let verdict = if valid.is_empty() {
                log::debug!("{:<32}{:<32}", format!("epoch {}", epoch), format!("train {:.5}", train_loss));
                Verdict {
                    save: true,
                    stop: false,
                }
            } else {
                let valid_loss = Self::loss(&model, valid)?;
                metrics.valid.push(valid_loss);
                log::debug!(
                    "{:<32}{:<32}{:<32}",
                    format!("epoch {}", epoch),
                    format!("train {:.5}", train_loss),
                    format!("valid {:.5}", valid_loss)
                );
                stopping.update(valid_loss)
            };
            if verdict.save {
                checkpoint(&model)?;
                metrics.best_epoch = Some(epoch);
                metrics.best_loss = stopping.best();
                best = Some(model.snapshot()?);
            }
            if verdict.stop {
                metrics.early_stopped = true;
                log::info!("early stopping after epoch {}", epoch);
                break;
            }
        }
        let model = best.ok_or_else(|| {
            Error::Config(String::from("no epoch produced a finite validation loss"))
        })?;
        log::info!(
            "{:<32}{:<32}",
            format!("best epoch {:?}", metrics.best_epoch),
            format!("best loss {:?}", metrics.best_loss)
        );
        Ok((model, metrics))
    }

    /// One pass over `train` in sequential minibatches. Returns the mean example loss.
    fn epoch<N>(&self, model: &N, adam: &mut Adam, train: &[Sample]) -> Result<Score>
    where
        N: Network,
    {
        let mut total = 0.;
        for chunk in train.chunks(self.config.batch) {
            let ref batch = Batch::new(chunk.iter().map(Sample::row))?;
            total += adam.step(&batch.loss(model))? * batch.len() as Score;
        }
        Ok(total / train.len() as Score)
    }

    /// Mean masked NLL of `samples` under `model`, without updating it.
    pub fn loss<N>(model: &N, samples: &[Sample]) -> Result<Score>
    where
        N: Network,
    {
        Batch::new(samples.iter().map(Sample::row))?.evaluate(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcl_mdp::Mask;

    /// Two features, three actions; the label is the legal action matching the larger feature.
    fn dataset(n: usize) -> Dataset {
        let samples = (0..n)
            .map(|i| {
                let x = (i % 7) as f32 / 7.;
                let features = vec![x, 1. - x];
                let label = if x > 0.5 { 0 } else { 2 };
                Sample::new(features, Mask::from(vec![true, false, true]), label).unwrap()
            })
            .collect();
        Dataset::new(0, String::from("fixture"), samples)
    }

    fn config() -> TrainConfig {
        TrainConfig {
            max_epochs: 20,
            rate: 1e-2,
            architecture: Architecture {
                hidden: vec![8],
                seed: 7,
            },
            ..TrainConfig::default()
        }
    }

    #[test]
    fn loss_decreases_on_a_separable_problem() {
        let trainer = Trainer::new(config());
        let data = dataset(200);
        let arch = trainer.config().architecture.clone();
        let (model, metrics) = trainer
            .train(&data, |i, o| arch.build(i, o), |_: &Mlp| Ok(()))
            .unwrap();
        assert!(metrics.train.last().unwrap() < metrics.train.first().unwrap());
        assert!(Trainer::loss(&model, data.samples()).unwrap() < (2. as Score).ln());
    }

    #[test]
    fn illegal_actions_get_no_mass_after_training() {
        let trainer = Trainer::new(config());
        let data = dataset(100);
        let arch = trainer.config().architecture.clone();
        let (model, _) = trainer
            .train(&data, |i, o| arch.build(i, o), |_: &Mlp| Ok(()))
            .unwrap();
        let mask = Mask::from(vec![true, false, true]);
        let probs = masked_softmax(&model.score(&[0.3, 0.7]).unwrap(), &mask).unwrap();
        assert_eq!(probs[1], 0.);
    }

    #[test]
    fn training_is_deterministic() {
        let data = dataset(120);
        let run = || {
            let trainer = Trainer::new(config());
            let arch = trainer.config().architecture.clone();
            trainer
                .train(&data, |i, o| arch.build(i, o), |_: &Mlp| Ok(()))
                .unwrap()
        };
        let (a, ma) = run();
        let (b, mb) = run();
        assert_eq!(a, b);
        assert_eq!(ma, mb);
    }

    #[test]
    fn returned_model_is_the_last_checkpointed() {
        let trainer = Trainer::new(TrainConfig {
            max_epochs: 8,
            patience: 2,
            ..config()
        });
        let data = dataset(100);
        let arch = trainer.config().architecture.clone();
        let mut saved = None;
        let (model, metrics) = trainer
            .train(&data, |i, o| arch.build(i, o), |m: &Mlp| {
                saved = Some(m.snapshot()?);
                Ok(())
            })
            .unwrap();
        assert_eq!(Some(model), saved);
        assert!(metrics.best_epoch.is_some());
        assert_eq!(metrics.train.len(), metrics.valid.len());
    }

    #[test]
    fn empty_validation_saves_every_epoch() {
        let trainer = Trainer::new(TrainConfig {
            max_epochs: 4,
            fraction: 1.0,
            ..config()
        });
        let data = dataset(30);
        let arch = trainer.config().architecture.clone();
        let mut saves = 0;
        let (_, metrics) = trainer
            .train(&data, |i, o| arch.build(i, o), |_: &Mlp| {
                saves += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(saves, 4);
        assert!(metrics.valid.is_empty());
        assert!(!metrics.early_stopped);
    }

    #[test]
    fn empty_training_subset_is_a_configuration_error() {
        let trainer = Trainer::new(config());
        let data = dataset(1);
        let arch = trainer.config().architecture.clone();
        let result = trainer.train(&data, |i, o| arch.build(i, o), |_: &Mlp| Ok(()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn model_dimensions_must_match_the_dataset() {
        let trainer = Trainer::new(config());
        let data = dataset(20);
        let arch = trainer.config().architecture.clone();
        let result = trainer.train(&data, |i, o| arch.build(i + 1, o), |_: &Mlp| Ok(()));
        assert!(matches!(result, Err(Error::FeatureMismatch { .. })));
        let result = trainer.train(&data, |i, o| arch.build(i, o + 2), |_: &Mlp| Ok(()));
        assert!(matches!(result, Err(Error::ActionMismatch { .. })));
    }

    #[test]
    fn zero_hidden_width_is_a_configuration_error() {
        let trainer = Trainer::new(TrainConfig {
            architecture: Architecture {
                hidden: vec![0],
                seed: 7,
            },
            ..config()
        });
        let data = dataset(20);
        let arch = trainer.config().architecture.clone();
        let result = trainer.train(&data, |i, o| arch.build(i, o), |_: &Mlp| Ok(()));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
