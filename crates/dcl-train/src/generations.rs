use crate::*;
use dcl_core::*;
use dcl_mdp::Mdp;
use dcl_mdp::Policy;
use dcl_nn::Meta;
use dcl_nn::Mlp;
use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;

/// Everything one run of the generation loop needs besides the MDP and the seed policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub generations: usize,
    /// Keep each generation's dataset next to its checkpoints.
    pub persist_samples: bool,
    pub sample: SampleConfig,
    pub train: TrainConfig,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            generations: GENERATIONS,
            persist_samples: false,
            sample: SampleConfig::default(),
            train: TrainConfig::default(),
        }
    }
}

/// One sample-then-train cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub index: Generation,
    /// Policy that acted while sampling.
    pub policy: String,
    /// Policy this generation trained.
    pub trained: String,
    pub checkpoint: PathBuf,
    pub dataset: Manifest,
    pub metrics: Metrics,
    pub early_stopped: bool,
}

/// Drives the improvement chain: policy `g` samples dataset `g`,
/// which trains policy `g + 1`.
///
/// Policy 0 is the caller's seed policy; every later policy is read back
/// from the [`Store`] rather than kept in memory, so each generation
/// starts from a durably written checkpoint.
pub struct Generations<'a, M>
where
    M: Mdp,
{
    mdp: &'a M,
    store: Store,
    config: LoopConfig,
}

impl<'a, M> Generations<'a, M>
where
    M: Mdp,
{
    pub fn new(mdp: &'a M, store: Store, config: LoopConfig) -> Self {
        Self { mdp, store, config }
    }
    pub fn store(&self) -> &Store {
        &self.store
    }
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Run every generation in order, stopping at the first failure.
    ///
    /// The store's history is rewritten after each completed generation, so
    /// it names exactly the policies this run has trained so far.
    pub fn run<P>(&self, seed: &P) -> Result<Vec<GenerationRecord>>
    where
        P: Policy<M> + ?Sized,
    {
        log::info!(
            "{:<32}{:<32}",
            format!("{} generations", self.config.generations),
            self.mdp.identifier()
        );
        self.store.clear_history(self.mdp)?;
        let mut records = Vec::with_capacity(self.config.generations);
        for g in 0..self.config.generations {
            if let Err(e) = self
                .generation(g, seed)
                .map_err(|e| e.during(g))
                .and_then(|record| {
                    records.push(record);
                    self.store.save_history(self.mdp, &records)
                })
            {
                log::error!("generation {} aborted: {}", g, e);
                return Err(e);
            }
        }
        Ok(records)
    }

    fn generation<P>(&self, g: Generation, seed: &P) -> Result<GenerationRecord>
    where
        P: Policy<M> + ?Sized,
    {
        let generator = SampleGenerator::new(self.config.sample.clone()).generation(g);
        let dataset = match g {
            0 => generator.generate(self.mdp, seed)?,
            _ => generator.generate(self.mdp, &self.store.load_policy(self.mdp, g)?)?,
        };
        let path = match self.config.persist_samples {
            true => Some(self.store.save_dataset(self.mdp, &dataset)?),
            false => None,
        };
        let next = g + 1;
        let checkpoint = self.store.checkpoint(self.mdp, next);
        let ref architecture = self.config.train.architecture;
        let trainer = Trainer::new(self.config.train.clone());
        let (_, metrics) = trainer.train(
            &dataset,
            |inputs, outputs| architecture.build(inputs, outputs),
            |mlp: &Mlp| checkpoint.save(mlp, &Meta::new(next, self.mdp, mlp)),
        )?;
        let record = GenerationRecord {
            index: g,
            policy: dataset.policy().to_string(),
            trained: format!("{}/gen{}", self.mdp.identifier(), next),
            checkpoint: checkpoint.sidecar(),
            dataset: dataset.manifest(self.config.train.fraction, path),
            early_stopped: metrics.early_stopped,
            metrics,
        };
        log::info!(
            "{:<32}{:<32}{:<32}",
            format!("generation {} done", g),
            format!("{} -> {}", record.policy, record.trained),
            format!("samples {}", record.dataset.samples)
        );
        Ok(record)
    }

    /// The seed policy followed by every generation the last run trained.
    pub fn policies(&self, seed: Box<dyn Policy<M>>) -> Result<Vec<Box<dyn Policy<M>>>> {
        let mut policies = vec![seed];
        for record in self.store.load_history(self.mdp)? {
            let policy = self.store.load_policy(self.mdp, record.index + 1)?;
            if Policy::<M>::id(&policy) != record.trained {
                return Err(Error::Checkpoint(format!(
                    "history names {} but the checkpoint holds {}",
                    record.trained,
                    Policy::<M>::id(&policy)
                )));
            }
            policies.push(Box::new(policy));
        }
        Ok(policies)
    }
}
