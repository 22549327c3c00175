use crate::*;
use dcl_core::*;
use dcl_mdp::Mdp;
use dcl_nn::Checkpoint;
use dcl_nn::Mlp;
use dcl_nn::NeuralPolicy;
use std::path::Path;
use std::path::PathBuf;

/// Checkpoints and datasets keyed by MDP identifier and generation.
///
/// ```text
/// <root>/<mdp>/gen<g>.ot
/// <root>/<mdp>/gen<g>.json
/// <root>/<mdp>/samples<g>.json
/// <root>/<mdp>/generations.json
/// ```
///
/// `generations.json` lists the records of the last run. Checkpoints it
/// does not name are leftovers of an earlier run and are never reloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
    pub fn root(&self) -> &Path {
        &self.root
    }
    fn directory<M: Mdp>(&self, mdp: &M) -> PathBuf {
        self.root.join(mdp.identifier())
    }

    pub fn checkpoint<M: Mdp>(&self, mdp: &M, generation: Generation) -> Checkpoint {
        Checkpoint::new(self.directory(mdp).join(format!("gen{}", generation)))
    }
    pub fn samples<M: Mdp>(&self, mdp: &M, generation: Generation) -> PathBuf {
        self.directory(mdp)
            .join(format!("samples{}.json", generation))
    }

    /// Persist `dataset` under its own generation index.
    pub fn save_dataset<M: Mdp>(&self, mdp: &M, dataset: &Dataset) -> Result<PathBuf> {
        let path = self.samples(mdp, dataset.generation());
        dataset.save(&path)?;
        log::debug!("saved {} samples to {}", dataset.len(), path.display());
        Ok(path)
    }
    pub fn load_dataset<M: Mdp>(&self, mdp: &M, generation: Generation) -> Result<Dataset> {
        Dataset::load(&self.samples(mdp, generation))
    }

    /// Policy trained into generation `generation`, checked against `mdp`.
    pub fn load_policy<M: Mdp>(&self, mdp: &M, generation: Generation) -> Result<NeuralPolicy<Mlp>> {
        let checkpoint = self.checkpoint(mdp, generation);
        if !checkpoint.done() {
            return Err(Error::Config(format!(
                "no checkpoint for {} generation {} under {}",
                mdp.identifier(),
                generation,
                self.root.display()
            )));
        }
        NeuralPolicy::load(&checkpoint, mdp)
    }

    pub fn history<M: Mdp>(&self, mdp: &M) -> PathBuf {
        self.directory(mdp).join("generations.json")
    }
    /// Replace the run history with `records`.
    pub fn save_history<M: Mdp>(&self, mdp: &M, records: &[GenerationRecord]) -> Result<()> {
        dcl_nn::durable(&self.history(mdp), &serde_json::to_vec_pretty(records)?)
    }
    /// Records of the last run, oldest first. Empty when nothing has run yet.
    pub fn load_history<M: Mdp>(&self, mdp: &M) -> Result<Vec<GenerationRecord>> {
        let path = self.history(mdp);
        match path.is_file() {
            true => Ok(serde_json::from_slice(&std::fs::read(path)?)?),
            false => Ok(Vec::new()),
        }
    }
    /// Forget the previous run before a new one starts writing.
    pub fn clear_history<M: Mdp>(&self, mdp: &M) -> Result<()> {
        let path = self.history(mdp);
        if path.is_file() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(CHECKPOINT_DIR)
    }
}
