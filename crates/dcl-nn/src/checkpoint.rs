use crate::*;
use dcl_core::*;
use dcl_mdp::Mdp;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;

/// Sidecar describing a saved network well enough to rebuild a policy
/// without the training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub generation: Generation,
    pub mdp: String,
    pub inputs: usize,
    pub outputs: usize,
    pub hidden: Vec<usize>,
    /// Scores must be masked by the legal actions before use.
    pub masked: bool,
    #[serde(default = "Meta::input_type")]
    pub input_type: String,
}

impl Meta {
    pub fn new<M: Mdp>(generation: Generation, mdp: &M, mlp: &Mlp) -> Self {
        Self {
            generation,
            mdp: mdp.identifier(),
            inputs: mlp.inputs(),
            outputs: mlp.outputs(),
            hidden: mlp.hidden().to_vec(),
            masked: true,
            input_type: Self::input_type(),
        }
    }
    fn input_type() -> String {
        String::from("dict")
    }
    /// A checkpoint is only usable against an MDP with the same dimensions.
    pub fn verify<M: Mdp>(&self, mdp: &M) -> Result<()> {
        if self.inputs != mdp.features() {
            return Err(Error::FeatureMismatch {
                expected: mdp.features(),
                found: self.inputs,
            });
        }
        if self.outputs != mdp.actions() {
            return Err(Error::ActionMismatch {
                expected: mdp.actions(),
                found: self.outputs,
            });
        }
        Ok(())
    }
}

/// Pair of artifacts sharing one stem: `<stem>.ot` var store and `<stem>.json` metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    stem: PathBuf,
}

impl Checkpoint {
    pub fn new(stem: impl Into<PathBuf>) -> Self {
        Self { stem: stem.into() }
    }
    pub fn weights(&self) -> PathBuf {
        self.stem.with_extension("ot")
    }
    pub fn sidecar(&self) -> PathBuf {
        self.stem.with_extension("json")
    }
    pub fn done(&self) -> bool {
        self.weights().is_file() && self.sidecar().is_file()
    }

    /// Weights first, sidecar last, each through a synced temporary file,
    /// so a visible sidecar implies complete weights.
    pub fn save(&self, mlp: &Mlp, meta: &Meta) -> Result<()> {
        log::debug!("{:<32}{:<32}", "saving checkpoint", self.stem.display());
        persist(&self.weights(), |temp| mlp.vars().save(temp).map_err(torch))?;
        durable(&self.sidecar(), &serde_json::to_vec_pretty(meta)?)?;
        Ok(())
    }

    /// Rebuild the network the sidecar describes and fill it from the var store.
    pub fn load(&self) -> Result<(Mlp, Meta)> {
        let meta = serde_json::from_slice::<Meta>(&std::fs::read(self.sidecar())?)?;
        let widths = std::iter::once(meta.inputs)
            .chain(meta.hidden.iter().copied())
            .chain(std::iter::once(meta.outputs))
            .collect::<Vec<_>>();
        let mut mlp = Mlp::random(widths, INIT_SEED)
            .map_err(|e| Error::Checkpoint(format!("sidecar {:?}: {}", meta, e)))?;
        mlp.vars_mut().load(self.weights()).map_err(|e| {
            Error::Checkpoint(format!("{}: {}", self.weights().display(), e))
        })?;
        Ok((mlp, meta))
    }
}

/// Write through a temporary sibling, sync, then rename into place.
pub fn durable(path: &Path, bytes: &[u8]) -> Result<()> {
    persist(path, |temp| Ok(std::fs::write(temp, bytes)?))
}

/// Let `write` fill a temporary sibling of `path`, sync it, then rename it into place.
pub fn persist<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let temp = path.with_extension("tmp");
    write(&temp)?;
    std::fs::File::open(&temp)?.sync_all()?;
    std::fs::rename(&temp, path)?;
    Ok(())
}
