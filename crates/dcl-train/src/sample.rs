use dcl_core::*;
use dcl_mdp::Mask;
use serde::Deserialize;
use serde::Serialize;

/// Features and mask of one decision point, labelled with the action taken.
///
/// The label always indexes a legal action of its own mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    features: Vec<f32>,
    #[serde(rename = "allowed_actions")]
    mask: Mask,
    #[serde(rename = "action_label")]
    action: Action,
}

impl Sample {
    pub fn new(features: Vec<f32>, mask: Mask, action: Action) -> Result<Self> {
        let sample = Self {
            features,
            mask,
            action,
        };
        sample.check()?;
        Ok(sample)
    }
    pub fn features(&self) -> &[f32] {
        &self.features
    }
    pub fn mask(&self) -> &Mask {
        &self.mask
    }
    pub fn action(&self) -> Action {
        self.action
    }
    /// Borrowed `(features, mask, label)` row for stacking into a batch.
    pub fn row(&self) -> (&[f32], &Mask, Action) {
        (&self.features, &self.mask, self.action)
    }
    /// Deserialized samples bypass the constructor, so loading re-checks.
    pub fn check(&self) -> Result<()> {
        if self.mask.allows(self.action) {
            Ok(())
        } else {
            Err(Error::MalformedDataset(format!(
                "label {} is illegal under mask {:?}",
                self.action,
                self.mask.as_slice()
            )))
        }
    }
}
