use dcl_core::*;
use serde::Deserialize;
use serde::Serialize;

/// Per-state legality of every action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mask(Vec<bool>);

impl Mask {
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// Out-of-range actions are illegal.
    pub fn allows(&self, action: Action) -> bool {
        self.0.get(action).copied().unwrap_or(false)
    }
    pub fn count(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }
    pub fn none(&self) -> bool {
        self.count() == 0
    }
    pub fn legal(&self) -> impl Iterator<Item = Action> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(a, _)| a)
    }
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }
}

impl From<Vec<bool>> for Mask {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}
impl From<Mask> for Vec<bool> {
    fn from(mask: Mask) -> Self {
        mask.0
    }
}

/// Feature vector and mask taken from the same simulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    features: Vec<f32>,
    mask: Mask,
}

impl Observation {
    pub fn new(features: Vec<f32>, mask: Mask) -> Self {
        Self { features, mask }
    }
    pub fn features(&self) -> &[f32] {
        &self.features
    }
    pub fn mask(&self) -> &Mask {
        &self.mask
    }
    pub fn into_parts(self) -> (Vec<f32>, Mask) {
        (self.features, self.mask)
    }
}
