use super::*;
use crate::*;
use dcl_core::*;
use rand::rngs::SmallRng;

/// Order up to a fixed level of total inventory, capped by the order limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseStock {
    level: i64,
    cap: i64,
}

impl BaseStock {
    /// Base-stock level at the system inventory bound.
    pub fn new(mdp: &LostSales) -> Self {
        Self::with_level(mdp, mdp.max_system())
    }
    pub fn with_level(mdp: &LostSales, level: i64) -> Self {
        Self {
            level,
            cap: mdp.max_order(),
        }
    }
    pub fn level(&self) -> i64 {
        self.level
    }
}

impl Policy<LostSales> for BaseStock {
    fn id(&self) -> String {
        format!("base_stock({})", self.level)
    }
    fn act(&self, trajectory: &Trajectory<'_, LostSales>, _: &mut SmallRng) -> Result<Action> {
        let gap = self.level - trajectory.state().total();
        Ok(gap.clamp(0, self.cap) as Action)
    }
}
