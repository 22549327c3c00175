use super::*;
use crate::*;
use dcl_core::*;
use rand::rngs::SmallRng;
use serde::Deserialize;
use serde::Serialize;
use std::collections::VecDeque;

/// Parameters of the lost-sales inventory problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LostSalesConfig {
    /// Penalty per unit of demand that cannot be met.
    pub p: Reward,
    /// Holding cost per unit carried into the next period.
    pub h: Reward,
    /// Periods between placing an order and receiving it.
    pub leadtime: usize,
    /// Mean of the Poisson demand per period.
    pub demand: f64,
    pub discount: Reward,
}

impl Default for LostSalesConfig {
    fn default() -> Self {
        Self {
            p: LOST_SALES_PENALTY,
            h: LOST_SALES_HOLDING,
            leadtime: LOST_SALES_LEADTIME,
            demand: LOST_SALES_DEMAND,
            discount: 1.,
        }
    }
}

/// Pipeline of inventory slots, on-hand first, plus their sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pipeline: VecDeque<i64>,
    total: i64,
}

impl Inventory {
    pub fn on_hand(&self) -> i64 {
        self.pipeline.front().copied().unwrap_or(0)
    }
    pub fn total(&self) -> i64 {
        self.total
    }
    pub fn pipeline(&self) -> impl Iterator<Item = i64> + '_ {
        self.pipeline.iter().copied()
    }
}

/// Single-item inventory with lost sales and a fixed leadtime.
///
/// Each period an order is placed, demand arrives, and whatever is on hand
/// serves it. Leftover stock is carried over at holding cost; unmet demand
/// is lost at penalty cost. Orders are capped at the `p/(p+h)` demand
/// fractile and total inventory at the same fractile of demand over
/// `leadtime + 1` periods. Rewards are negated costs.
#[derive(Debug, Clone)]
pub struct LostSales {
    config: LostSalesConfig,
    demand: DiscreteDist,
    max_order: i64,
    max_system: i64,
}

impl LostSales {
    pub fn new(config: LostSalesConfig) -> Result<Self> {
        if config.leadtime == 0 {
            return Err(Error::Config(String::from("lost sales leadtime must be positive")));
        }
        if !(config.p > 0. && config.h > 0.) {
            return Err(Error::Config(format!(
                "lost sales costs must be positive (p = {}, h = {})",
                config.p, config.h
            )));
        }
        if !(config.discount > 0. && config.discount <= 1.) {
            return Err(Error::Config(format!(
                "discount {} outside (0, 1]",
                config.discount
            )));
        }
        let demand = DiscreteDist::poisson(config.demand)?;
        let alpha = config.p / (config.p + config.h);
        let lead = (0..=config.leadtime).fold(DiscreteDist::zero(), |acc, _| acc.add(&demand));
        let max_order = demand.fractile(alpha);
        let max_system = lead.fractile(alpha);
        log::debug!(
            "{:<32}{:<32}",
            format!("max order size {}", max_order),
            format!("max system inventory {}", max_system)
        );
        Ok(Self {
            config,
            demand,
            max_order,
            max_system,
        })
    }
    pub fn config(&self) -> &LostSalesConfig {
        &self.config
    }
    pub fn max_order(&self) -> i64 {
        self.max_order
    }
    pub fn max_system(&self) -> i64 {
        self.max_system
    }

    /// Built-in heuristics by identifier.
    pub fn policy(&self, id: &str) -> Result<Box<dyn Policy<Self>>> {
        match id {
            "random" => Ok(Box::new(Random)),
            "base_stock" => Ok(Box::new(BaseStock::new(self))),
            other => Err(Error::UnknownPolicy(other.to_string())),
        }
    }
}

impl Default for LostSales {
    fn default() -> Self {
        Self::new(LostSalesConfig::default()).expect("default lost sales parameters are valid")
    }
}

impl Mdp for LostSales {
    type State = Inventory;

    fn identifier(&self) -> String {
        String::from("lost_sales")
    }
    fn actions(&self) -> usize {
        self.max_order as usize + 1
    }
    fn features(&self) -> usize {
        self.config.leadtime
    }
    fn horizon(&self) -> Horizon {
        Horizon::Infinite
    }
    fn discount(&self) -> Reward {
        self.config.discount
    }
    fn initial(&self, _: &mut SmallRng) -> Inventory {
        Inventory {
            pipeline: std::iter::repeat_n(0, self.config.leadtime).collect(),
            total: 0,
        }
    }
    fn terminal(&self, _: &Inventory) -> bool {
        false
    }
    fn legal(&self, state: &Inventory, action: Action) -> bool {
        let action = action as i64;
        (state.total + action <= self.max_system && action <= self.max_order) || action == 0
    }
    fn encode(&self, state: &Inventory) -> Vec<f32> {
        state.pipeline.iter().map(|x| *x as f32).collect()
    }
    fn transition(&self, state: &mut Inventory, action: Action, rng: &mut SmallRng) -> Reward {
        state.pipeline.push_back(action as i64);
        state.total += action as i64;
        let demand = self.demand.sample(rng);
        let on_hand = state.pipeline.pop_front().unwrap_or(0);
        let cost = if on_hand > demand {
            let remaining = on_hand - demand;
            state.total -= demand;
            if let Some(front) = state.pipeline.front_mut() {
                *front += remaining;
            }
            remaining as Reward * self.config.h
        } else {
            state.total -= on_hand;
            (demand - on_hand) as Reward * self.config.p
        };
        -cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn bounds_follow_critical_fractile() {
        let mdp = LostSales::default();
        assert_eq!(mdp.max_order(), 6);
        assert_eq!(mdp.actions(), 7);
        assert!(mdp.max_system() >= 16 && mdp.max_system() <= 22);
    }

    #[test]
    fn zero_is_always_legal() {
        let mdp = LostSales::default();
        let full = Inventory {
            pipeline: VecDeque::from(vec![mdp.max_system(), 0, 0]),
            total: mdp.max_system(),
        };
        assert_eq!(mdp.mask(&full).legal().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn pipeline_moves_one_slot_per_period() {
        let mdp = LostSales::default();
        let ref mut rng = SmallRng::seed_from_u64(0);
        let mut state = mdp.initial(rng);
        let reward = mdp.transition(&mut state, 5, rng);
        assert!(reward <= 0.);
        assert_eq!(state.pipeline().collect::<Vec<_>>(), vec![0, 0, 5]);
        assert_eq!(state.total(), 5);
    }

    #[test]
    fn holding_and_penalty_costs() {
        let mdp = LostSales::default();
        let ref mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..256 {
            let mut state = Inventory {
                pipeline: VecDeque::from(vec![5, 1, 0]),
                total: 6,
            };
            let reward = mdp.transition(&mut state, 0, rng);
            let front = state.pipeline().next().unwrap();
            if front > 1 {
                assert_eq!(reward, -((front - 1) as Reward));
                assert_eq!(state.total(), front);
            } else {
                assert_eq!(front, 1);
                assert!(reward <= 0.);
                assert_eq!(reward % 4., 0.);
            }
        }
    }

    #[test]
    fn unknown_policy_is_a_configuration_error() {
        let mdp = LostSales::default();
        assert!(matches!(mdp.policy("oracle"), Err(Error::UnknownPolicy(_))));
        assert!(mdp.policy("base_stock").is_ok());
    }

    #[test]
    fn zero_leadtime_is_rejected() {
        let config = LostSalesConfig {
            leadtime: 0,
            ..LostSalesConfig::default()
        };
        assert!(LostSales::new(config).is_err());
    }
}
