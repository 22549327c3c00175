//! Core type aliases, constants, and shared plumbing for deep controlled learning.
//!
//! This crate provides the foundational types, configuration defaults,
//! error taxonomy and seed derivation used throughout the dcl workspace.
#![allow(dead_code)]

mod error;
mod progress;

pub use error::*;
pub use progress::*;

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// Dense action index in `[0, action_space_size)`.
pub type Action = usize;
/// Raw model outputs, log-probabilities, and classification losses.
pub type Score = f32;
/// Per-period rewards and cumulative trajectory returns.
pub type Reward = f64;
/// Masked softmax outputs.
pub type Probability = f32;
/// Seeds for every random stream in the system.
pub type Seed = u64;
/// Index of one sample-then-train cycle.
pub type Generation = usize;

// ============================================================================
// SAMPLE GENERATION
// ============================================================================
/// Independent trajectories rolled out per generation.
pub const SAMPLE_TRAJECTORIES: usize = 4000;
/// Decision points recorded per trajectory.
pub const SAMPLE_STEPS: usize = 1000;
/// Unrecorded periods before sampling starts (infinite horizon only).
pub const SAMPLE_WARMUP: usize = 0;
/// Base seed for sampling trajectories.
pub const SAMPLE_SEED: Seed = 15112017;

// ============================================================================
// MASKED CLASSIFICATION TRAINING
// Adam over sequential minibatches, early stopped on validation loss.
// ============================================================================
/// Upper bound on training epochs per generation.
pub const MAX_EPOCH: usize = 100;
/// Consecutive non-improving epochs tolerated before stopping.
pub const EARLY_STOPPING_PATIENCE: usize = 15;
/// Minimum validation improvement that resets the patience counter.
pub const EARLY_STOPPING_DELTA: Score = 0.0005;
/// Fraction of a dataset (as a positional prefix) used for training.
pub const TRAIN_FRACTION: f64 = 0.95;
/// Examples per gradient step.
pub const BATCH_SIZE: usize = 32;
/// Adam step size.
pub const LEARNING_RATE: Score = 2e-4;
/// Adam first moment decay.
pub const ADAM_BETA1: Score = 0.5;
/// Adam second moment decay.
pub const ADAM_BETA2: Score = 0.999;
/// Adam denominator smoothing.
pub const ADAM_EPSILON: Score = 1e-8;
/// Width of each hidden layer in the reference network.
pub const HIDDEN_WIDTH: usize = 64;
/// Number of hidden layers in the reference network.
pub const HIDDEN_LAYERS: usize = 3;
/// Seed for parameter initialization.
pub const INIT_SEED: Seed = 0xDC1;
/// Score assigned to illegal actions before normalizing.
/// Finite so that gradients never see infinities.
pub const MASK_VALUE: Score = Score::MIN;
/// Number of sample-then-train cycles.
pub const GENERATIONS: usize = 3;

// ============================================================================
// POLICY COMPARISON
// Common random numbers: trajectory i shares its seed across every policy.
// ============================================================================
/// Trajectories per policy.
pub const COMPARE_TRAJECTORIES: usize = 4096;
/// Periods per trajectory after warmup.
pub const COMPARE_STEPS: usize = 1024;
/// Periods simulated but excluded from the return.
pub const COMPARE_WARMUP: usize = 0;
/// Base seed for evaluation trajectories.
pub const COMPARE_SEED: Seed = 13021984;

// ============================================================================
// ROLLOUT IMPROVEMENT
// Each legal action is scored by replications of the base policy.
// ============================================================================
/// Replications per candidate action.
pub const ROLLOUT_REPLICATIONS: usize = 32;
/// Periods simulated after the candidate action.
pub const ROLLOUT_HORIZON: usize = 40;

// ============================================================================
// LOST SALES REFERENCE MDP
// ============================================================================
/// Penalty per unit of unmet demand.
pub const LOST_SALES_PENALTY: Reward = 4.0;
/// Cost per unit carried to the next period.
pub const LOST_SALES_HOLDING: Reward = 1.0;
/// Periods between ordering and arrival.
pub const LOST_SALES_LEADTIME: usize = 3;
/// Mean of the Poisson demand distribution.
pub const LOST_SALES_DEMAND: f64 = 4.0;
/// Probability mass beyond which a discrete distribution is truncated.
pub const DISTRIBUTION_TAIL: f64 = 1e-12;

// ============================================================================
// TRAINING INFRASTRUCTURE
// ============================================================================
/// Default directory for checkpoints and persisted datasets.
pub const CHECKPOINT_DIR: &str = "checkpoints";
/// Interval between progress log messages during long phases.
pub const TRAINING_LOG_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

// ============================================================================
// RANDOM STREAMS
// ============================================================================
/// Independent random streams derived from a single base seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum Stream {
    /// Event streams of sampling trajectories.
    Sampling = 1,
    /// Event streams of evaluation trajectories.
    Evaluation = 2,
    /// Randomness consumed by stochastic policies.
    Policy = 3,
    /// Replications inside rollout improvement.
    Rollout = 4,
}

/// Derive the seed of the `index`-th trajectory of a stream.
/// Deterministic in its inputs; SplitMix64 finalization decorrelates neighbours.
pub fn seed(base: Seed, index: usize, stream: Stream) -> Seed {
    let mut z = base
        .wrapping_add(index as Seed)
        .wrapping_add((stream as Seed).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
pub fn log() -> Result<()> {
    std::fs::create_dir_all("logs")?;
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time))?,
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file])?;
    Ok(())
}
