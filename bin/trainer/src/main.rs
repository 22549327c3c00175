//! Trainer Binary
//!
//! Runs the generation loop on the lost-sales problem and compares the
//! resulting policies under common random numbers.
//!
//! Subcommands: train, compare

use clap::Parser;
use clap::Subcommand;
use dcl_compare::*;
use dcl_core::*;
use dcl_mdp::*;
use dcl_train::*;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Deep controlled learning for lost-sales inventory control", long_about = None)]
struct Cli {
    /// JSON file overriding any subset of the defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true, default_value = CHECKPOINT_DIR)]
    checkpoints: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Sample, train and checkpoint successive generations")]
    Train {
        #[arg(long)]
        generations: Option<usize>,
        #[arg(long)]
        trajectories: Option<usize>,
        #[arg(long)]
        steps: Option<usize>,
        #[arg(long)]
        seed: Option<Seed>,
        #[arg(long)]
        patience: Option<usize>,
        #[arg(long)]
        persist_samples: bool,
    },
    #[command(about = "Compare the seed policy against every trained generation")]
    Compare {
        #[arg(long)]
        trajectories: Option<usize>,
        #[arg(long)]
        steps: Option<usize>,
        #[arg(long)]
        warmup: Option<usize>,
        #[arg(long)]
        seed: Option<Seed>,
        /// Only load the first N trained generations.
        #[arg(long)]
        generations: Option<usize>,
        /// Report paired differences to the policy at this position.
        #[arg(long)]
        benchmark: Option<usize>,
        #[arg(long)]
        json: bool,
    },
}

/// Contents of the `--config` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    mdp: LostSalesConfig,
    /// Identifier of the generation-0 policy.
    policy: Option<String>,
    generations: LoopConfig,
    compare: CompareConfig,
}

impl Settings {
    fn load(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let settings = serde_json::from_slice(&std::fs::read(path)?)?;
                log::info!("loaded configuration from {}", path.display());
                Ok(settings)
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    dcl_core::log()?;
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_ref())?;
    let ref mdp = LostSales::new(settings.mdp.clone())?;
    let seed = mdp.policy(settings.policy.as_deref().unwrap_or("random"))?;
    let store = Store::new(cli.checkpoints);
    match cli.command {
        Command::Train {
            generations,
            trajectories,
            steps,
            seed: base,
            patience,
            persist_samples,
        } => {
            let config = &mut settings.generations;
            if let Some(n) = generations {
                config.generations = n;
            }
            if let Some(n) = trajectories {
                config.sample.trajectories = n;
            }
            if let Some(n) = steps {
                config.sample.steps = n;
            }
            if let Some(s) = base {
                config.sample.seed = s;
            }
            if let Some(n) = patience {
                config.train.patience = n;
            }
            config.persist_samples |= persist_samples;
            let records = Generations::new(mdp, store, settings.generations).run(&seed)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Compare {
            trajectories,
            steps,
            warmup,
            seed: base,
            generations,
            benchmark,
            json,
        } => {
            let config = &mut settings.compare;
            if let Some(n) = trajectories {
                config.trajectories = n;
            }
            if let Some(n) = steps {
                config.steps = n;
            }
            if let Some(n) = warmup {
                config.warmup = n;
            }
            if let Some(s) = base {
                config.seed = s;
            }
            let mut policies = Generations::new(mdp, store, settings.generations).policies(seed)?;
            if let Some(n) = generations {
                policies.truncate(n + 1);
            }
            let comparer = Comparer::new(settings.compare);
            let report = match benchmark {
                Some(b) => comparer.compare_against(mdp, &policies, b)?,
                None => comparer.compare(mdp, &policies)?,
            };
            match json {
                true => println!("{}", report.json()?),
                false => println!("{}", report),
            }
        }
    }
    Ok(())
}
