//! Error taxonomy shared by every library crate.

use crate::Action;
use crate::Generation;
use crate::Seed;
use std::fmt::Display;
use std::fmt::Formatter;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Where a contract violation happened, with enough detail to replay it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    pub generation: Option<Generation>,
    pub seed: Seed,
    pub step: usize,
}

impl Context {
    pub fn new(seed: Seed, step: usize) -> Self {
        Self {
            generation: None,
            seed,
            step,
        }
    }
}

impl Display for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.generation {
            Some(g) => write!(f, "generation {} seed {} step {}", g, self.seed, self.step),
            None => write!(f, "seed {} step {}", self.seed, self.step),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    // configuration
    #[error("unknown policy identifier: {0}")]
    UnknownPolicy(String),
    #[error("feature dimension mismatch: expected {expected}, found {found}")]
    FeatureMismatch { expected: usize, found: usize },
    #[error("action dimension mismatch: expected {expected}, found {found}")]
    ActionMismatch { expected: usize, found: usize },
    #[error("malformed dataset: {0}")]
    MalformedDataset(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("finite horizon trajectory did not terminate within {limit} periods ({context})")]
    Unterminated { limit: usize, context: Context },
    #[error("malformed checkpoint: {0}")]
    Checkpoint(String),
    #[error("tensor backend: {0}")]
    Tensor(String),

    // contract violations
    #[error("policy {policy} chose illegal action {action} ({context})")]
    IllegalAction {
        policy: String,
        action: Action,
        context: Context,
    },
    #[error("non-terminal state has no legal actions ({context})")]
    NoLegalActions { context: Context },
    #[error("every action is masked")]
    AllMasked,

    // plumbing
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),
}

impl Error {
    /// Stamp the generation onto contract violations raised below the loop.
    pub fn during(self, generation: Generation) -> Self {
        match self {
            Self::IllegalAction {
                policy,
                action,
                mut context,
            } => {
                context.generation = Some(generation);
                Self::IllegalAction {
                    policy,
                    action,
                    context,
                }
            }
            Self::NoLegalActions { mut context } => {
                context.generation = Some(generation);
                Self::NoLegalActions { context }
            }
            Self::Unterminated { limit, mut context } => {
                context.generation = Some(generation);
                Self::Unterminated { limit, context }
            }
            other => other,
        }
    }
    /// Contract violations point at a collaborator bug rather than a setup mistake.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::IllegalAction { .. } | Self::NoLegalActions { .. } | Self::AllMasked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn during_stamps_generation() {
        let error = Error::NoLegalActions {
            context: Context::new(11, 3),
        }
        .during(2);
        match error {
            Error::NoLegalActions { context } => {
                assert_eq!(context.generation, Some(2));
                assert_eq!(context.seed, 11);
                assert_eq!(context.step, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn context_renders_replay_details() {
        let mut context = Context::new(99, 5);
        context.generation = Some(1);
        let message = Error::IllegalAction {
            policy: "random".into(),
            action: 4,
            context,
        }
        .to_string();
        assert!(message.contains("generation 1"));
        assert!(message.contains("seed 99"));
        assert!(message.contains("step 5"));
    }
}
