//! Error and outcome types surfaced by the runtime API.
//!
//! Expected failures (missing stat, wrong stat type, bad definition) are
//! reported as values so callers can log and move on. Nothing here is fatal.
use thiserror::Error;

use stat_core::{DefinitionError, Verdict};

/// Why an effect could not be applied at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotApplicable {
    #[error("stat '{0}' does not exist")]
    MissingStat(String),

    #[error("stat '{0}' is not numeric")]
    NonNumericTarget(String),

    #[error("invalid effect definition")]
    InvalidDefinition(#[source] DefinitionError),

    #[error("timed effect '{0}' needs a running tokio runtime")]
    NoRuntime(String),
}

/// Result of `apply_effect`.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied,
    SuppressedDuplicate,
    StackCapped,
    NotApplicable(NotApplicable),
}

impl From<Verdict> for ApplyOutcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Applied => Self::Applied,
            Verdict::SuppressedDuplicate => Self::SuppressedDuplicate,
            Verdict::StackCapped => Self::StackCapped,
        }
    }
}

impl From<NotApplicable> for ApplyOutcome {
    fn from(reason: NotApplicable) -> Self {
        Self::NotApplicable(reason)
    }
}

/// Registration failures for stats and effect definitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("'{0}' is already registered")]
    Duplicate(String),

    #[error("'{name}' is invalid")]
    Invalid {
        name: String,
        #[source]
        source: DefinitionError,
    },
}
