//! Common error infrastructure for stat-core.
//!
//! Definitions are authored externally, so validation failures are expected
//! input problems rather than bugs. Callers skip the offending entry and keep
//! going.

/// A stat or effect definition that cannot be used.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("definition has an empty {field}")]
    EmptyName { field: &'static str },

    #[error("{field} must be a finite number, got {value}")]
    NonFiniteValue { field: &'static str, value: f64 },

    #[error("min {min} is greater than max {max}")]
    InvalidBounds { min: f64, max: f64 },

    #[error("duration must not be negative, got {0}s")]
    NegativeDuration(f64),

    #[error("tick interval must not be negative, got {0}s")]
    NegativeTickInterval(f64),

    #[error("max stacks must be at least 1")]
    ZeroMaxStacks,
}

/// Returns an error unless `value` is finite.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<(), DefinitionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DefinitionError::NonFiniteValue { field, value })
    }
}
