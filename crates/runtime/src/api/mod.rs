//! Public runtime API surface.
//!
//! This module gathers the outcome and error types exposed to consumers of the
//! runtime crate so the effect and registry layers can share them.

pub mod errors;

pub use errors::{ApplyOutcome, NotApplicable, RegistryError};
