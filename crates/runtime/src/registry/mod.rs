//! Lookup tables for live stats and effect definitions.

mod catalog;
mod sheet;

pub use catalog::EffectCatalog;
pub use sheet::{Stat, StatSheet};

use crate::api::RegistryError;

/// Outcome of a bulk registration: how many entries made it in, and which
/// were skipped and why.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RegistrationReport {
    pub registered: usize,
    pub skipped: Vec<RegistryError>,
}

impl RegistrationReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub(crate) fn record<T>(&mut self, result: Result<T, RegistryError>) {
        match result {
            Ok(_) => self.registered += 1,
            Err(error) => {
                tracing::warn!(target: "runtime::registry", %error, "skipping entry");
                self.skipped.push(error);
            }
        }
    }
}
