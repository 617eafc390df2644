//! Opaque source identities used to group modifiers for bulk removal.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

/// Identity of whatever contributed a modifier.
///
/// Sources are plain comparable values: two modifiers belong to the same
/// source exactly when their ids are equal, regardless of which object
/// created them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(pub u64);

static NEXT_FRESH: AtomicU64 = AtomicU64::new(1);

impl SourceId {
    /// Wraps a caller-chosen raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Derives a stable id from a name (first 8 bytes of its SHA-256 digest).
    ///
    /// The same name always maps to the same source, across reloads and
    /// process restarts.
    pub fn from_name(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(bytes))
    }

    /// Allocates a process-unique id for ad-hoc callers.
    pub fn fresh() -> Self {
        Self(NEXT_FRESH.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
