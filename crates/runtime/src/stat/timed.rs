//! Registry of outstanding timed modifiers, keyed by modifier identity.

use std::collections::HashMap;

use stat_core::{ModifierRecord, SourceId, TimedCancellation};

use crate::cancel::CancelToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TimedId(u64);

pub(crate) struct TimedEntry {
    pub(crate) record: ModifierRecord,
    /// Amount added to the temporary pool when the wait started.
    pub(crate) contribution: f64,
    pub(crate) mode: TimedCancellation,
    pub(crate) cancel: CancelToken,
}

#[derive(Default)]
pub(crate) struct TimedRegistry {
    next: u64,
    entries: HashMap<TimedId, TimedEntry>,
}

impl TimedRegistry {
    pub(crate) fn insert(
        &mut self,
        record: ModifierRecord,
        contribution: f64,
        mode: TimedCancellation,
        cancel: CancelToken,
    ) -> TimedId {
        self.next += 1;
        let id = TimedId(self.next);
        self.entries.insert(
            id,
            TimedEntry {
                record,
                contribution,
                mode,
                cancel,
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, id: TimedId) -> Option<TimedEntry> {
        self.entries.remove(&id)
    }

    /// Removes and returns every entry whose record belongs to `source`.
    pub(crate) fn drain_source(&mut self, source: SourceId) -> Vec<TimedEntry> {
        let ids: Vec<TimedId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.record.source() == source)
            .map(|(id, _)| *id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.entries.remove(&id))
            .collect()
    }

    pub(crate) fn has_source(&self, source: SourceId) -> bool {
        self.entries
            .values()
            .any(|entry| entry.record.source() == source)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
