//! Active Set Store
//!
//! The ordered set of document identifiers the downstream agenda build will
//! visit. The set itself is owned by the host; this store reads it, edits an
//! in-memory copy, and hands the whole sequence back through the host's
//! designated write operation, which is the unit of durability.

use crate::error::TrackerError;
use crate::path::DocId;
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::sync::Arc;

/// The host's active-document-list capability.
///
/// `replace_all` is the only write primitive: the host persists the list
/// wholesale, and other host code may mutate the same list between calls,
/// so the store never assumes exclusive ownership.
pub trait ActiveListHost: Send + Sync {
    fn current(&self) -> Result<Vec<DocId>, TrackerError>;
    fn replace_all(&self, entries: &[DocId]) -> Result<(), TrackerError>;
}

/// Mutating facade over the host's active list.
///
/// Maintains the no-duplicates invariant on every read, since the
/// underlying list may have been touched by other code.
pub struct ActiveSetStore {
    host: Arc<dyn ActiveListHost>,
}

impl ActiveSetStore {
    pub fn new(host: Arc<dyn ActiveListHost>) -> Self {
        ActiveSetStore { host }
    }

    /// Current active set, deduplicated, insertion order preserved.
    pub fn current(&self) -> Result<IndexSet<DocId>, TrackerError> {
        Ok(self.host.current()?.into_iter().collect())
    }

    /// Insert an identifier at the front if not already present, then
    /// persist. Idempotent.
    pub fn add(&self, id: &DocId) -> Result<(), TrackerError> {
        let set = self.current()?;
        if set.contains(id) {
            // Unchanged membership still gets written back, mirroring the
            // host's wholesale-write contract.
            return self.write_back(&set);
        }
        let mut next = IndexSet::with_capacity(set.len() + 1);
        next.insert(id.clone());
        next.extend(set);
        self.write_back(&next)
    }

    /// Delete all occurrences of an identifier, then persist. Idempotent;
    /// absence is not an error.
    pub fn remove(&self, id: &DocId) -> Result<(), TrackerError> {
        let mut set = self.current()?;
        set.shift_remove(id);
        self.write_back(&set)
    }

    /// Hand the host an entirely new ordered set. No merge.
    pub fn replace_all(&self, entries: &IndexSet<DocId>) -> Result<(), TrackerError> {
        self.write_back(entries)
    }

    fn write_back(&self, entries: &IndexSet<DocId>) -> Result<(), TrackerError> {
        let ordered: Vec<DocId> = entries.iter().cloned().collect();
        self.host.replace_all(&ordered)
    }
}

/// Process-local active list for embedders without their own list variable,
/// and for tests.
#[derive(Default)]
pub struct InMemoryActiveList {
    entries: RwLock<Vec<DocId>>,
}

impl InMemoryActiveList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the raw list as last written.
    pub fn entries(&self) -> Vec<DocId> {
        self.entries.read().clone()
    }
}

impl ActiveListHost for InMemoryActiveList {
    fn current(&self) -> Result<Vec<DocId>, TrackerError> {
        Ok(self.entries.read().clone())
    }

    fn replace_all(&self, entries: &[DocId]) -> Result<(), TrackerError> {
        *self.entries.write() = entries.to_vec();
        Ok(())
    }
}
