//! Tracker Context
//!
//! Bundles the injected capabilities (query engine, expression resolver,
//! configuration sources, active-list host) behind one synchronous access
//! point, and implements the two membership operations: the per-save
//! update and the cleanup/rebuild pass.
//!
//! No caching: every update re-extracts and re-evaluates the predicate
//! sequence from scratch, which is never worse than re-evaluating.

use crate::active_set::{ActiveListHost, ActiveSetStore};
use crate::config::DocketConfig;
use crate::error::TrackerError;
use crate::path::DocId;
use crate::query::{matches_any, DocumentRef, ExprResolver, Predicate, QueryEngine};
use crate::sources::{extract_predicates, ConfigSources};
use indexmap::IndexSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a cleanup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub kept: usize,
    pub removed: usize,
}

/// Shared context for membership maintenance.
pub struct Tracker {
    config: DocketConfig,
    engine: Arc<dyn QueryEngine>,
    resolver: Arc<dyn ExprResolver>,
    sources: Arc<dyn ConfigSources>,
    store: ActiveSetStore,
}

impl Tracker {
    pub fn new(
        config: DocketConfig,
        engine: Arc<dyn QueryEngine>,
        resolver: Arc<dyn ExprResolver>,
        sources: Arc<dyn ConfigSources>,
        host: Arc<dyn ActiveListHost>,
    ) -> Self {
        Tracker {
            config,
            engine,
            resolver,
            sources,
            store: ActiveSetStore::new(host),
        }
    }

    pub fn config(&self) -> &DocketConfig {
        &self.config
    }

    pub fn store(&self) -> &ActiveSetStore {
        &self.store
    }

    /// Extract the current predicate sequence from both configuration
    /// sources.
    pub fn current_predicates(&self) -> Result<Vec<Predicate>, TrackerError> {
        extract_predicates(
            &self.sources.commands(),
            &self.sources.views(),
            &self.config.query_block_kind,
            self.resolver.as_ref(),
        )
    }

    /// Decide membership for one document and persist the outcome.
    ///
    /// The target file is `file` when given, otherwise the document's own
    /// path. Without a resolvable structured-document target this is a
    /// silent no-op. Otherwise the document is evaluated against the
    /// current predicates and added to or removed from the active set;
    /// either way the set is written back through the host.
    ///
    /// Query-engine and resolver failures propagate to the caller, which
    /// for the before-persist hook means the host aborts the save.
    pub fn update(&self, doc: &DocumentRef, file: Option<&Path>) -> Result<(), TrackerError> {
        let target = match file.or_else(|| doc.file_path()) {
            Some(path) => path,
            None => return Ok(()),
        };
        if !self.config.is_tracked_document(target) {
            return Ok(());
        }

        let predicates = self.current_predicates()?;
        let should_track = matches_any(self.engine.as_ref(), doc, &predicates)?;
        let id = DocId::resolve(target)?;

        debug!(file = %id, tracked = should_track, "Membership decision");
        if should_track {
            self.store.add(&id)
        } else {
            self.store.remove(&id)
        }
    }

    /// Prune the active set, writing the result back wholesale.
    ///
    /// Fast mode (`full = false`) keeps entries whose backing file is
    /// readable, with no predicate evaluation; used when predicates may be
    /// stale or host services are winding down. Full mode re-validates
    /// every entry against the current predicates, replaying the per-save
    /// decision without the add path. An entry whose re-validation errors
    /// is kept and logged; a subsequent fast pass evicts it if the file is
    /// gone. Predicate extraction failures still abort the whole pass.
    pub fn cleanup(&self, full: bool) -> Result<CleanupReport, TrackerError> {
        let current = self.store.current()?;
        let mut kept = IndexSet::with_capacity(current.len());

        if full {
            let predicates = self.current_predicates()?;
            for id in current.iter() {
                let doc = DocumentRef::File(id.as_path().to_path_buf());
                match matches_any(self.engine.as_ref(), &doc, &predicates) {
                    Ok(still_matches) => {
                        info!(file = %id, matches = still_matches, "Re-validated against current predicates");
                        if still_matches {
                            kept.insert(id.clone());
                        }
                    }
                    Err(e) => {
                        warn!(file = %id, error = %e, "Re-validation failed, keeping entry");
                        kept.insert(id.clone());
                    }
                }
            }
        } else {
            for id in current.iter() {
                if id.is_readable() {
                    kept.insert(id.clone());
                }
            }
        }

        let report = CleanupReport {
            kept: kept.len(),
            removed: current.len() - kept.len(),
        };
        self.store.replace_all(&kept)?;
        debug!(kept = report.kept, removed = report.removed, full, "Cleanup pass complete");
        Ok(report)
    }

    /// Full re-validation of the active set against current predicates.
    pub fn rebuild(&self) -> Result<CleanupReport, TrackerError> {
        self.cleanup(true)
    }
}
