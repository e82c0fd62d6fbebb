//! Lifecycle Hooks and Mode Switch
//!
//! The tracker subscribes to two host lifecycle events: document opened
//! and document about-to-be-persisted. Enabling the mode installs an open
//! hook that, for every structured document opened under the configured
//! root, installs a per-document before-persist hook invoking the
//! membership update. Disabling removes both hook layers and runs one fast
//! cleanup pass to scrub entries that may now be stale.

use crate::error::TrackerError;
use crate::query::DocumentRef;
use crate::tracker::{CleanupReport, Tracker};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Handle for an installed hook, used for removal.
pub type HookId = u64;

/// Handler invoked when a document is opened.
pub type OpenedHandler = Arc<dyn Fn(&DocumentRef) -> Result<(), TrackerError> + Send + Sync>;

/// Handler invoked immediately before a document is persisted.
///
/// An error return is surfaced by the host as a failure of the save
/// operation; the write has not happened yet at that point.
pub type PersistHandler = Arc<dyn Fn(&DocumentRef) -> Result<(), TrackerError> + Send + Sync>;

/// The host's document lifecycle event capability.
///
/// The core only attaches and detaches handlers; firing is driven by the
/// host, which serializes event dispatch on a single thread.
pub trait DocumentEvents: Send + Sync {
    /// Install a handler for every document-open event.
    fn on_document_opened(&self, handler: OpenedHandler) -> HookId;

    /// Install a handler firing before the given document is persisted.
    fn on_before_persist(&self, document: &Path, handler: PersistHandler) -> HookId;

    /// Detach a previously installed handler. Unknown ids are ignored.
    fn remove_hook(&self, hook: HookId);
}

struct InstalledHooks {
    open_hook: HookId,
    persist_hooks: Arc<RwLock<Vec<HookId>>>,
}

/// Process-wide activation toggle for membership tracking.
pub struct ModeSwitch {
    tracker: Arc<Tracker>,
    events: Arc<dyn DocumentEvents>,
    installed: RwLock<Option<InstalledHooks>>,
}

impl ModeSwitch {
    pub fn new(tracker: Arc<Tracker>, events: Arc<dyn DocumentEvents>) -> Self {
        ModeSwitch {
            tracker,
            events,
            installed: RwLock::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.installed.read().is_some()
    }

    /// Turn tracking on: install the document-open hook. Enabling an
    /// already-enabled switch is a no-op.
    pub fn enable(&self) {
        let mut guard = self.installed.write();
        if guard.is_some() {
            return;
        }

        let persist_hooks: Arc<RwLock<Vec<HookId>>> = Arc::new(RwLock::new(Vec::new()));
        let tracker = Arc::clone(&self.tracker);
        let events = Arc::clone(&self.events);
        let registry = Arc::clone(&persist_hooks);

        let open_hook = self.events.on_document_opened(Arc::new(move |doc: &DocumentRef| {
            let path = match doc.file_path() {
                Some(p) => p.to_path_buf(),
                None => return Ok(()),
            };
            if !tracker.config().is_under_root(&path)
                || !tracker.config().is_tracked_document(&path)
            {
                return Ok(());
            }

            debug!(file = %path.display(), "Installing before-persist hook");
            let update_tracker = Arc::clone(&tracker);
            let hook = events.on_before_persist(
                &path,
                Arc::new(move |doc: &DocumentRef| update_tracker.update(doc, None)),
            );
            registry.write().push(hook);
            Ok(())
        }));

        *guard = Some(InstalledHooks {
            open_hook,
            persist_hooks,
        });
        info!("Document tracking enabled");
    }

    /// Turn tracking off: remove both hook layers and run one fast
    /// cleanup pass (readability only; predicates may be stale at this
    /// point). Disabling an already-disabled switch is a no-op.
    pub fn disable(&self) -> Result<Option<CleanupReport>, TrackerError> {
        let taken = self.installed.write().take();
        let installed = match taken {
            Some(installed) => installed,
            None => return Ok(None),
        };

        self.events.remove_hook(installed.open_hook);
        for hook in installed.persist_hooks.write().drain(..) {
            self.events.remove_hook(hook);
        }

        let report = self.tracker.cleanup(false)?;
        info!(kept = report.kept, removed = report.removed, "Document tracking disabled");
        Ok(Some(report))
    }
}
