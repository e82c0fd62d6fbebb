//! Filesystem Watch Adapter
//!
//! Drives membership updates from filesystem events for hosts without
//! their own document lifecycle hooks. Monitors the configured root and
//! re-evaluates a document's membership whenever it is written on disk;
//! removed documents are evicted from the active set.

use crate::error::TrackerError;
use crate::path::DocId;
use crate::query::DocumentRef;
use crate::tracker::Tracker;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Watch adapter configuration
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Debounce window in milliseconds
    pub debounce_ms: u64,
    /// Receive-loop wakeup interval in milliseconds
    pub poll_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            poll_ms: 50,
        }
    }
}

/// Document change derived from a filesystem event
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChangeEvent {
    Written(PathBuf),
    Removed(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

impl ChangeEvent {
    fn key(&self) -> &PathBuf {
        match self {
            ChangeEvent::Written(p) | ChangeEvent::Removed(p) => p,
            ChangeEvent::Renamed { to, .. } => to,
        }
    }
}

/// Per-path debouncer: a burst of events for the same document collapses
/// into the latest one, released once the window has elapsed.
///
/// The latest event wins because it reflects the final on-disk state of a
/// save burst; releasing after the window guarantees no event is dropped,
/// only deferred. Entries leave the map when taken, so only in-flight
/// bursts are held.
struct Debouncer {
    window: Duration,
    pending: HashMap<PathBuf, (ChangeEvent, Instant)>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Debouncer {
            window,
            pending: HashMap::new(),
        }
    }

    /// Record an event, replacing any pending event for the same path.
    fn push(&mut self, event: ChangeEvent) {
        let key = event.key().clone();
        self.pending.insert(key, (event, Instant::now()));
    }

    /// Remove and return events whose debounce window has elapsed.
    fn take_ready(&mut self) -> Vec<ChangeEvent> {
        let now = Instant::now();
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, (_, at))| now.duration_since(*at) >= self.window)
            .map(|(path, _)| path.clone())
            .collect();
        ready
            .into_iter()
            .filter_map(|path| self.pending.remove(&path).map(|(event, _)| event))
            .collect()
    }

    /// Remove and return all pending events regardless of window.
    fn drain(&mut self) -> Vec<ChangeEvent> {
        self.pending.drain().map(|(_, (event, _))| event).collect()
    }
}

/// Long-running adapter translating filesystem events into membership
/// updates.
pub struct WatchAdapter {
    tracker: Arc<Tracker>,
    config: WatchConfig,
    running: Arc<RwLock<bool>>,
}

impl WatchAdapter {
    pub fn new(tracker: Arc<Tracker>, config: WatchConfig) -> Self {
        WatchAdapter {
            tracker,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Shared running flag; clearing it stops [`run`](Self::run).
    pub fn running_flag(&self) -> Arc<RwLock<bool>> {
        Arc::clone(&self.running)
    }

    /// Stop the event loop after its current iteration.
    pub fn stop(&self) {
        *self.running.write() = false;
    }

    /// Watch the configured root and process events until stopped.
    ///
    /// Events are debounced per path; pending events still in flight when
    /// the loop stops are processed before returning.
    pub fn run(&self) -> Result<(), TrackerError> {
        *self.running.write() = true;

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(e) = tx.send(res) {
                error!("Error sending watch event: {}", e);
            }
        })
        .map_err(|e| {
            TrackerError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to create watcher: {}", e),
            ))
        })?;

        let root = self.tracker.config().root.clone();
        watcher.watch(&root, RecursiveMode::Recursive).map_err(|e| {
            TrackerError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to watch directory: {}", e),
            ))
        })?;
        info!(root = %root.display(), "Watching for document changes");

        let mut debouncer = Debouncer::new(Duration::from_millis(self.config.debounce_ms));
        let poll = Duration::from_millis(self.config.poll_ms);

        loop {
            if !*self.running.read() {
                break;
            }
            match rx.recv_timeout(poll) {
                Ok(Ok(event)) => {
                    if let Some(change) = convert_event(event) {
                        if self.is_relevant(&change) {
                            debouncer.push(change);
                        }
                    }
                }
                Ok(Err(e)) => {
                    // Continue watching despite backend errors
                    warn!("Watch error: {}", e);
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    error!("Watcher channel disconnected");
                    break;
                }
            }

            for change in debouncer.take_ready() {
                self.handle_change(change);
            }
        }

        for change in debouncer.drain() {
            self.handle_change(change);
        }

        Ok(())
    }

    /// Whether a change concerns a structured document at all.
    fn is_relevant(&self, change: &ChangeEvent) -> bool {
        match change {
            ChangeEvent::Written(path) | ChangeEvent::Removed(path) => {
                self.tracker.config().is_tracked_document(path)
            }
            ChangeEvent::Renamed { from, to } => {
                self.tracker.config().is_tracked_document(from)
                    || self.tracker.config().is_tracked_document(to)
            }
        }
    }

    /// Apply one document change to the active set.
    ///
    /// Update failures are logged and swallowed: unlike the before-persist
    /// hook there is no save operation to abort, and one bad document must
    /// not stop the watch loop.
    fn handle_change(&self, change: ChangeEvent) {
        match change {
            ChangeEvent::Written(path) => {
                if !self.tracker.config().is_tracked_document(&path) {
                    return;
                }
                debug!(file = %path.display(), "Document written, re-evaluating membership");
                let doc = DocumentRef::File(path.clone());
                if let Err(e) = self.tracker.update(&doc, Some(&path)) {
                    warn!(file = %path.display(), error = %e, "Membership update failed");
                }
            }
            ChangeEvent::Removed(path) => {
                if !self.tracker.config().is_tracked_document(&path) {
                    return;
                }
                match DocId::resolve(&path) {
                    Ok(id) => {
                        debug!(file = %id, "Document removed, evicting from active set");
                        if let Err(e) = self.tracker.store().remove(&id) {
                            warn!(file = %id, error = %e, "Eviction failed");
                        }
                    }
                    Err(e) => warn!(file = %path.display(), error = %e, "Unresolvable removed path"),
                }
            }
            ChangeEvent::Renamed { from, to } => {
                self.handle_change(ChangeEvent::Removed(from));
                self.handle_change(ChangeEvent::Written(to));
            }
        }
    }
}

/// Convert a notify event to a document change
fn convert_event(event: Event) -> Option<ChangeEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.first().map(|p| ChangeEvent::Written(p.clone())),
        EventKind::Modify(notify::event::ModifyKind::Name(_)) => {
            // Rename events carry two paths when the backend reports both
            if event.paths.len() >= 2 {
                Some(ChangeEvent::Renamed {
                    from: event.paths[0].clone(),
                    to: event.paths[1].clone(),
                })
            } else {
                event.paths.first().map(|p| ChangeEvent::Written(p.clone()))
            }
        }
        EventKind::Modify(_) => event.paths.first().map(|p| ChangeEvent::Written(p.clone())),
        EventKind::Remove(_) => event.paths.first().map(|p| ChangeEvent::Removed(p.clone())),
        _ => None,
    }
}
