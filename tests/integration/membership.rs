//! Per-save membership update behavior

use super::test_utils::{fixture_with_predicates, Passthrough, StubEngine};
use docket::active_set::{ActiveListHost, InMemoryActiveList};
use docket::config::DocketConfig;
use docket::error::TrackerError;
use docket::path::DocId;
use docket::query::DocumentRef;
use docket::sources::StaticSources;
use docket::tracker::Tracker;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn buffer_for(path: &PathBuf, content: &str) -> DocumentRef {
    DocumentRef::Buffer {
        file: Some(path.clone()),
        content: content.to_string(),
    }
}

#[test]
fn test_matching_document_is_added() -> anyhow::Result<()> {
    let fx = fixture_with_predicates(&["TODO"]);
    let d1 = fx.write_doc("d1.org", "* TODO file taxes");

    fx.tracker.update(&buffer_for(&d1, "* TODO file taxes"), None)?;

    let active = fx.active_paths();
    assert_eq!(active.len(), 1);
    assert!(active[0].ends_with("d1.org"));
    Ok(())
}

#[test]
fn test_non_matching_document_is_not_added_and_gets_removed() {
    let fx = fixture_with_predicates(&["TODO"]);
    let d2 = fx.write_doc("d2.org", "* Notes from yesterday");

    // Never added
    fx.tracker
        .update(&buffer_for(&d2, "* Notes from yesterday"), None)
        .unwrap();
    assert!(fx.active_paths().is_empty());

    // Previously tracked, then edited to no longer match
    let id = DocId::resolve(&d2).unwrap();
    fx.tracker.store().add(&id).unwrap();
    fx.tracker
        .update(&buffer_for(&d2, "* Notes from yesterday"), None)
        .unwrap();
    assert!(fx.active_paths().is_empty());
}

#[test]
fn test_update_is_idempotent() {
    let fx = fixture_with_predicates(&["TODO"]);
    let d1 = fx.write_doc("d1.org", "* TODO once");
    let doc = buffer_for(&d1, "* TODO once");

    fx.tracker.update(&doc, None).unwrap();
    let after_one = fx.active_paths();
    fx.tracker.update(&doc, None).unwrap();
    let after_two = fx.active_paths();

    assert_eq!(after_one, after_two);
    assert_eq!(after_two.len(), 1);
}

#[test]
fn test_empty_configuration_never_matches() {
    let fx = fixture_with_predicates(&[]);
    let d1 = fx.write_doc("d1.org", "* TODO would match if configured");

    // Pre-track the document, then save with zero predicates configured
    let id = DocId::resolve(&d1).unwrap();
    fx.tracker.store().add(&id).unwrap();

    fx.tracker
        .update(&buffer_for(&d1, "* TODO would match if configured"), None)
        .unwrap();
    assert!(fx.active_paths().is_empty());
}

#[test]
fn test_non_document_file_is_silent_noop() {
    let fx = fixture_with_predicates(&["TODO"]);
    let txt = fx.write_doc("scratch.txt", "TODO but not a structured document");

    // Seed the set so we can observe that nothing was touched
    let seeded = fx.write_doc("seed.org", "* TODO seeded");
    let id = DocId::resolve(&seeded).unwrap();
    fx.tracker.store().add(&id).unwrap();

    fx.tracker
        .update(&buffer_for(&txt, "TODO but not a structured document"), None)
        .unwrap();
    assert_eq!(fx.active_paths().len(), 1);
}

#[test]
fn test_detached_buffer_is_silent_noop() {
    let fx = fixture_with_predicates(&["TODO"]);
    let doc = DocumentRef::Buffer {
        file: None,
        content: "* TODO no file yet".to_string(),
    };

    fx.tracker.update(&doc, None).unwrap();
    assert!(fx.active_paths().is_empty());
}

#[test]
fn test_explicit_file_argument_supplies_the_target() {
    let fx = fixture_with_predicates(&["TODO"]);
    let target = fx.write_doc("target.org", "* TODO via explicit path");
    let doc = DocumentRef::Buffer {
        file: None,
        content: "* TODO via explicit path".to_string(),
    };

    fx.tracker.update(&doc, Some(&target)).unwrap();
    assert_eq!(fx.active_paths().len(), 1);
    assert!(fx.active_paths()[0].ends_with("target.org"));
}

#[test]
fn test_engine_failure_aborts_update_and_leaves_set_untouched() {
    let fx = fixture_with_predicates(&["TODO"]);
    let seeded = fx.write_doc("seed.org", "* TODO seeded");
    let id = DocId::resolve(&seeded).unwrap();
    fx.tracker.store().add(&id).unwrap();

    // A file reference to a missing document makes the stub engine raise,
    // the way a real engine raises on an unreadable target.
    let ghost = fx.dir.path().join("ghost.org");
    let result = fx
        .tracker
        .update(&DocumentRef::File(ghost.clone()), Some(&ghost));

    assert!(matches!(result, Err(TrackerError::QueryFailed { .. })));
    assert_eq!(fx.active_paths().len(), 1);
}

/// Host wrapper that counts wholesale writes.
struct CountingHost {
    inner: InMemoryActiveList,
    writes: AtomicUsize,
}

impl ActiveListHost for CountingHost {
    fn current(&self) -> Result<Vec<DocId>, TrackerError> {
        self.inner.current()
    }

    fn replace_all(&self, entries: &[DocId]) -> Result<(), TrackerError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.replace_all(entries)
    }
}

#[test]
fn test_update_always_persists_even_without_change() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = DocketConfig {
        root: dir.path().to_path_buf(),
        ..Default::default()
    };
    let host = Arc::new(CountingHost {
        inner: InMemoryActiveList::new(),
        writes: AtomicUsize::new(0),
    });
    let tracker = Tracker::new(
        config,
        Arc::new(StubEngine),
        Arc::new(Passthrough),
        Arc::new(StaticSources::default()),
        Arc::clone(&host) as Arc<dyn ActiveListHost>,
    );

    let doc_path = dir.path().join("d.org");
    std::fs::write(&doc_path, "nothing matches").unwrap();
    let doc = buffer_for(&doc_path, "nothing matches");

    // No predicates, no membership change, but the host write still happens
    tracker.update(&doc, None).unwrap();
    tracker.update(&doc, None).unwrap();
    assert_eq!(host.writes.load(Ordering::SeqCst), 2);
}
