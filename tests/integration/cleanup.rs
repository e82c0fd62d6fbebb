//! Cleanup and rebuild pass behavior

use super::test_utils::fixture_with_predicates;
use docket::path::DocId;

#[test]
fn test_full_cleanup_keeps_only_matching_entries() {
    let fx = fixture_with_predicates(&["TODO"]);
    let matching = fx.write_doc("match.org", "* TODO still relevant");
    let stale = fx.write_doc("stale.org", "* DONE all wrapped up");

    fx.tracker.store().add(&DocId::resolve(&stale).unwrap()).unwrap();
    fx.tracker.store().add(&DocId::resolve(&matching).unwrap()).unwrap();

    let report = fx.tracker.cleanup(true).unwrap();
    assert_eq!(report.kept, 1);
    assert_eq!(report.removed, 1);

    let active = fx.active_paths();
    assert_eq!(active.len(), 1);
    assert!(active[0].ends_with("match.org"));
}

#[test]
fn test_full_cleanup_survives_a_failing_entry() {
    let fx = fixture_with_predicates(&["TODO"]);
    let matching = fx.write_doc("match.org", "* TODO still relevant");
    let stale = fx.write_doc("stale.org", "* DONE all wrapped up");
    // Never written: the engine errors trying to read it
    let ghost = fx.dir.path().join("ghost.org");

    fx.tracker.store().add(&DocId::from_canonical(&ghost)).unwrap();
    fx.tracker.store().add(&DocId::resolve(&stale).unwrap()).unwrap();
    fx.tracker.store().add(&DocId::resolve(&matching).unwrap()).unwrap();

    // One unreadable entry does not wedge the pass: it is kept for a
    // later fast pass to evict, while the stale entry is still pruned
    let report = fx.tracker.cleanup(true).unwrap();
    assert_eq!(report.kept, 2);
    assert_eq!(report.removed, 1);

    let active = fx.active_paths();
    assert_eq!(active.len(), 2);
    assert!(active[0].ends_with("match.org"));
    assert!(active[1].ends_with("ghost.org"));

    let after = fx.tracker.cleanup(false).unwrap();
    assert_eq!((after.kept, after.removed), (1, 1));
    assert!(fx.active_paths()[0].ends_with("match.org"));
}

#[test]
fn test_fast_cleanup_is_matching_agnostic() {
    let fx = fixture_with_predicates(&["TODO"]);
    // Readable but no longer matching any predicate
    let readable = fx.write_doc("readable.org", "* DONE nothing to do");
    let unreadable = fx.dir.path().join("vanished.org");

    fx.tracker.store().add(&DocId::from_canonical(&unreadable)).unwrap();
    fx.tracker.store().add(&DocId::resolve(&readable).unwrap()).unwrap();

    let report = fx.tracker.cleanup(false).unwrap();
    assert_eq!(report.kept, 1);
    assert_eq!(report.removed, 1);

    // Readable entry survives despite failing re-validation; the
    // unreadable one is dropped regardless of what it might match
    let active = fx.active_paths();
    assert_eq!(active.len(), 1);
    assert!(active[0].ends_with("readable.org"));
}

#[test]
fn test_full_cleanup_with_empty_predicates_clears_the_set() {
    let fx = fixture_with_predicates(&[]);
    let doc = fx.write_doc("a.org", "* TODO would need a predicate");
    fx.tracker.store().add(&DocId::resolve(&doc).unwrap()).unwrap();

    let report = fx.tracker.cleanup(true).unwrap();
    assert_eq!(report.kept, 0);
    assert_eq!(report.removed, 1);
    assert!(fx.active_paths().is_empty());
}

#[test]
fn test_cleanup_on_empty_set_is_noop() {
    let fx = fixture_with_predicates(&["TODO"]);

    let fast = fx.tracker.cleanup(false).unwrap();
    assert_eq!((fast.kept, fast.removed), (0, 0));

    let full = fx.tracker.cleanup(true).unwrap();
    assert_eq!((full.kept, full.removed), (0, 0));
}

#[test]
fn test_rebuild_is_full_cleanup() {
    let fx = fixture_with_predicates(&["TODO"]);
    let matching = fx.write_doc("keep.org", "* TODO keep");
    let stale = fx.write_doc("drop.org", "nothing here");

    fx.tracker.store().add(&DocId::resolve(&matching).unwrap()).unwrap();
    fx.tracker.store().add(&DocId::resolve(&stale).unwrap()).unwrap();

    let report = fx.tracker.rebuild().unwrap();
    assert_eq!(report.kept, 1);
    assert_eq!(report.removed, 1);
    assert!(fx.active_paths()[0].ends_with("keep.org"));
}

#[test]
fn test_full_cleanup_preserves_order_of_survivors() {
    let fx = fixture_with_predicates(&["TODO"]);
    let a = fx.write_doc("a.org", "* TODO a");
    let b = fx.write_doc("b.org", "* TODO b");
    let c = fx.write_doc("c.org", "done");

    // Front-insertion order: c, b, a
    fx.tracker.store().add(&DocId::resolve(&a).unwrap()).unwrap();
    fx.tracker.store().add(&DocId::resolve(&b).unwrap()).unwrap();
    fx.tracker.store().add(&DocId::resolve(&c).unwrap()).unwrap();

    fx.tracker.cleanup(true).unwrap();

    let active = fx.active_paths();
    assert_eq!(active.len(), 2);
    assert!(active[0].ends_with("b.org"));
    assert!(active[1].ends_with("a.org"));
}
