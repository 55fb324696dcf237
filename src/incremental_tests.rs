// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn increment_before_any_snapshot_is_rejected() {
    let mut store = IncrementalStore::new();
    let err = store.handle_increment("book.depth-inc", Arc::from("{}")).unwrap_err();
    assert!(matches!(err, IncrementalError::NoSnapshotYet(topic) if topic == "book.depth-inc"));
}

#[test]
fn replay_with_no_entry_is_empty() {
    let store = IncrementalStore::new();
    assert!(store.replay("book.depth-inc").is_empty());
}

#[test]
fn replay_returns_snapshot_then_increments_in_order() {
    let mut store = IncrementalStore::new();
    store.handle_snapshot("book.depth-inc", Arc::from(r#"{"book.depth-snap":{"seq":1}}"#));
    store.handle_increment("book.depth-inc", Arc::from(r#"{"book.depth-inc":{"seq":2}}"#)).unwrap();
    store.handle_increment("book.depth-inc", Arc::from(r#"{"book.depth-inc":{"seq":3}}"#)).unwrap();

    let frames = store.replay("book.depth-inc");
    assert_eq!(
        frames,
        vec![
            Arc::from(r#"{"book.depth-snap":{"seq":1}}"#),
            Arc::from(r#"{"book.depth-inc":{"seq":2}}"#),
            Arc::from(r#"{"book.depth-inc":{"seq":3}}"#),
        ]
    );
}

#[test]
fn new_snapshot_clears_prior_increments() {
    let mut store = IncrementalStore::new();
    store.handle_snapshot("book.depth-inc", Arc::from(r#"{"book.depth-snap":{"seq":1}}"#));
    store.handle_increment("book.depth-inc", Arc::from(r#"{"book.depth-inc":{"seq":2}}"#)).unwrap();

    store.handle_snapshot("book.depth-inc", Arc::from(r#"{"book.depth-snap":{"seq":10}}"#));

    assert_eq!(store.replay("book.depth-inc"), vec![Arc::from(r#"{"book.depth-snap":{"seq":10}}"#)]);
}

#[test]
fn has_snapshot_reflects_presence() {
    let mut store = IncrementalStore::new();
    assert!(!store.has_snapshot("book.depth-inc"));
    store.handle_snapshot("book.depth-inc", Arc::from("{}"));
    assert!(store.has_snapshot("book.depth-inc"));
}
