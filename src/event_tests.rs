// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn canonical_type_folds_snap_to_inc() {
    assert_eq!(canonical_type("count-snap"), "count-inc");
    assert_eq!(canonical_type("count-inc"), "count-inc");
    assert_eq!(canonical_type("count"), "count");
}

#[test]
fn is_increment_and_snapshot_detect_suffixes() {
    assert!(is_increment("ob-inc"));
    assert!(!is_increment("ob-snap"));
    assert!(!is_increment("ob"));

    assert!(is_snapshot("ob-snap"));
    assert!(!is_snapshot("ob-inc"));
    assert!(!is_snapshot("ob"));
}

#[test]
fn topic_for_matches_original_fixture() {
    assert_eq!(topic_for(false, "abc", "count"), "abc.count");
    assert_eq!(topic_for(true, "abc", "count"), "count");
    assert_eq!(topic_for(false, "abc", "count-inc"), "abc.count-inc");
    assert_eq!(topic_for(false, "abc", "count-snap"), "abc.count-inc");
}

#[test]
fn parse_routing_key_two_segments() {
    let ev = parse_routing_key("private.trades", json!({"a":1})).expect("parses");
    assert_eq!(ev.scope, Scope::Private);
    assert_eq!(ev.stream, "");
    assert_eq!(ev.kind, "trades");
    assert_eq!(ev.topic, "trades");
}

#[test]
fn parse_routing_key_three_segments_public() {
    let ev = parse_routing_key("public.eurusd.trades", json!({"a":1})).expect("parses");
    assert_eq!(ev.scope, Scope::Public);
    assert_eq!(ev.stream, "eurusd");
    assert_eq!(ev.kind, "trades");
    assert_eq!(ev.topic, "eurusd.trades");
}

#[test]
fn parse_routing_key_private_with_uid() {
    let ev = parse_routing_key("private.U1.trades", json!({"a":1})).expect("parses");
    assert_eq!(ev.scope, Scope::Private);
    assert_eq!(ev.stream, "U1");
    assert_eq!(ev.topic, "trades");
}

#[test]
fn parse_routing_key_prefixed() {
    let ev = parse_routing_key("admin.orders.updates", json!({})).expect("parses");
    assert_eq!(ev.scope, Scope::Prefixed("admin".to_owned()));
    assert_eq!(ev.stream, "orders");
    assert_eq!(ev.topic, "orders.updates");
}

#[test]
fn parse_routing_key_rejects_bad_segment_count() {
    assert!(parse_routing_key("onesegment", json!({})).is_none());
    assert!(parse_routing_key("a.b.c.d", json!({})).is_none());
}

#[test]
fn canonicalize_stream_key_folds_trailing_snap() {
    assert_eq!(canonicalize_stream_key("eurusd.count-snap"), "eurusd.count-inc");
    assert_eq!(canonicalize_stream_key("eurusd.count-inc"), "eurusd.count-inc");
    assert_eq!(canonicalize_stream_key("count-snap"), "count-inc");
    assert_eq!(canonicalize_stream_key("eurusd.trades"), "eurusd.trades");
}

#[test]
fn classify_stream_rules() {
    assert_eq!(classify_stream("trades"), StreamClass::Private);
    assert_eq!(classify_stream("eurusd.trades"), StreamClass::Public);
    assert_eq!(
        classify_stream("admin.orders.updates"),
        StreamClass::Prefixed { prefix: "admin", remainder: "orders.updates" }
    );
}
