// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream event classification: routing-key parsing, scope/stream/type/topic
//! derivation, and the `-snap`/`-inc` suffix rules.

use serde_json::Value;

/// Classification of an event's first routing-key segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Public,
    Global,
    Private,
    /// A role-gating prefix (the first segment of a 3-segment routing key).
    Prefixed(String),
}

impl Scope {
    fn from_segment(segment: &str) -> Self {
        match segment {
            "public" => Scope::Public,
            "global" => Scope::Global,
            "private" => Scope::Private,
            other => Scope::Prefixed(other.to_owned()),
        }
    }
}

/// One upstream delivery, classified per the dot-count rules.
#[derive(Debug, Clone)]
pub struct Event {
    pub scope: Scope,
    /// Second routing-key segment, or empty when the key has only two segments.
    /// For `private` scope this is the target user id.
    pub stream: String,
    /// Last routing-key segment (may carry a `-inc`/`-snap` suffix).
    pub kind: String,
    /// Canonical lookup key for the subscriber tables.
    pub topic: String,
    pub body: Value,
}

/// Fold a `-snap` suffix to `-inc`, leaving any other suffix untouched.
pub fn canonical_type(kind: &str) -> String {
    if let Some(stem) = kind.strip_suffix("-snap") {
        format!("{stem}-inc")
    } else {
        kind.to_owned()
    }
}

pub fn is_increment(kind: &str) -> bool {
    kind.ends_with("-inc")
}

pub fn is_snapshot(kind: &str) -> bool {
    kind.ends_with("-snap")
}

/// Derive the canonical topic key for a (scope-name, stream, type) triple.
///
/// `private` scope collapses to just the type; every other scope is
/// `stream.type` with `-snap` folded to `-inc`.
pub fn topic_for(scope_is_private: bool, stream: &str, kind: &str) -> String {
    if scope_is_private {
        canonical_type(kind)
    } else {
        format!("{stream}.{}", canonical_type(kind))
    }
}

/// Parse an AMQP routing key (`scope.stream.type` or `scope.type`) and an
/// already-decoded JSON body into an [`Event`].
///
/// Returns `None` if the routing key does not have 2 or 3 dot-separated
/// segments, matching §4.5.2's "other lengths are invalid and logged" rule.
pub fn parse_routing_key(routing_key: &str, body: Value) -> Option<Event> {
    let parts: Vec<&str> = routing_key.split('.').collect();
    let (scope_segment, stream, kind) = match parts.as_slice() {
        [scope, kind] => (*scope, "", *kind),
        [scope, stream, kind] => (*scope, *stream, *kind),
        _ => return None,
    };

    let scope = Scope::from_segment(scope_segment);
    let is_private = matches!(scope, Scope::Private);
    let topic = topic_for(is_private, stream, kind);

    Some(Event { scope, stream: stream.to_owned(), kind: kind.to_owned(), topic, body })
}

/// Classification of a client-requested stream key, per §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamClass<'a> {
    /// 0 dots: scoped to the subscribing user.
    Private,
    /// exactly 2 dots: `prefix.rest` where `prefix` gates access via RBAC.
    Prefixed { prefix: &'a str, remainder: &'a str },
    /// Anything else (including the common 1-dot `stream.type` case).
    Public,
}

/// Fold a trailing `-snap` suffix on a client-requested stream key to
/// `-inc`, so a client subscribing via either spelling lands in the same
/// topic and sees the same incremental replay (§4.3).
pub fn canonicalize_stream_key(stream: &str) -> String {
    match stream.rsplit_once('.') {
        Some((head, tail)) => format!("{head}.{}", canonical_type(tail)),
        None => canonical_type(stream),
    }
}

pub fn classify_stream(stream: &str) -> StreamClass<'_> {
    let dots = stream.matches('.').count();
    match dots {
        0 => StreamClass::Private,
        2 => {
            let (prefix, remainder) =
                stream.split_once('.').unwrap_or((stream, ""));
            StreamClass::Prefixed { prefix, remainder }
        }
        _ => StreamClass::Public,
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
