// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single stream's subscriber set (§4.2).
//!
//! Topics are owned and mutated exclusively by the Hub loop; nothing here is
//! shared or locked. Membership is keyed by [`ClientId`] rather than by
//! `Arc<Session>` pointer identity so `subscribe`/`unsubscribe` stay O(1) and
//! idempotent regardless of how many handles to a session exist.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::session::{ClientId, Session};
use crate::wire::pack_event;

/// Lazily created per the Hub's "create on first subscribe" rule; garbage
/// collected by the Hub once `is_empty()` after an unsubscribe (§4.2, §5).
pub struct Topic {
    key: String,
    members: HashMap<ClientId, Arc<Session>>,
}

impl Topic {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), members: HashMap::new() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add `session` to the membership set. Returns `true` only when this
    /// was the first time this client joined (idempotent, invariant 2).
    pub fn subscribe(&mut self, session: Arc<Session>) -> bool {
        self.members.insert(session.id, session).is_none()
    }

    /// Remove a client by id. Returns `true` only if it was a member.
    pub fn unsubscribe(&mut self, client: ClientId) -> bool {
        self.members.remove(&client).is_some()
    }

    /// Render `{"<topic>": body}` once and enqueue it to every subscriber's
    /// outbound queue. A full queue force-closes that subscriber but does not
    /// interrupt delivery to the rest (§4.2, §5).
    pub fn broadcast(&self, body: &Value) {
        let rendered: Arc<str> = Arc::from(pack_event(&self.key, body));
        self.broadcast_raw(rendered);
    }

    /// Enqueue an already-rendered frame verbatim, bypassing re-encoding.
    /// Used by incremental replay, which must resend snapshot/increment
    /// frames exactly as originally rendered (§4.3).
    pub fn broadcast_raw(&self, rendered: Arc<str>) {
        for session in self.members.values() {
            session.send(Arc::clone(&rendered));
        }
    }
}

#[cfg(test)]
#[path = "topic_tests.rs"]
mod tests;
