// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client session handle: identity, bounded outbound queue, and the
//! force-close/graceful-close primitives the Hub drives (§4.4).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of a session's bounded outbound queue (§3, §5).
pub const OUTBOUND_CAPACITY: usize = 256;

/// Stable identity for a client within the Hub's tables — a pointer-equivalent
/// handle, per §9's "use stable identity as the set key" guidance.
pub type ClientId = u64;

fn next_client_id() -> ClientId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// A client's identity, read once at upgrade and immutable for the session's
/// lifetime. An empty `role` means "no role"; `uid: None` means anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub uid: Option<String>,
    pub role: Option<String>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.uid.is_none()
    }
}

/// Handle to one connected client, shared between the Hub's tables and the
/// session's own reader/writer tasks.
///
/// Only the reader/writer tasks call the socket; the Hub only ever touches
/// this handle's `send`/`close`/`force_close`/`identity` surface (§4.4,
/// invariant 5).
pub struct Session {
    pub id: ClientId,
    identity: Identity,
    outbound: Mutex<Option<mpsc::Sender<Arc<str>>>>,
    cancel: CancellationToken,
}

impl Session {
    /// Create a new session handle plus the receiving end of its outbound
    /// queue, which the writer task drains.
    pub fn new(identity: Identity) -> (Arc<Session>, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let session = Arc::new(Session {
            id: next_client_id(),
            identity,
            outbound: Mutex::new(Some(tx)),
            cancel: CancellationToken::new(),
        });
        (session, rx)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Enqueue a rendered payload. Non-blocking: on a full queue the
    /// connection is force-closed (slow-consumer policy, §4.2, §5) and this
    /// returns `false`. Returns `false` also if the session was already
    /// closed.
    pub fn send(&self, rendered: Arc<str>) -> bool {
        let guard = self.outbound.lock().unwrap_or_else(|p| p.into_inner());
        let Some(tx) = guard.as_ref() else { return false };
        match tx.try_send(rendered) {
            Ok(()) => true,
            Err(_) => {
                drop(guard);
                self.force_close();
                false
            }
        }
    }

    /// Close the outbound queue so the writer drains remaining messages,
    /// sends a close frame, and exits. Used by the Hub's unregister path.
    pub fn close(&self) {
        let mut guard = self.outbound.lock().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    /// Abruptly cancel the connection (slow-consumer / force-close policy).
    /// Unlike `close`, this does not wait for the writer to drain.
    pub fn force_close(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).field("identity", &self.identity).finish()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
