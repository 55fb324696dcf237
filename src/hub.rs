// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The routing Hub: the single owner of every subscription table (§4.4, §5).
//!
//! `Hub` is not `Send`-shared; a single task owns it and drives it from
//! `run`, serializing three input streams — client requests, upstream
//! deliveries, and unregistrations — through one `tokio::select!` loop. This
//! is the "equivalent design" permitted in place of a mutex-guarded table:
//! single-writer-by-construction rather than single-writer-by-lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::event::{
    canonicalize_stream_key, classify_stream, is_increment, is_snapshot, Event, Scope, StreamClass,
};
use crate::incremental::IncrementalStore;
use crate::session::{ClientId, Identity, Session};
use crate::topic::Topic;
use crate::wire::{pack_event, pack_info_response, pack_subscription_response, ClientRequest, RequestMethod};

/// Messages the client-facing transport layer feeds into the Hub.
pub enum HubMessage {
    Register(Arc<Session>),
    Request { client: ClientId, request: ClientRequest },
    Unregister(ClientId),
}

struct ClientRecord {
    session: Arc<Session>,
    /// Every stream key this client is currently subscribed to, in request
    /// order, deduplicated. Mirrors the original `GetSubscriptions()` used
    /// to render the `streams` field of each response.
    subs: Vec<String>,
}

/// The routing Hub itself. `rbac` maps a lowercased prefix to the roles
/// allowed to subscribe under it (§4.5.1, populated from `RANGO_RBAC_*`).
pub struct Hub {
    public_topics: HashMap<String, Topic>,
    private_topics: HashMap<String, HashMap<String, Topic>>,
    prefixed_topics: HashMap<String, HashMap<String, Topic>>,
    incremental: IncrementalStore,
    clients: HashMap<ClientId, ClientRecord>,
    rbac: HashMap<String, Vec<String>>,
}

impl Hub {
    pub fn new(rbac: HashMap<String, Vec<String>>) -> Self {
        Self {
            public_topics: HashMap::new(),
            private_topics: HashMap::new(),
            prefixed_topics: HashMap::new(),
            incremental: IncrementalStore::new(),
            clients: HashMap::new(),
            rbac,
        }
    }

    pub fn public_topic_count(&self) -> usize {
        self.public_topics.len()
    }

    pub fn private_topic_count(&self) -> usize {
        self.private_topics.values().map(HashMap::len).sum()
    }

    pub fn prefixed_topic_count(&self) -> usize {
        self.prefixed_topics.values().map(HashMap::len).sum()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Drive the Hub until `cancel` fires. Owns the single mutation point for
    /// every table; everything else only ever sends into `commands`/`upstream`.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<HubMessage>,
        mut upstream: mpsc::Receiver<Event>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("hub shutting down");
                    return;
                }
                Some(message) = commands.recv() => self.handle_message(message),
                Some(event) = upstream.recv() => self.route_message(event),
                else => return,
            }
        }
    }

    fn handle_message(&mut self, message: HubMessage) {
        match message {
            HubMessage::Register(session) => self.register(session),
            HubMessage::Request { client, request } => self.handle_request(client, request),
            HubMessage::Unregister(client) => self.unregister(client),
        }
    }

    pub fn register(&mut self, session: Arc<Session>) {
        self.clients.insert(session.id, ClientRecord { session, subs: Vec::new() });
        crate::metrics::record_client_connected();
    }

    /// Release everything this client held and close its outbound queue.
    pub fn unregister(&mut self, client: ClientId) {
        let Some(record) = self.clients.remove(&client) else { return };
        let identity = record.session.identity().clone();
        for stream in &record.subs {
            self.remove_membership(client, stream, &identity);
        }
        record.session.close();
        crate::metrics::record_client_disconnected();
    }

    pub fn handle_request(&mut self, client: ClientId, request: ClientRequest) {
        match request.method {
            RequestMethod::Subscribe => self.handle_subscribe(client, request.streams),
            RequestMethod::Unsubscribe => self.handle_unsubscribe(client, request.streams),
        }
    }

    /// Subscribe `client` to each requested stream, in order. Already-held
    /// streams are skipped (invariant 2: idempotent). RBAC-gated prefixed
    /// streams the client's role does not cover emit an immediate denial
    /// notice instead of joining the topic (§4.5.1, S6).
    pub fn handle_subscribe(&mut self, client: ClientId, streams: Vec<String>) {
        let Some(record) = self.clients.get(&client) else { return };
        let session = Arc::clone(&record.session);
        let identity = session.identity().clone();

        for stream in streams {
            let stream = canonicalize_stream_key(&stream);
            if self.clients.get(&client).is_some_and(|r| r.subs.iter().any(|s| s == &stream)) {
                continue;
            }

            match classify_stream(&stream) {
                StreamClass::Public => {
                    self.public_topics
                        .entry(stream.clone())
                        .or_insert_with(|| Topic::new(stream.clone()))
                        .subscribe(Arc::clone(&session));
                    self.replay_incremental(&stream, &session);
                    crate::metrics::record_subscribed("public", &stream);
                    self.record_sub(client, stream);
                }
                StreamClass::Private => {
                    let Some(uid) = identity.uid.clone() else {
                        debug!(%stream, "anonymous client cannot subscribe to private stream");
                        continue;
                    };
                    self.private_topics
                        .entry(uid)
                        .or_default()
                        .entry(stream.clone())
                        .or_insert_with(|| Topic::new(stream.clone()))
                        .subscribe(Arc::clone(&session));
                    crate::metrics::record_subscribed("private", &stream);
                    self.record_sub(client, stream);
                }
                StreamClass::Prefixed { prefix, remainder } => {
                    if !self.prefix_allowed(prefix, identity.role.as_deref()) {
                        session.send(Arc::from(pack_info_response(format!(
                            "cannot subscribe to {stream}"
                        ))));
                        continue;
                    }
                    let prefix = prefix.to_owned();
                    let remainder = remainder.to_owned();
                    self.prefixed_topics
                        .entry(prefix)
                        .or_default()
                        .entry(remainder.clone())
                        .or_insert_with(|| Topic::new(remainder))
                        .subscribe(Arc::clone(&session));
                    crate::metrics::record_subscribed("prefixed", &stream);
                    self.record_sub(client, stream);
                }
            }
        }

        let current = self.clients.get(&client).map(|r| r.subs.clone()).unwrap_or_default();
        session.send(Arc::from(pack_subscription_response("subscribed", current)));
    }

    /// Unsubscribe `client` from each requested stream, in order. Streams the
    /// client never held are silently ignored.
    pub fn handle_unsubscribe(&mut self, client: ClientId, streams: Vec<String>) {
        let Some(record) = self.clients.get(&client) else { return };
        let session = Arc::clone(&record.session);
        let identity = session.identity().clone();

        for stream in streams {
            let stream = canonicalize_stream_key(&stream);
            self.remove_membership(client, &stream, &identity);
            if let Some(r) = self.clients.get_mut(&client) {
                r.subs.retain(|s| s != &stream);
            }
        }

        let current = self.clients.get(&client).map(|r| r.subs.clone()).unwrap_or_default();
        session.send(Arc::from(pack_subscription_response("unsubscribed", current)));
    }

    fn record_sub(&mut self, client: ClientId, stream: String) {
        if let Some(record) = self.clients.get_mut(&client) {
            record.subs.push(stream);
        }
    }

    fn prefix_allowed(&self, prefix: &str, role: Option<&str>) -> bool {
        let Some(role) = role else { return false };
        self.rbac.get(prefix).is_some_and(|roles| roles.iter().any(|r| r == role))
    }

    fn remove_membership(&mut self, client: ClientId, stream: &str, identity: &Identity) {
        match classify_stream(stream) {
            StreamClass::Public => {
                if let Some(topic) = self.public_topics.get_mut(stream) {
                    if topic.unsubscribe(client) {
                        crate::metrics::record_unsubscribed("public", stream);
                    }
                    if topic.is_empty() {
                        self.public_topics.remove(stream);
                    }
                }
            }
            StreamClass::Private => {
                let Some(uid) = identity.uid.as_deref() else { return };
                if let Some(user_topics) = self.private_topics.get_mut(uid) {
                    if let Some(topic) = user_topics.get_mut(stream) {
                        if topic.unsubscribe(client) {
                            crate::metrics::record_unsubscribed("private", stream);
                        }
                        if topic.is_empty() {
                            user_topics.remove(stream);
                        }
                    }
                    if user_topics.is_empty() {
                        self.private_topics.remove(uid);
                    }
                }
            }
            StreamClass::Prefixed { prefix, remainder } => {
                if let Some(remainders) = self.prefixed_topics.get_mut(prefix) {
                    if let Some(topic) = remainders.get_mut(remainder) {
                        if topic.unsubscribe(client) {
                            crate::metrics::record_unsubscribed("prefixed", stream);
                        }
                        if topic.is_empty() {
                            remainders.remove(remainder);
                        }
                    }
                    if remainders.is_empty() {
                        self.prefixed_topics.remove(prefix);
                    }
                }
            }
        }
    }

    /// Replay a buffered snapshot + increments to a client that just joined
    /// a public `-inc` stream. Scoped to public streams, which is the only
    /// place incremental objects are produced upstream.
    fn replay_incremental(&self, stream: &str, session: &Arc<Session>) {
        if !self.incremental.has_snapshot(stream) {
            return;
        }
        for frame in self.incremental.replay(stream) {
            session.send(frame);
        }
    }

    /// Classify and fan out one upstream delivery (§4.5.2). Snapshot/increment
    /// handling only applies to `public`/`global` scope; private and prefixed
    /// events are never treated as snapshot/increment at this layer.
    pub fn route_message(&mut self, event: Event) {
        match &event.scope {
            Scope::Private => {
                let Some(user_topics) = self.private_topics.get(&event.stream) else { return };
                let Some(topic) = user_topics.get(&event.topic) else { return };
                topic.broadcast(&event.body);
            }
            Scope::Prefixed(prefix) => {
                let Some(remainders) = self.prefixed_topics.get(prefix) else { return };
                let Some(topic) = remainders.get(&event.topic) else { return };
                topic.broadcast(&event.body);
            }
            Scope::Public | Scope::Global => self.route_public(&event),
        }
    }

    /// A `public`/`global` delivery. `-snap` is stored but never broadcast
    /// (clients only see snapshots via replay-on-subscribe). `-inc` is stored
    /// and, only on success, broadcast to the topic using the frame already
    /// rendered for the store (avoids re-encoding, §4.2's `broadcastRaw`).
    /// Anything else is broadcast normally if the topic exists.
    fn route_public(&mut self, event: &Event) {
        let raw_topic = format!("{}.{}", event.stream, event.kind);

        if is_snapshot(&event.kind) {
            let rendered: Arc<str> = Arc::from(pack_event(&raw_topic, &event.body));
            self.incremental.handle_snapshot(&event.topic, rendered);
            return;
        }

        if is_increment(&event.kind) {
            let rendered: Arc<str> = Arc::from(pack_event(&raw_topic, &event.body));
            match self.incremental.handle_increment(&event.topic, Arc::clone(&rendered)) {
                Ok(()) => {
                    if let Some(topic) = self.public_topics.get(&event.topic) {
                        topic.broadcast_raw(rendered);
                    }
                }
                Err(err) => warn!(topic = %event.topic, error = %err, "dropping increment"),
            }
            return;
        }

        if let Some(topic) = self.public_topics.get(&event.topic) {
            topic.broadcast(&event.body);
        }
    }

    /// All stream keys held by a client, for diagnostics and tests.
    pub fn subscriptions_of(&self, client: ClientId) -> Option<&[String]> {
        self.clients.get(&client).map(|r| r.subs.as_slice())
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
