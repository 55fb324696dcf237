// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot/increment buffering for `-inc` topics (§4.3).
//!
//! An incremental object is rebuilt by a client from one snapshot plus every
//! increment published after it. The store keeps the latest rendered
//! snapshot frame and the ordered increments published since, so a client
//! subscribing mid-stream can be replayed to the current state without
//! talking to the upstream again.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::IncrementalError;

struct Entry {
    /// Rendered `{"<topic>-snap": body}` frame, kept under its own key so a
    /// replayed snapshot is distinguishable from an increment on the wire.
    snapshot: Arc<str>,
    /// Rendered `{"<topic>-inc": body}` frames, oldest first.
    increments: Vec<Arc<str>>,
}

/// Keyed by the canonical `-inc` topic (i.e. `-snap` folded to `-inc`, per
/// [`crate::event::canonical_type`]).
#[derive(Default)]
pub struct IncrementalStore {
    entries: HashMap<String, Entry>,
}

impl IncrementalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot, replacing any prior snapshot and discarding
    /// increments accumulated before it.
    pub fn handle_snapshot(&mut self, inc_topic: &str, rendered: Arc<str>) {
        self.entries
            .insert(inc_topic.to_owned(), Entry { snapshot: rendered, increments: Vec::new() });
    }

    /// Record an increment. Rejected until a snapshot exists for this topic,
    /// matching the original implementation's `TestIncrementalObjectStorage`
    /// behavior: increments published before the first snapshot are dropped
    /// with an error rather than buffered.
    pub fn handle_increment(
        &mut self,
        inc_topic: &str,
        rendered: Arc<str>,
    ) -> Result<(), IncrementalError> {
        match self.entries.get_mut(inc_topic) {
            Some(entry) => {
                entry.increments.push(rendered);
                Ok(())
            }
            None => Err(IncrementalError::NoSnapshotYet(inc_topic.to_owned())),
        }
    }

    /// The replay sequence for a client newly subscribing to `inc_topic`:
    /// the current snapshot frame (if any) followed by every increment
    /// recorded since, in publication order.
    pub fn replay(&self, inc_topic: &str) -> Vec<Arc<str>> {
        match self.entries.get(inc_topic) {
            Some(entry) => {
                let mut frames = Vec::with_capacity(1 + entry.increments.len());
                frames.push(Arc::clone(&entry.snapshot));
                frames.extend(entry.increments.iter().cloned());
                frames
            }
            None => Vec::new(),
        }
    }

    pub fn has_snapshot(&self, inc_topic: &str) -> bool {
        self.entries.contains_key(inc_topic)
    }
}

#[cfg(test)]
#[path = "incremental_tests.rs"]
mod tests;
