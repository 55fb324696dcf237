// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON wire codec for client request/response/event frames (§4.1).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WireError;

/// A decoded client request frame: `{"event":"subscribe"|"unsubscribe","streams":[...]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRequest {
    pub method: RequestMethod,
    pub streams: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Subscribe,
    Unsubscribe,
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    event: String,
    #[serde(default)]
    streams: Vec<String>,
}

/// Decode a client frame's raw text into a [`ClientRequest`].
///
/// Malformed JSON or an unrecognised `event` both surface as a [`WireError`];
/// the Hub turns either into an in-band `{"error":"..."}` response per §7.
pub fn decode_request(text: &str) -> Result<ClientRequest, WireError> {
    let raw: RawFrame =
        serde_json::from_str(text).map_err(|e| WireError::InvalidJson(e.to_string()))?;

    let method = match raw.event.as_str() {
        "subscribe" => RequestMethod::Subscribe,
        "unsubscribe" => RequestMethod::Unsubscribe,
        other => return Err(WireError::UnknownEvent(other.to_owned())),
    };

    Ok(ClientRequest { method, streams: raw.streams })
}

/// Outgoing response envelope: `{"success":V}` or `{"error":"..."}"`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum ResponseEnvelope<T> {
    Success { success: T },
    Error { error: String },
}

/// `{"success":{"message":"subscribed"|"unsubscribed","streams":[...]}}`.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResult {
    pub message: &'static str,
    pub streams: Vec<String>,
}

/// `{"success":{"message":"..."}}` with no `streams` field, used for the RBAC
/// denial notice (§4.5.1, S6).
#[derive(Debug, Clone, Serialize)]
pub struct InfoResult {
    pub message: String,
}

/// Render `{"success":{"message":...,"streams":[...]}}`.
pub fn pack_subscription_response(message: &'static str, streams: Vec<String>) -> String {
    pack_success(SubscriptionResult { message, streams })
}

/// Render `{"success":{"message":"..."}}` (no `streams` key).
pub fn pack_info_response(message: impl Into<String>) -> String {
    pack_success(InfoResult { message: message.into() })
}

fn pack_success<T: Serialize>(value: T) -> String {
    let envelope = ResponseEnvelope::Success { success: value };
    serde_json::to_string(&envelope).unwrap_or_else(|_| r#"{"error":"encode failure"}"#.to_owned())
}

/// Render `{"error":"..."}`.
pub fn pack_error_response(message: impl Into<String>) -> String {
    let envelope: ResponseEnvelope<()> = ResponseEnvelope::Error { error: message.into() };
    serde_json::to_string(&envelope).unwrap_or_else(|_| r#"{"error":"encode failure"}"#.to_owned())
}

/// Render an outgoing event frame: `{"<topic>": body}`.
pub fn pack_event(topic: &str, body: &Value) -> String {
    let mut map = serde_json::Map::with_capacity(1);
    map.insert(topic.to_owned(), body.clone());
    serde_json::to_string(&Value::Object(map)).unwrap_or_else(|_| "{}".to_owned())
}

/// Parse the initial subscription list out of an upgrade request's raw query
/// string (§4.4, §8). Repeated `stream` keys and comma-separated values
/// within one key are both accepted and flattened into one ordered list:
/// `?stream=aaa&stream=bbb` and `?stream=aaa,bbb` both yield `["aaa","bbb"]`;
/// an absent or empty query yields `[]`.
pub fn parse_initial_streams(query: Option<&str>) -> Vec<String> {
    let Some(query) = query else { return Vec::new() };
    let mut streams = Vec::new();
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key != "stream" {
            continue;
        }
        streams.extend(value.split(',').filter(|s| !s.is_empty()).map(str::to_owned));
    }
    streams
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
