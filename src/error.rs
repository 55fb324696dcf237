// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Error codes surfaced to HTTP/WS clients of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayError {
    Unauthorized,
    BadRequest,
    Internal,
}

impl GatewayError {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest => "BAD_REQUEST",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_http_response(&self, message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
        (self.http_status(), Json(ErrorBody { code: self.as_str().to_owned(), message: message.into() }))
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Errors from decoding a client request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    InvalidJson(String),
    UnknownEvent(String),
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(e) => write!(f, "invalid request: {e}"),
            Self::UnknownEvent(e) => write!(f, "unknown event: {e}"),
        }
    }
}

impl std::error::Error for WireError {}

/// Errors from the incremental-object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncrementalError {
    NoSnapshotYet(String),
}

impl fmt::Display for IncrementalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSnapshotYet(topic) => write!(f, "no snapshot yet for {topic}"),
        }
    }
}

impl std::error::Error for IncrementalError {}
