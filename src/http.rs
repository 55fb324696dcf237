// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport: `/public`, `/private`, `/`, and `/healthz`
//! (§6).
//!
//! `/private` requires a valid Bearer JWT and refuses the upgrade otherwise;
//! `/public` and `/` both accept anonymous connections, attaching whatever
//! identity a valid token carries when one is present. This mirrors the
//! original's `authHandler(..., mustAuth)` wrapper around a single connection
//! constructor.
//!
//! A bare `"ping"` text frame gets a bare `"pong"` text frame back, outside
//! the JSON envelope, matching the original client's plaintext heartbeat
//! convention alongside the regular WS ping/pong control frames.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{RawQuery, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::debug;

use crate::auth;
use crate::error::GatewayError;
use crate::hub::HubMessage;
use crate::session::Session;
use crate::state::GatewayState;
use crate::wire::{decode_request, pack_error_response, parse_initial_streams, ClientRequest, RequestMethod};

/// Read-limit / keepalive constants lifted verbatim from the original
/// client's Gorilla WS setup (§3, §4.4).
const MAX_MESSAGE_SIZE: usize = 512;
const WRITE_DEADLINE: Duration = Duration::from_secs(10);
const PONG_DEADLINE: Duration = Duration::from_secs(60);
const PING_PERIOD: Duration = Duration::from_secs(54);

pub fn build_router(state: Arc<GatewayState>, cors_origins: &[String]) -> Router {
    let cors = if cors_origins.is_empty() {
        CorsLayer::new()
    } else {
        let origins: Vec<_> =
            cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/healthz", get(health))
        .route("/private", get(private_ws))
        .route("/public", get(public_ws))
        .route("/", get(public_ws))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

async fn private_ws(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    ws: WebSocketUpgrade,
) -> axum::response::Response {
    upgrade(state, headers, query, ws, true).await
}

async fn public_ws(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    ws: WebSocketUpgrade,
) -> axum::response::Response {
    upgrade(state, headers, query, ws, false).await
}

async fn upgrade(
    state: Arc<GatewayState>,
    headers: HeaderMap,
    query: Option<String>,
    ws: WebSocketUpgrade,
    require_auth: bool,
) -> axum::response::Response {
    let identity = match &state.verifier {
        Some(verifier) => match auth::identify(&headers, verifier) {
            Ok(identity) => identity,
            Err(err) => {
                if require_auth {
                    return GatewayError::Unauthorized.to_http_response(err.to_string()).into_response();
                }
                crate::session::Identity::anonymous()
            }
        },
        None => crate::session::Identity::anonymous(),
    };

    if require_auth && identity.is_anonymous() {
        return GatewayError::Unauthorized.to_http_response("authentication required").into_response();
    }

    let initial_streams = parse_initial_streams(query.as_deref());

    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_connection(socket, state, identity, initial_streams))
}

async fn handle_connection(
    socket: WebSocket,
    state: Arc<GatewayState>,
    identity: crate::session::Identity,
    initial_streams: Vec<String>,
) {
    let (session, mut outbound_rx) = Session::new(identity);
    let client_id = session.id;
    let cancel = session.cancel_token();

    if state.hub.send(HubMessage::Register(Arc::clone(&session))).await.is_err() {
        return;
    }

    if !initial_streams.is_empty() {
        let request = ClientRequest { method: RequestMethod::Subscribe, streams: initial_streams };
        if state.hub.send(HubMessage::Request { client: client_id, request }).await.is_err() {
            return;
        }
    }

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut ping_interval = tokio::time::interval(PING_PERIOD);
    ping_interval.tick().await;
    let mut pong_deadline = Box::pin(tokio::time::sleep(PONG_DEADLINE));

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = state.shutdown.cancelled() => break,
            _ = &mut pong_deadline => {
                debug!(client_id, "pong deadline exceeded, closing connection");
                break;
            }
            _ = ping_interval.tick() => {
                if tokio::time::timeout(WRITE_DEADLINE, ws_tx.send(Message::Ping(Vec::new().into()))).await.is_err() {
                    break;
                }
            }
            outgoing = outbound_rx.recv() => {
                match outgoing {
                    Some(frame) => {
                        if tokio::time::timeout(WRITE_DEADLINE, ws_tx.send(Message::Text(frame.to_string().into()))).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let trimmed = text.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        if trimmed == "ping" {
                            if ws_tx.send(Message::Text("pong".into())).await.is_err() {
                                break;
                            }
                            continue;
                        }
                        match decode_request(trimmed) {
                            Ok(request) => {
                                if state
                                    .hub
                                    .send(HubMessage::Request { client: client_id, request })
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            Err(err) => {
                                session.send(Arc::from(pack_error_response(err.to_string())));
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        pong_deadline.as_mut().reset(tokio::time::Instant::now() + PONG_DEADLINE);
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if ws_tx.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Binary(_))) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    let _ = state.hub.send(HubMessage::Unregister(client_id)).await;
}
