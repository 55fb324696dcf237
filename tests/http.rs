// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP-surface integration tests using `axum_test::TestServer` (no real TCP
//! needed) — the healthcheck endpoint and the `/private` auth gate (§6, §7).

use std::collections::HashMap;
use std::sync::Arc;

use axum_test::TestServer;
use tokio_util::sync::CancellationToken;

use rango_gateway::http::build_router;
use rango_gateway::hub::{Hub, HubMessage};
use rango_gateway::state::GatewayState;

fn test_server() -> TestServer {
    let (command_tx, command_rx) = tokio::sync::mpsc::channel::<HubMessage>(16);
    let (_event_tx, event_rx) = tokio::sync::mpsc::channel(16);
    let shutdown = CancellationToken::new();

    let hub = Hub::new(HashMap::new());
    tokio::spawn(hub.run(command_rx, event_rx, shutdown.clone()));

    let state = Arc::new(GatewayState { hub: command_tx, verifier: None, shutdown });
    let router = build_router(state, &[]);
    TestServer::new(router).expect("failed to create test server")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let server = test_server();
    let resp = server.get("/healthz").await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn root_and_public_routes_exist_and_reject_non_upgrade_requests() {
    // Neither route performs a real WS handshake here, so axum's
    // `WebSocketUpgrade` extractor itself rejects the plain GET before our
    // auth logic runs (§6) — this just pins that both paths are wired up to
    // the same upgrade handler. The full upgrade + auth-gate behavior is
    // exercised against a real socket in `tests/integration.rs`.
    let server = test_server();
    for path in ["/", "/public"] {
        let resp = server.get(path).await;
        assert!(!resp.status_code().is_success(), "{path} unexpectedly succeeded without an upgrade");
    }
}
