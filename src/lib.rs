// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rango-gateway: a stream-multiplexing WebSocket gateway bridging an
//! upstream AMQP topic exchange to many concurrent WebSocket subscribers.

pub mod amqp;
pub mod auth;
pub mod config;
pub mod error;
pub mod event;
pub mod http;
pub mod hub;
pub mod incremental;
pub mod metrics;
pub mod session;
pub mod state;
pub mod topic;
pub mod wire;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::auth::Verifier;
use crate::config::GatewayConfig;
use crate::hub::{Hub, HubMessage};
use crate::state::GatewayState;

/// Channel depth for the Hub's client-request and upstream-delivery inputs.
/// Generous relative to `Session::OUTBOUND_CAPACITY` since these carry
/// requests/events, not rendered frames, and briefly absorb bursts while the
/// Hub's single task works through its `select!` loop.
const HUB_CHANNEL_CAPACITY: usize = 1024;

/// Wire the Hub, the AMQP consumer pair, and the HTTP/WS server together and
/// run until `SIGINT`/`SIGTERM`, mirroring the teacher's `coop_mux::run`.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();

    let verifier = load_verifier(&config)?;
    let rbac = GatewayConfig::load_rbac();

    let (command_tx, command_rx) = mpsc::channel::<HubMessage>(HUB_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(HUB_CHANNEL_CAPACITY);

    let hub = Hub::new(rbac);
    let hub_cancel = shutdown.clone();
    let hub_task = tokio::spawn(hub.run(command_rx, event_rx, hub_cancel));

    let amqp_cancel = shutdown.clone();
    let amqp_addr = config.effective_amqp_addr();
    let exchange = config.exchange.clone();
    let amqp_task = tokio::spawn(amqp::run(amqp_addr, exchange, event_tx, amqp_cancel));

    if let Err(err) = metrics::install(config.metrics_addr.parse()?) {
        tracing::warn!(error = %err, "failed to install prometheus exporter");
    }

    let state = Arc::new(GatewayState { hub: command_tx, verifier, shutdown: shutdown.clone() });
    let router = http::build_router(state, &config.cors_origin_list());

    let ws_addr = config.effective_ws_addr();
    let listener = TcpListener::bind(&ws_addr).await?;
    tracing::info!(%ws_addr, "rango-gateway listening");

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received");
        signal_shutdown.cancel();
    });

    let server_shutdown = shutdown.clone();
    axum::serve(listener, router).with_graceful_shutdown(async move {
        server_shutdown.cancelled().await;
    }).await?;

    shutdown.cancel();
    let _ = hub_task.await;
    let _ = amqp_task.await;
    Ok(())
}

/// Load the RS256 verifier from `--jwt-public-key`/`JWT_PUBLIC_KEY` (base64
/// PEM) if set, else from the `--pub-key` file path, else `None` (every
/// connection anonymous, `/private` refused).
fn load_verifier(config: &GatewayConfig) -> anyhow::Result<Option<Arc<Verifier>>> {
    if let Some(encoded) = &config.jwt_public_key {
        return Ok(Some(Arc::new(Verifier::from_base64_pem(encoded)?)));
    }
    match std::fs::read(&config.pub_key) {
        Ok(pem) => Ok(Some(Arc::new(Verifier::from_pem(&pem)?))),
        Err(_) => {
            tracing::warn!("no jwt public key configured; all connections will be anonymous");
            Ok(None)
        }
    }
}
