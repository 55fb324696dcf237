// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prometheus metrics (§6, ambient). Gauge names and semantics are carried
//! over from `pkg/metrics/metrics.go`; the exporter itself comes from the
//! `metrics`/`metrics-exporter-prometheus` crates rather than
//! `prometheus`/`promauto`, matching this corpus's idiom for process metrics.

use std::net::SocketAddr;

use metrics::{describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

const HUB_CLIENTS_COUNT: &str = "rango_hub_clients_count";
const HUB_SUBSCRIPTIONS_COUNT: &str = "rango_hub_subscriptions_count";

/// Install the Prometheus recorder and start its `/metrics` HTTP listener.
pub fn install(addr: SocketAddr) -> anyhow::Result<()> {
    describe_gauge!(HUB_CLIENTS_COUNT, "Number of clients currently connected");
    describe_gauge!(HUB_SUBSCRIPTIONS_COUNT, "Number of users subscribed to a topic");

    PrometheusBuilder::new().with_http_listener(addr).install()?;
    Ok(())
}

pub fn record_client_connected() {
    gauge!(HUB_CLIENTS_COUNT).increment(1.0);
}

pub fn record_client_disconnected() {
    gauge!(HUB_CLIENTS_COUNT).decrement(1.0);
}

/// `kind` is one of `"public"`, `"private"`, `"prefixed"`.
pub fn record_subscribed(kind: &'static str, topic: &str) {
    gauge!(HUB_SUBSCRIPTIONS_COUNT, "type" => kind, "topic" => topic.to_owned()).increment(1.0);
}

pub fn record_unsubscribed(kind: &'static str, topic: &str) {
    gauge!(HUB_SUBSCRIPTIONS_COUNT, "type" => kind, "topic" => topic.to_owned()).decrement(1.0);
}
