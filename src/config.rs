// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

/// Configuration for the rango-gateway process.
#[derive(Debug, Clone, clap::Parser)]
pub struct GatewayConfig {
    /// WebSocket/HTTP listen address.
    #[arg(long = "ws-addr", default_value = "0.0.0.0:8080", env = "WS_ADDR")]
    pub ws_addr: String,

    /// AMQP broker address.
    #[arg(
        long = "amqp-addr",
        default_value = "amqp://localhost:5672",
        env = "AMQP_ADDR"
    )]
    pub amqp_addr: String,

    /// Path to the RSA public key used to validate client JWTs.
    #[arg(long = "pub-key", default_value = "config/rsa-key.pub", env = "JWT_PUBLIC_KEY_PATH")]
    pub pub_key: String,

    /// Base64-encoded PEM of the RSA public key. Takes priority over `--pub-key` when set.
    #[arg(long, env = "JWT_PUBLIC_KEY")]
    pub jwt_public_key: Option<String>,

    /// Upstream topic exchange name.
    #[arg(long = "exchange", default_value = "peatio.events.ranger", env = "EXCHANGE")]
    pub exchange: String,

    /// Metrics listener address (separate from the WS/HTTP listener).
    #[arg(long = "metrics-addr", default_value = "0.0.0.0:4242", env = "METRICS_ADDR")]
    pub metrics_addr: String,

    /// Comma-separated list of allowed CORS origins. Empty disables the allow-list
    /// (all origins rejected except same-origin).
    #[arg(long, env = "API_CORS_ORIGINS", default_value = "")]
    pub cors_origins: String,
}

impl GatewayConfig {
    /// Parse the `RANGO_RBAC_<PREFIX>=role1,role2,...` family of env vars into the
    /// prefix -> allowed-roles table consulted by prefixed-stream subscribes.
    pub fn load_rbac() -> HashMap<String, Vec<String>> {
        let mut rbac = HashMap::new();
        for (key, value) in std::env::vars() {
            let Some(prefix) = key.strip_prefix("RANGO_RBAC_") else { continue };
            if prefix.is_empty() {
                continue;
            }
            let roles: Vec<String> =
                value.split(',').map(|r| r.trim().to_owned()).filter(|r| !r.is_empty()).collect();
            rbac.insert(prefix.to_lowercase(), roles);
        }
        rbac
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins.split(',').map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()).collect()
    }

    /// Resolve the effective AMQP address: `--amqp-addr`/`AMQP_ADDR` wins if set away
    /// from its default, otherwise fall back to assembling one from the discrete
    /// `RABBITMQ_{USER,PASSWORD,HOST,PORT}` variables, matching the upstream broker's
    /// own convention for environment-driven deployments.
    pub fn effective_amqp_addr(&self) -> String {
        if self.amqp_addr != "amqp://localhost:5672" {
            return self.amqp_addr.clone();
        }
        let host = std::env::var("RABBITMQ_HOST").ok();
        let Some(host) = host else { return self.amqp_addr.clone() };
        let user = std::env::var("RABBITMQ_USER").unwrap_or_else(|_| "guest".to_owned());
        let password = std::env::var("RABBITMQ_PASSWORD").unwrap_or_else(|_| "guest".to_owned());
        let port = std::env::var("RABBITMQ_PORT").unwrap_or_else(|_| "5672".to_owned());
        format!("amqp://{user}:{password}@{host}:{port}")
    }

    /// Resolve the effective WS listen address, preferring `RANGER_{HOST,PORT}` over
    /// the `--ws-addr` default when present.
    pub fn effective_ws_addr(&self) -> String {
        if self.ws_addr != "0.0.0.0:8080" {
            return self.ws_addr.clone();
        }
        let host = std::env::var("RANGER_HOST").ok();
        let Some(host) = host else { return self.ws_addr.clone() };
        let port = std::env::var("RANGER_PORT").unwrap_or_else(|_| "8080".to_owned());
        format!("{host}:{port}")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
