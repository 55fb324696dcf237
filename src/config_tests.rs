// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn base_config() -> GatewayConfig {
    GatewayConfig {
        ws_addr: "0.0.0.0:8080".to_owned(),
        amqp_addr: "amqp://localhost:5672".to_owned(),
        pub_key: "config/rsa-key.pub".to_owned(),
        jwt_public_key: None,
        exchange: "peatio.events.ranger".to_owned(),
        metrics_addr: "0.0.0.0:4242".to_owned(),
        cors_origins: String::new(),
    }
}

#[test]
fn cors_origin_list_splits_and_trims() {
    let mut cfg = base_config();
    cfg.cors_origins = "https://a.example, https://b.example".to_owned();
    assert_eq!(cfg.cors_origin_list(), vec!["https://a.example", "https://b.example"]);
}

#[test]
fn cors_origin_list_empty_when_unset() {
    let cfg = base_config();
    assert!(cfg.cors_origin_list().is_empty());
}

#[test]
fn explicit_amqp_addr_overrides_default() {
    let mut cfg = base_config();
    cfg.amqp_addr = "amqp://broker:5672".to_owned();
    assert_eq!(cfg.effective_amqp_addr(), "amqp://broker:5672");
}

#[test]
fn explicit_ws_addr_overrides_default() {
    let mut cfg = base_config();
    cfg.ws_addr = "127.0.0.1:9000".to_owned();
    assert_eq!(cfg.effective_ws_addr(), "127.0.0.1:9000");
}
