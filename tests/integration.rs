// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end WebSocket wire tests against a real in-process server: bind a
//! real `TcpListener`, drive the Hub task, and speak the subprotocol with a
//! real `tokio-tungstenite` client, mirroring the "bind port 0, spawn
//! `axum::serve`, connect with a real client" pattern used for WS auth
//! integration tests elsewhere in this corpus.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use rango_gateway::event::Event;
use rango_gateway::hub::{Hub, HubMessage};
use rango_gateway::http::build_router;
use rango_gateway::state::GatewayState;

/// Spin up a Hub task plus a real HTTP/WS listener on an ephemeral port,
/// returning the base `ws://` URL and a sender for synthesizing upstream
/// deliveries directly (bypassing AMQP, which is out of scope here).
async fn spawn_gateway() -> (String, mpsc::Sender<Event>, CancellationToken) {
    let shutdown = CancellationToken::new();
    let (command_tx, command_rx) = mpsc::channel::<HubMessage>(64);
    let (event_tx, event_rx) = mpsc::channel::<Event>(64);

    let hub = Hub::new(std::collections::HashMap::new());
    tokio::spawn(hub.run(command_rx, event_rx, shutdown.clone()));

    let state = Arc::new(GatewayState { hub: command_tx, verifier: None, shutdown: shutdown.clone() });
    let router = build_router(state, &[]);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    (format!("ws://{addr}"), event_tx, shutdown)
}

async fn recv_text(
    ws: &mut tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
) -> String {
    loop {
        match tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read error")
        {
            Message::Text(text) => return text.to_string(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

#[tokio::test]
async fn subscribe_to_public_stream_receives_echoed_subscription_list() {
    let (base, _events, _shutdown) = spawn_gateway().await;
    let (mut ws, _resp) = tokio_tungstenite::connect_async(format!("{base}/public")).await.expect("connect");

    ws.send(Message::Text(r#"{"event":"subscribe","streams":["eurusd.trades"]}"#.into()))
        .await
        .expect("send");

    let reply = recv_text(&mut ws).await;
    assert_eq!(reply, r#"{"success":{"message":"subscribed","streams":["eurusd.trades"]}}"#);
}

#[tokio::test]
async fn plaintext_ping_gets_plaintext_pong() {
    let (base, _events, _shutdown) = spawn_gateway().await;
    let (mut ws, _resp) = tokio_tungstenite::connect_async(format!("{base}/public")).await.expect("connect");

    ws.send(Message::Text("ping".into())).await.expect("send");
    let reply = recv_text(&mut ws).await;
    assert_eq!(reply, "pong");
}

#[tokio::test]
async fn malformed_json_frame_gets_in_band_error_response() {
    let (base, _events, _shutdown) = spawn_gateway().await;
    let (mut ws, _resp) = tokio_tungstenite::connect_async(format!("{base}/public")).await.expect("connect");

    ws.send(Message::Text("not json".into())).await.expect("send");
    let reply = recv_text(&mut ws).await;
    assert!(reply.starts_with(r#"{"error":"#), "unexpected reply: {reply}");
}

#[tokio::test]
async fn private_upgrade_without_jwt_is_rejected() {
    let (base, _events, _shutdown) = spawn_gateway().await;
    let result = tokio_tungstenite::connect_async(format!("{base}/private")).await;
    assert!(result.is_err(), "anonymous /private upgrade must be refused");
}

#[tokio::test]
async fn upstream_public_event_reaches_subscribed_client() {
    let (base, events, _shutdown) = spawn_gateway().await;
    let (mut ws, _resp) = tokio_tungstenite::connect_async(format!("{base}/public")).await.expect("connect");

    ws.send(Message::Text(r#"{"event":"subscribe","streams":["eurusd.trades"]}"#.into()))
        .await
        .expect("send");
    assert_eq!(
        recv_text(&mut ws).await,
        r#"{"success":{"message":"subscribed","streams":["eurusd.trades"]}}"#
    );

    let event = rango_gateway::event::parse_routing_key(
        "public.eurusd.trades",
        serde_json::json!({"price": 1}),
    )
    .expect("parses");
    events.send(event).await.expect("deliver upstream event");

    assert_eq!(recv_text(&mut ws).await, r#"{"eurusd.trades":{"price":1}}"#);
}

#[tokio::test]
async fn initial_subscription_from_query_string_is_applied_on_connect() {
    let (base, _events, _shutdown) = spawn_gateway().await;
    let (mut ws, _resp) =
        tokio_tungstenite::connect_async(format!("{base}/public?stream=eurusd.trades,eurusd.orders"))
            .await
            .expect("connect");

    let reply = recv_text(&mut ws).await;
    let parsed: serde_json::Value = serde_json::from_str(&reply).expect("valid json");
    let streams = parsed["success"]["streams"].as_array().expect("streams array");
    let streams: Vec<&str> = streams.iter().filter_map(|v| v.as_str()).collect();
    assert!(streams.contains(&"eurusd.trades"));
    assert!(streams.contains(&"eurusd.orders"));
}
