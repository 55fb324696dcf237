// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AMQP upstream: two consumers on the topic exchange, reconnect with
//! exponential backoff, routing-key parsing into [`Event`]s fed to the Hub
//! (§4.5.2, §7).
//!
//! Grounded on the original's single `#`-bound consumer (`pkg/upstream/amqp.go`'s
//! `Stream`), split into two non-durable auto-delete queues per §4.5.2's
//! `SkipPrivateMsg` rule: one bound to `#` and filtered to drop anything whose
//! routing key starts with `private.`, and one bound to `private.#` handling
//! only private deliveries. Splitting this way means a slow private consumer
//! never backs up public traffic and vice versa.

use std::time::Duration;

use futures_util::StreamExt;
use lapin::options::{BasicConsumeOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::event::{parse_routing_key, Event};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

fn instance_queue_names(instance: uuid::Uuid) -> (String, String) {
    (format!("rango.instance.{instance}.public"), format!("rango.instance.{instance}.private"))
}

/// Run the AMQP ingestion loop until `cancel` fires, reconnecting with
/// exponential backoff on any failure. Already-registered client
/// subscriptions are untouched by a reconnect (§5): only the upstream feed is
/// torn down and rebuilt.
pub async fn run(
    amqp_addr: String,
    exchange: String,
    events: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    let instance = uuid::Uuid::new_v4();
    let mut backoff = INITIAL_BACKOFF;

    loop {
        if cancel.is_cancelled() {
            return;
        }

        match run_once(&amqp_addr, &exchange, instance, &events, &cancel).await {
            Ok(()) => return,
            Err(err) => {
                warn!(error = %err, backoff_secs = backoff.as_secs(), "amqp connection lost, retrying");
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = next_backoff(backoff);
            }
        }
    }
}

async fn run_once(
    amqp_addr: &str,
    exchange: &str,
    instance: uuid::Uuid,
    events: &mpsc::Sender<Event>,
    cancel: &CancellationToken,
) -> Result<(), lapin::Error> {
    let conn = Connection::connect(amqp_addr, ConnectionProperties::default()).await?;
    info!(%amqp_addr, "connected to amqp");
    let channel = conn.create_channel().await?;

    let (public_queue, private_queue) = instance_queue_names(instance);

    let mut public_consumer = bind_and_consume(&channel, exchange, &public_queue, "#").await?;
    let mut private_consumer =
        bind_and_consume(&channel, exchange, &private_queue, "private.#").await?;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            Some(delivery) = public_consumer.next() => {
                let delivery = delivery?;
                if delivery.routing_key.as_str().starts_with("private.") {
                    let _ = delivery.ack(lapin::options::BasicAckOptions::default()).await;
                    continue;
                }
                dispatch(delivery, events).await;
            }
            Some(delivery) = private_consumer.next() => {
                let delivery = delivery?;
                dispatch(delivery, events).await;
            }
            else => return Ok(()),
        }
    }
}

async fn bind_and_consume(
    channel: &Channel,
    exchange: &str,
    queue: &str,
    routing_key: &str,
) -> Result<lapin::Consumer, lapin::Error> {
    channel
        .queue_declare(
            queue,
            QueueDeclareOptions { durable: false, auto_delete: true, ..Default::default() },
            FieldTable::default(),
        )
        .await?;

    channel
        .queue_bind(queue, exchange, routing_key, QueueBindOptions::default(), FieldTable::default())
        .await?;

    channel
        .basic_consume(
            queue,
            "",
            BasicConsumeOptions { no_ack: false, ..Default::default() },
            FieldTable::default(),
        )
        .await
}

async fn dispatch(delivery: lapin::message::Delivery, events: &mpsc::Sender<Event>) {
    let routing_key = delivery.routing_key.as_str().to_owned();
    let body = match serde_json::from_slice(&delivery.data) {
        Ok(body) => body,
        Err(err) => {
            warn!(%routing_key, error = %err, "dropping upstream message with invalid json body");
            let _ = delivery.ack(lapin::options::BasicAckOptions::default()).await;
            return;
        }
    };

    if let Err(err) = delivery.ack(lapin::options::BasicAckOptions::default()).await {
        error!(error = %err, "failed to ack amqp delivery");
    }

    match parse_routing_key(&routing_key, body) {
        Some(event) => {
            if events.send(event).await.is_err() {
                warn!("hub channel closed, dropping upstream event");
            }
        }
        None => warn!(%routing_key, "dropping upstream message with unexpected routing key shape"),
    }
}

/// Publish a single message to `exchange` with `routing_key` — the primitive
/// both the server's own republish path (none currently) and the
/// `inject-msg` dev tool build on (`tools/inject-msg/inject-msg.go`).
pub async fn publish(
    amqp_addr: &str,
    exchange: &str,
    routing_key: &str,
    body: &[u8],
) -> Result<(), lapin::Error> {
    let conn = Connection::connect(amqp_addr, ConnectionProperties::default()).await?;
    let channel = conn.create_channel().await?;
    channel
        .basic_publish(
            exchange,
            routing_key,
            lapin::options::BasicPublishOptions::default(),
            body,
            lapin::BasicProperties::default().with_content_type("application/json".into()),
        )
        .await?
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "amqp_tests.rs"]
mod tests;
