// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Development tool: replay `msg.txt` (one `<routing.key> <json-body>` pair
//! per line) onto the configured AMQP exchange, looping forever with a
//! configurable delay between passes. Grounded on
//! `original_source/tools/inject-msg/inject-msg.go`; out of scope for core
//! correctness review (§1, §6).

use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

#[derive(Debug, Parser)]
struct Args {
    #[arg(long = "exchange", default_value = "peatio.events.ranger")]
    exchange: String,

    #[arg(long = "amqp-addr", default_value = "amqp://localhost:5672")]
    amqp_addr: String,

    /// Seconds to wait between batches.
    #[arg(long, default_value_t = 2)]
    wait: u64,

    /// Path to the file of `<routing.key> <json-body>` lines to replay.
    #[arg(long, default_value = "msg.txt")]
    file: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    loop {
        let contents = std::fs::read_to_string(&args.file)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", args.file))?;

        for line in contents.lines() {
            let Some((routing_key, body)) = line.split_once(' ') else { continue };
            match rango_gateway::amqp::publish(
                &args.amqp_addr,
                &args.exchange,
                routing_key,
                body.as_bytes(),
            )
            .await
            {
                Ok(()) => info!(routing_key, body, "pushed"),
                Err(err) => warn!(routing_key, error = %err, "push failed"),
            }
        }

        info!(wait_secs = args.wait, "waiting before next pass");
        tokio::time::sleep(Duration::from_secs(args.wait)).await;
    }
}
