// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Development tool: forge an RS256 JWT against a local private key, for
//! exercising `/public` and `/private` without a real identity provider.
//! Grounded on `original_source/tools/jwt/jwt.go` and `pkg/auth/jwt.go`'s
//! `ForgeToken`; out of scope for core correctness review (§1, §6).

use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

#[derive(Debug, Parser)]
struct Args {
    /// Path to the RS256 private key (PEM) to sign with.
    #[arg(long, default_value = "config/rsa-key")]
    key: String,

    #[arg(long, default_value = "IDABC0000001")]
    uid: String,

    #[arg(long, default_value = "admin@barong.io")]
    email: String,

    #[arg(long, default_value = "admin")]
    role: String,

    #[arg(long, default_value_t = 3)]
    level: i64,

    /// Token lifetime in seconds.
    #[arg(long, default_value_t = 3600)]
    ttl: u64,
}

#[derive(Debug, Serialize)]
struct Claims {
    iat: u64,
    jti: String,
    exp: u64,
    sub: &'static str,
    iss: &'static str,
    aud: [&'static str; 2],
    uid: String,
    email: String,
    role: String,
    level: i64,
    state: &'static str,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let pem = std::fs::read(&args.key)
        .map_err(|e| anyhow::anyhow!("reading private key {}: {e}", args.key))?;
    let key = EncodingKey::from_rsa_pem(&pem)?;

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let claims = Claims {
        iat: now,
        jti: now.to_string(),
        exp: now + args.ttl,
        sub: "session",
        iss: "barong",
        aud: ["peatio", "barong"],
        uid: args.uid,
        email: args.email,
        role: args.role,
        level: args.level,
        state: "active",
    };

    let token = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)?;
    println!("{token}");
    Ok(())
}
