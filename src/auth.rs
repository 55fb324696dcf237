// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RS256 JWT validation and RSA public-key loading (§6).
//!
//! Connections carry a `Authorization: Bearer <jwt>` header. A validated
//! token's `uid`/`role` claims become the session's [`Identity`]; a missing
//! or absent header is not an error here, it simply yields an anonymous
//! identity — streams that require one (private, prefixed) reject it later
//! at the Hub.

use std::fmt;

use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::session::Identity;

/// Claims this gateway cares about; other claims issued by the identity
/// provider (`email`, `level`, `state`, ...) are accepted but ignored.
#[derive(Debug, Deserialize)]
struct Claims {
    uid: Option<String>,
    role: Option<String>,
}

#[derive(Debug)]
pub enum AuthError {
    MissingBearerPrefix,
    InvalidToken(jsonwebtoken::errors::Error),
    InvalidKey(jsonwebtoken::errors::Error),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBearerPrefix => write!(f, "authorization header is not a Bearer token"),
            Self::InvalidToken(e) => write!(f, "invalid token: {e}"),
            Self::InvalidKey(e) => write!(f, "invalid public key: {e}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Holds the RS256 public key used to validate incoming tokens.
pub struct Verifier {
    key: DecodingKey,
    validation: Validation,
}

impl Verifier {
    /// Build a verifier from a PEM-encoded RSA public key.
    pub fn from_pem(pem: &[u8]) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem).map_err(AuthError::InvalidKey)?;
        let mut validation = Validation::new(Algorithm::RS256);
        // Claims, issuer, and audience vary by deployment; this gateway only
        // needs a valid signature and an unexpired token.
        validation.validate_aud = false;
        Ok(Self { key, validation })
    }

    /// Build a verifier from a base64-encoded PEM, as shipped via the
    /// `JWT_PUBLIC_KEY` environment variable.
    pub fn from_base64_pem(encoded: &str) -> Result<Self, AuthError> {
        let pem = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| AuthError::InvalidKey(jsonwebtoken::errors::ErrorKind::Base64(e).into()))?;
        Self::from_pem(&pem)
    }

    /// Validate `token`'s signature and expiry, returning the session
    /// identity derived from its `uid`/`role` claims.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)
            .map_err(AuthError::InvalidToken)?;
        Ok(Identity { uid: data.claims.uid, role: data.claims.role })
    }
}

/// Extract the bearer token from an `Authorization` header, if present.
/// A missing header is not an error — it yields `Ok(None)`.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AuthError> {
    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else { return Ok(None) };
    let value = value.to_str().map_err(|_| AuthError::MissingBearerPrefix)?;
    let token = value.strip_prefix("Bearer ").ok_or(AuthError::MissingBearerPrefix)?;
    Ok(Some(token))
}

/// Resolve a connection's identity from its headers: verify a Bearer token
/// if present, otherwise anonymous.
pub fn identify(headers: &HeaderMap, verifier: &Verifier) -> Result<Identity, AuthError> {
    match bearer_token(headers)? {
        Some(token) => verifier.verify(token),
        None => Ok(Identity::anonymous()),
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
