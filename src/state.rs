// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared server state handed to every axum handler.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::auth::Verifier;
use crate::hub::HubMessage;

pub struct GatewayState {
    pub hub: mpsc::Sender<HubMessage>,
    /// `None` when no JWT public key was configured — every connection is
    /// then anonymous and `/private` upgrades are refused (§6).
    pub verifier: Option<Arc<Verifier>>,
    pub shutdown: CancellationToken,
}
