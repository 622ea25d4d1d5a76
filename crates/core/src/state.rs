// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted controller state.
//!
//! An explicit, versioned value passed into and returned from each
//! reconciliation pass and written to disk by the controller between
//! events. Scoped to the currently committed credential only — never a
//! history of every credential seen.

use serde::{Deserialize, Serialize};

/// The credential the service layer was last reconciled with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedCredential {
    pub server_url: String,
    pub agent_name: String,
    pub secret: String,
}

/// On-disk controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerState {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed: Option<CommittedCredential>,
}

impl ControllerState {
    pub const VERSION: u32 = 1;

    pub fn commit(&mut self, server_url: &str, agent_name: &str, secret: &str) {
        self.committed = Some(CommittedCredential {
            server_url: server_url.to_string(),
            agent_name: agent_name.to_string(),
            secret: secret.to_string(),
        });
    }

    pub fn clear(&mut self) {
        self.committed = None;
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self { version: Self::VERSION, committed: None }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
