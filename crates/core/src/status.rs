// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Externally visible unit status.
//!
//! The status message always names the specific missing or failed
//! precondition; raw collaborator error text stays in the logs.

use serde::{Deserialize, Serialize};

/// Status surfaced to the operator after every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum UnitStatus {
    /// Agent registered and service running.
    Active,
    /// Expected transient hold (e.g. incomplete relation data).
    Waiting(String),
    /// Needs external input to make progress.
    Blocked(String),
    /// Transient, during a registration step.
    Maintenance(String),
}

impl UnitStatus {
    pub fn waiting(reason: impl Into<String>) -> Self {
        UnitStatus::Waiting(reason.into())
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        UnitStatus::Blocked(reason.into())
    }

    pub fn maintenance(reason: impl Into<String>) -> Self {
        UnitStatus::Maintenance(reason.into())
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitStatus::Active => write!(f, "active"),
            UnitStatus::Waiting(reason) => write!(f, "waiting: {reason}"),
            UnitStatus::Blocked(reason) => write!(f, "blocked: {reason}"),
            UnitStatus::Maintenance(reason) => write!(f, "maintenance: {reason}"),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
