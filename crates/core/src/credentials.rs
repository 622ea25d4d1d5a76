// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration credentials and their relation wire formats.
//!
//! Credentials arrive over a relation databag in one of two historical
//! encodings, modeled as a closed [`WireFormat`] enum selected by relation
//! channel:
//!
//! ```text
//! Legacy  — keys `url`, `secret`              (one secret shared by the
//!                                              whole relation, claimed
//!                                              first-come-first-served)
//! Current — keys `url`, `{agent_name}_secret` (a secret addressed to this
//!                                              specific unit)
//! ```
//!
//! Both keys must be present and non-empty to yield a value; anything less
//! is "no credentials yet", never an error and never a partial value.

use crate::relation::Databag;
use serde::{Deserialize, Serialize};

/// A (server address, secret) pair used to register with the Jenkins
/// server. Compared by structural equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The Jenkins server address to register to.
    pub server_url: String,
    /// The secret used to register the agent.
    pub secret: String,
}

impl Credentials {
    pub fn new(server_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { server_url: server_url.into(), secret: secret.into() }
    }
}

/// The closed set of databag encodings for relation-sourced credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// Shared-secret form: `url` + `secret`.
    Legacy,
    /// Per-unit keyed form: `url` + `{agent_name}_secret`.
    Current,
}

impl WireFormat {
    /// Extract credentials from a server unit's databag.
    ///
    /// Returns `None` when either required key is missing or empty.
    pub fn extract(&self, databag: &Databag, agent_name: &str) -> Option<Credentials> {
        let url = non_empty(databag.get("url"))?;
        let secret = match self {
            WireFormat::Legacy => non_empty(databag.get("secret"))?,
            WireFormat::Current => {
                non_empty(databag.get(&format!("{agent_name}_secret")))?
            }
        };
        Some(Credentials { server_url: url.to_string(), secret: secret.to_string() })
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
