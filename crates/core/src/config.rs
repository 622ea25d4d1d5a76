// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static configuration: raw file contents and the validated Jenkins
//! registration config derived from them.
//!
//! The three registration fields support a colon-delimited multi-value
//! encoding so one configuration block can bulk-provision several agent
//! identities:
//!
//! ```toml
//! server_url = "http://jenkins.example.com:8080"
//! agent_name = "agent-one:agent-two"
//! agent_token = "token-one:token-two"
//! ```
//!
//! All three fields empty means "configuration not in use" (relations
//! govern instead). Anything in between is an invalid configuration, which
//! is an operator error and never silently ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw configuration file contents. Missing fields deserialize to their
/// defaults so a partially-written file still parses; validation happens
/// in [`JenkinsConfig::from_raw`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub server_url: String,
    /// Colon-delimited agent names, positionally paired with tokens.
    #[serde(default)]
    pub agent_name: String,
    /// Colon-delimited agent tokens.
    #[serde(default)]
    pub agent_token: String,
    /// Label override; host architecture is used when empty.
    #[serde(default)]
    pub agent_labels: String,
    /// Keep the committed relation credential across controller restarts.
    #[serde(default)]
    pub persist_credentials: bool,
}

impl RawConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Errors deriving a [`JenkinsConfig`] from raw configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// One or more required registration fields are unset while others are
    /// set. Field names are sorted for a stable operator-facing message.
    #[error("missing required config: {}", .0.join(" "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid server_url: {0}")]
    InvalidUrl(String),

    #[error("agent_name and agent_token counts differ: {names} names, {tokens} tokens")]
    MismatchedPairs { names: usize, tokens: usize },
}

/// Validated registration configuration from the static config file.
///
/// Pair order is preserved from the configuration: it encodes which agent
/// identity the operator prefers, and the validator probes in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JenkinsConfig {
    pub server_url: String,
    pub pairs: Vec<(String, String)>,
}

impl JenkinsConfig {
    /// Derive a validated config from raw file contents.
    ///
    /// Returns `Ok(None)` when all three registration fields are empty
    /// (configuration not in use), `Err` when the fields are partially or
    /// inconsistently set.
    pub fn from_raw(raw: &RawConfig) -> Result<Option<Self>, ConfigError> {
        if raw.server_url.is_empty() && raw.agent_name.is_empty() && raw.agent_token.is_empty() {
            return Ok(None);
        }

        let mut missing = Vec::new();
        if raw.server_url.is_empty() {
            missing.push("server_url");
        }
        if raw.agent_name.is_empty() {
            missing.push("agent_name");
        }
        if raw.agent_token.is_empty() {
            missing.push("agent_token");
        }
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(ConfigError::MissingFields(missing));
        }

        let parsed = url::Url::parse(&raw.server_url)
            .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidUrl(raw.server_url.clone()));
        }

        let names: Vec<&str> = raw.agent_name.split(':').collect();
        let tokens: Vec<&str> = raw.agent_token.split(':').collect();
        if names.len() != tokens.len() {
            return Err(ConfigError::MismatchedPairs {
                names: names.len(),
                tokens: tokens.len(),
            });
        }

        let pairs = names
            .into_iter()
            .zip(tokens)
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect();
        Ok(Some(Self { server_url: raw.server_url.trim_end_matches('/').to_string(), pairs }))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
