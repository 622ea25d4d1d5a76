// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration resolution: merge static configuration and relation
//! snapshots into a single authoritative "desired registration" value.
//!
//! Exactly one source governs a reconciliation pass, chosen by strict
//! priority: static configuration wins over relation data, always, and the
//! two are never merged into one credential.

use crate::config::JenkinsConfig;
use crate::credentials::Credentials;
use crate::relation::{RelationChannel, RelationSnapshot};
use serde::{Deserialize, Serialize};

/// A relation-sourced credential candidate, tagged with the channel it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationCandidate {
    pub channel: RelationChannel,
    pub credentials: Credentials,
}

/// The source governing this reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationState {
    /// Neither static configuration nor any subscribed relation.
    NoSource,
    /// Static configuration governs; relation data is not consulted.
    Static(JenkinsConfig),
    /// Relation data governs. `candidates` may be empty when a relation
    /// exists but its databag is still incomplete — that is a waiting
    /// state, not an error.
    Relation { candidates: Vec<RelationCandidate> },
}

/// Resolve the governing credential source for this pass.
///
/// `relations` holds a snapshot per currently-established relation channel;
/// `agent_name` is this unit's derived agent name (the databag key prefix
/// for the current wire format) and `local_app` this unit's application
/// name (used to skip own-application peer units).
pub fn resolve(
    config: Option<&JenkinsConfig>,
    relations: &[RelationSnapshot],
    agent_name: &str,
    local_app: &str,
) -> RegistrationState {
    if let Some(config) = config {
        return RegistrationState::Static(config.clone());
    }

    if relations.is_empty() {
        return RegistrationState::NoSource;
    }

    let mut candidates = Vec::new();
    for channel in RelationChannel::PRIORITY {
        let Some(snapshot) = relations.iter().find(|s| s.channel == channel) else {
            continue;
        };
        let Some(server) = snapshot.server_unit(local_app) else {
            continue;
        };
        if let Some(credentials) = channel.wire_format().extract(&server.databag, agent_name) {
            candidates.push(RelationCandidate { channel, credentials });
        }
    }

    RegistrationState::Relation { candidates }
}

#[cfg(test)]
#[path = "registration_tests.rs"]
mod tests;
