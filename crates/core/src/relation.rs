// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relation channels and databag snapshots.
//!
//! A relation is a key-value channel between this unit and a peer
//! application. Two channels exist for historical reasons: the legacy
//! one-to-one `slave` relation and the current many-to-one `agent`
//! relation. The dispatch boundary delivers the remote side's databags as
//! part of each relation event; the core only ever sees these snapshots.

use crate::credentials::WireFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relation databag contents: opaque string keys and values.
pub type Databag = BTreeMap<String, String>;

/// The two relation channels an agent unit subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationChannel {
    /// One-to-one `slave` relation, shared-secret wire format.
    Legacy,
    /// Many-to-one `agent` relation, per-unit keyed wire format.
    Current,
}

impl RelationChannel {
    /// Channels in resolution priority order. The current channel is tried
    /// first so a server offering both interfaces hands out per-unit
    /// secrets rather than the shared one.
    pub const PRIORITY: [RelationChannel; 2] = [RelationChannel::Current, RelationChannel::Legacy];

    /// Relation name as declared in unit metadata.
    pub fn relation_name(&self) -> &'static str {
        match self {
            RelationChannel::Legacy => "slave",
            RelationChannel::Current => "agent",
        }
    }

    /// Wire format used for credentials arriving on this channel.
    pub fn wire_format(&self) -> WireFormat {
        match self {
            RelationChannel::Legacy => WireFormat::Legacy,
            RelationChannel::Current => WireFormat::Current,
        }
    }
}

impl std::fmt::Display for RelationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.relation_name())
    }
}

/// One remote unit's view in a relation: its unit name (`app/N`) and the
/// databag it published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationUnit {
    pub unit: String,
    #[serde(default)]
    pub databag: Databag,
}

impl RelationUnit {
    /// Application name portion of the unit name.
    pub fn app(&self) -> &str {
        self.unit.split('/').next().unwrap_or(&self.unit)
    }
}

/// Snapshot of one relation channel at event time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSnapshot {
    pub channel: RelationChannel,
    #[serde(default)]
    pub units: Vec<RelationUnit>,
}

impl RelationSnapshot {
    pub fn new(channel: RelationChannel) -> Self {
        Self { channel, units: Vec::new() }
    }

    /// Locate the server unit in this relation: the first remote unit that
    /// belongs to a different application. Peer units of our own
    /// application also appear in the relation and are never the server.
    pub fn server_unit(&self, local_app: &str) -> Option<&RelationUnit> {
        self.units.iter().find(|u| u.app() != local_app)
    }
}

#[cfg(test)]
#[path = "relation_tests.rs"]
mod tests;
