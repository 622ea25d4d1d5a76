// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events delivered by the dispatch boundary.
//!
//! Serializes with `{"type": "relation:changed", ...fields}` format, one
//! JSON object per line on the event socket. Relation events carry the
//! remote side's databag snapshot so the core never reads relation state
//! itself.

use crate::relation::{RelationChannel, RelationUnit};
use serde::{Deserialize, Serialize};

/// Events that drive the controller state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "start")]
    Start,

    #[serde(rename = "config:changed")]
    ConfigChanged,

    #[serde(rename = "upgrade")]
    Upgrade,

    #[serde(rename = "relation:joined")]
    RelationJoined { channel: RelationChannel },

    /// Relation databag changed; `units` is the full remote-unit snapshot
    /// for the channel at delivery time.
    #[serde(rename = "relation:changed")]
    RelationChanged { channel: RelationChannel, units: Vec<RelationUnit> },

    #[serde(rename = "relation:departed")]
    RelationDeparted { channel: RelationChannel },

    #[serde(rename = "system:shutdown")]
    Shutdown,
}

impl Event {
    /// Short name for log spans.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::ConfigChanged => "config_changed",
            Event::Upgrade => "upgrade",
            Event::RelationJoined { .. } => "relation_joined",
            Event::RelationChanged { .. } => "relation_changed",
            Event::RelationDeparted { .. } => "relation_departed",
            Event::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
