// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relation observation state: per-channel registration state machine and
//! the current relation snapshots.
//!
//! ```text
//! Idle → AwaitingCredentials → Validating → Registered
//!                  ↑__________________|          |
//!                  (rejection)                Departed
//! ```
//!
//! Transitions are driven by the [`Controller`](crate::Controller); this
//! module owns the bookkeeping so every transition is explicit and
//! inspectable in tests.

use jac_core::{RelationChannel, RelationSnapshot, RelationUnit, UnitStatus};
use std::collections::BTreeMap;

/// Per-channel registration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Idle,
    /// Relation established, waiting for the server to provision a secret.
    AwaitingCredentials,
    /// A candidate credential is being probed.
    Validating,
    /// Service reconciled with a credential from this channel.
    Registered,
    /// Peer departed; terminal until the relation is re-established.
    Departed,
}

/// How an event handler left the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Handled to completion (including expected holds like waiting).
    Handled,
    /// Environment not ready; the event must be redelivered later.
    Deferred,
}

/// Result of one event pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub disposition: Disposition,
    /// Status to surface; `None` leaves the current status in place.
    pub status: Option<UnitStatus>,
}

impl Outcome {
    pub fn handled() -> Self {
        Self { disposition: Disposition::Handled, status: None }
    }

    pub fn handled_with(status: UnitStatus) -> Self {
        Self { disposition: Disposition::Handled, status: Some(status) }
    }

    pub fn deferred() -> Self {
        Self { disposition: Disposition::Deferred, status: None }
    }
}

/// Relation world as observed from delivered events.
#[derive(Debug, Default)]
pub struct RelationObserver {
    states: BTreeMap<RelationChannel, ChannelState>,
    snapshots: BTreeMap<RelationChannel, RelationSnapshot>,
}

impl RelationObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, channel: RelationChannel) -> ChannelState {
        self.states.get(&channel).copied().unwrap_or_default()
    }

    pub fn set_state(&mut self, channel: RelationChannel, state: ChannelState) {
        self.states.insert(channel, state);
    }

    /// Record a joined relation (empty snapshot until data arrives).
    pub fn relation_joined(&mut self, channel: RelationChannel) {
        self.snapshots.entry(channel).or_insert_with(|| RelationSnapshot::new(channel));
    }

    /// Record the latest databag snapshot for a channel.
    pub fn relation_changed(&mut self, channel: RelationChannel, units: Vec<RelationUnit>) {
        self.snapshots.insert(channel, RelationSnapshot { channel, units });
    }

    /// Drop a departed relation's snapshot.
    pub fn relation_departed(&mut self, channel: RelationChannel) {
        self.snapshots.remove(&channel);
    }

    /// Snapshots of all currently-established relations.
    pub fn snapshots(&self) -> Vec<RelationSnapshot> {
        self.snapshots.values().cloned().collect()
    }

    /// Whether any relation is currently established.
    pub fn has_relations(&self) -> bool {
        !self.snapshots.is_empty()
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
