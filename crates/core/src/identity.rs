// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity: the capacity this unit advertises to the server.
//!
//! Built once at controller startup from host introspection and an optional
//! label override, then immutable for the process lifetime.

use crate::relation::Databag;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors constructing an agent identity from host state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("no executors available on this host")]
    NoExecutors,
    #[error("unit name is empty")]
    EmptyUnitName,
    #[error("labels are empty")]
    EmptyLabels,
}

/// The Jenkins agent identity advertised on relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Number of executors available on the unit.
    pub executors: u32,
    /// Comma-separated labels to assign to the agent.
    pub labels: String,
    /// Stable agent name, derived from the unit identity.
    pub name: String,
}

impl AgentIdentity {
    /// Build an identity from explicit parts.
    ///
    /// The agent name is the unit name (`app/N`) with `/` replaced by `-`
    /// so it is valid as a node name and as a databag key prefix.
    pub fn new(
        executors: u32,
        labels: impl Into<String>,
        unit_name: &str,
    ) -> Result<Self, IdentityError> {
        if executors == 0 {
            return Err(IdentityError::NoExecutors);
        }
        if unit_name.is_empty() {
            return Err(IdentityError::EmptyUnitName);
        }
        let labels = labels.into();
        if labels.is_empty() {
            return Err(IdentityError::EmptyLabels);
        }
        Ok(Self { executors, labels, name: unit_name.replace('/', "-") })
    }

    /// Build an identity from host introspection: executor count from the
    /// CPU count, labels from the override or the host architecture.
    pub fn from_host(
        unit_name: &str,
        label_override: Option<&str>,
    ) -> Result<Self, IdentityError> {
        let executors =
            std::thread::available_parallelism().map(|n| n.get() as u32).unwrap_or(0);
        let labels = match label_override.filter(|l| !l.is_empty()) {
            Some(labels) => labels.to_string(),
            None => std::env::consts::ARCH.to_string(),
        };
        Self::new(executors, labels, unit_name)
    }

    /// Databag published on the legacy channel (`executors`, `labels`,
    /// `slavehost`).
    pub fn legacy_databag(&self) -> Databag {
        let mut bag = Databag::new();
        bag.insert("executors".into(), self.executors.to_string());
        bag.insert("labels".into(), self.labels.clone());
        bag.insert("slavehost".into(), self.name.clone());
        bag
    }

    /// Databag published on the current channel (`executors`, `labels`,
    /// `name`).
    pub fn current_databag(&self) -> Databag {
        let mut bag = Databag::new();
        bag.insert("executors".into(), self.executors.to_string());
        bag.insert("labels".into(), self.labels.clone());
        bag.insert("name".into(), self.name.clone());
        bag
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
