// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The desired workload service declaration.
//!
//! A [`ServiceLayer`] is derived, never stored: the reconciler recomputes
//! it on every pass and compares it structurally against the layer the
//! supervisor currently holds to decide whether a restart is needed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the agent service and its layer label in the supervisor.
pub const SERVICE_NAME: &str = "jenkins-agent";

/// Working directory of the agent process inside the workload.
pub const WORKDIR: &str = "/var/lib/jenkins";

/// Install path of the agent client executable.
pub const AGENT_JAR_PATH: &str = "/var/lib/jenkins/agent.jar";

/// Readiness marker written by the agent process once connected.
pub const READY_PATH: &str = "/var/lib/jenkins/agents/.ready";

/// Entrypoint script the service runs.
pub const ENTRYPOINT_PATH: &str = "/var/lib/jenkins/entrypoint.sh";

/// User and group the agent process runs as.
pub const USER: &str = "jenkins";
pub const GROUP: &str = "jenkins";

/// Periodic exec check polling the readiness marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyCheck {
    pub exec: String,
    pub period_secs: u32,
    pub threshold: u32,
}

/// The service layer declared to the workload supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLayer {
    /// Stable layer label; upserts are keyed by this.
    pub label: String,
    pub summary: String,
    pub command: String,
    pub environment: BTreeMap<String, String>,
    pub startup_enabled: bool,
    pub user: String,
    pub group: String,
    pub check: ReadyCheck,
}

impl ServiceLayer {
    /// Build the layer for the given server and agent/token pairs.
    ///
    /// A single pair uses the `JENKINS_AGENT`/`JENKINS_TOKEN` form; several
    /// pairs use the colon-joined `JENKINS_AGENTS`/`JENKINS_TOKENS` form
    /// understood by the multi-agent entrypoint.
    pub fn for_agent(server_url: &str, pairs: &[(String, String)]) -> Self {
        let mut environment = BTreeMap::new();
        environment.insert("JENKINS_URL".to_string(), server_url.to_string());
        match pairs {
            [(name, token)] => {
                environment.insert("JENKINS_AGENT".to_string(), name.clone());
                environment.insert("JENKINS_TOKEN".to_string(), token.clone());
            }
            _ => {
                let names: Vec<&str> = pairs.iter().map(|(n, _)| n.as_str()).collect();
                let tokens: Vec<&str> = pairs.iter().map(|(_, t)| t.as_str()).collect();
                environment.insert("JENKINS_AGENTS".to_string(), names.join(":"));
                environment.insert("JENKINS_TOKENS".to_string(), tokens.join(":"));
            }
        }

        Self {
            label: SERVICE_NAME.to_string(),
            summary: "Jenkins agent".to_string(),
            command: ENTRYPOINT_PATH.to_string(),
            environment,
            startup_enabled: true,
            user: USER.to_string(),
            group: GROUP.to_string(),
            check: ReadyCheck {
                exec: format!("/bin/cat {READY_PATH}"),
                period_secs: 30,
                threshold: 3,
            },
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
