// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential validation against the live server.
//!
//! A candidate credential is probed by launching the agent client in
//! no-reconnect mode and reading its transcript. The server hands out each
//! shared secret to exactly one claimant, so when several agent units race
//! for the same pool of secrets a random sub-second jitter is inserted
//! before the probe. Jitter only reduces collision probability; a lost
//! race still shows up as a rejection and is retried on the next event
//! delivery.

use crate::adapters::workload::{WorkloadAdapter, WorkloadError};
use jac_core::service::{AGENT_JAR_PATH, WORKDIR};
use jac_core::Credentials;
use std::time::Duration;
use tracing::{debug, warn};

/// Transcript marker for a successful connection handshake.
const CONNECTED_MARKER: &str = "INFO: Connected";

/// Transcript marker for an explicit rejection/teardown.
const TERMINATED_MARKER: &str = "INFO: Terminated";

/// Interpret a probe transcript.
///
/// Accepted only when a connection was observed and never torn down.
/// Ambiguous output (neither marker before the timeout) is a rejection.
fn transcript_accepts(lines: &[String]) -> bool {
    let mut connected = false;
    let mut terminated = false;
    for line in lines {
        if line.contains(CONNECTED_MARKER) {
            connected = true;
        }
        if line.contains(TERMINATED_MARKER) {
            terminated = true;
        }
    }
    connected && !terminated
}

fn probe_command(agent_name: &str, credentials: &Credentials) -> Vec<String> {
    vec![
        "java".to_string(),
        "-jar".to_string(),
        AGENT_JAR_PATH.to_string(),
        "-jnlpUrl".to_string(),
        format!("{}/computer/{}/slave-agent.jnlp", credentials.server_url, agent_name),
        "-workDir".to_string(),
        WORKDIR.to_string(),
        "-noReconnect".to_string(),
        "-secret".to_string(),
        credentials.secret.clone(),
    ]
}

/// Check whether the credentials can register `agent_name` on the server.
///
/// Transport failures (supervisor/exec unavailable) are errors, distinct
/// from a credential rejection: they say nothing about the credential.
pub async fn validate<W: WorkloadAdapter>(
    workload: &W,
    agent_name: &str,
    credentials: &Credentials,
    add_jitter: bool,
    timeout: Duration,
) -> Result<bool, WorkloadError> {
    if add_jitter {
        let jitter = Duration::from_millis((rand::random::<f64>() * 1000.0) as u64);
        tokio::time::sleep(jitter).await;
    }

    let command = probe_command(agent_name, credentials);
    let lines = workload.exec_capture(&command, timeout).await?;
    let accepted = transcript_accepts(&lines);
    debug!(agent = agent_name, accepted, lines = lines.len(), "credential probe finished");
    Ok(accepted)
}

/// Probe each (name, token) pair in order against `server_url`, returning
/// the first accepted pair.
///
/// Pair order is caller-determined and encodes operator intent (preferred
/// agent identity first); probing stops at the first acceptance.
pub async fn find_valid_credentials<W: WorkloadAdapter>(
    workload: &W,
    server_url: &str,
    pairs: &[(String, String)],
    add_jitter: bool,
    timeout: Duration,
) -> Result<Option<(String, String)>, WorkloadError> {
    for (name, token) in pairs {
        let credentials = Credentials::new(server_url, token.clone());
        if validate(workload, name, &credentials, add_jitter, timeout).await? {
            return Ok(Some((name.clone(), token.clone())));
        }
        warn!(agent = %name, "credential rejected by server");
    }
    Ok(None)
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
