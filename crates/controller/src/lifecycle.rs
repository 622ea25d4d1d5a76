// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller lifecycle management: paths, lock file, startup, shutdown.

use std::fs::File;
use std::path::PathBuf;

use fs2::FileExt;
use jac_core::IdentityError;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// Controller configuration: every path the controller reads or writes.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/jac)
    pub state_dir: PathBuf,
    /// Event socket the dispatch boundary connects to
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Externally visible status file
    pub status_path: PathBuf,
    /// Persisted controller state (committed credential)
    pub state_path: PathBuf,
    /// Outgoing relation databag writes, one JSON object per line
    pub databag_out_path: PathBuf,
    /// Path to controller log file
    pub log_path: PathBuf,
    /// Workload supervisor socket
    pub supervisor_socket: PathBuf,
    /// Static configuration file
    pub config_path: PathBuf,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;

        Ok(Self {
            socket_path: state_dir.join("jacd.sock"),
            lock_path: state_dir.join("jacd.pid"),
            status_path: state_dir.join("status.json"),
            state_path: state_dir.join("state.json"),
            databag_out_path: state_dir.join("databag-out.jsonl"),
            log_path: state_dir.join("jacd.log"),
            supervisor_socket: crate::env::supervisor_socket()
                .unwrap_or_else(|| state_dir.join("supervisor.sock")),
            config_path: crate::env::config_path(),
            state_dir,
        })
    }
}

/// Result of controller startup.
pub struct StartupResult {
    // NOTE(lifetime): held to maintain the exclusive file lock; released on drop
    #[allow(dead_code)]
    pub lock_file: File,
    /// Event socket listener for the dispatch boundary
    pub listener: UnixListener,
}

/// Acquire the instance lock and bind the event socket.
pub fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let lock_file = File::create(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    std::fs::write(&config.lock_path, format!("{}\n", std::process::id()))?;

    // A stale socket from a crashed instance prevents a fresh bind.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(socket = %config.socket_path.display(), "controller started");
    Ok(StartupResult { lock_file, listener })
}

/// Remove runtime files on graceful shutdown.
///
/// The workload service is deliberately left running: the agent outlives
/// controller restarts, and only a relation departure or operator action
/// stops it.
pub fn shutdown(config: &Config) {
    info!("shutting down controller");
    for path in [&config.socket_path, &config.lock_path] {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "failed to remove runtime file");
            }
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("JAC_UNIT_NAME is not set")]
    NoUnitName,

    #[error("failed to acquire lock: controller already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("invalid agent identity: {0}")]
    InvalidIdentity(#[from] IdentityError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
