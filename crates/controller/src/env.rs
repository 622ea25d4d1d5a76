// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the controller crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: JAC_STATE_DIR > XDG_STATE_HOME/jac > ~/.local/state/jac
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("JAC_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("jac"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/jac"))
}

/// This unit's identity (`app/N`), assigned by the deployment.
pub fn unit_name() -> Result<String, LifecycleError> {
    std::env::var("JAC_UNIT_NAME").ok().filter(|s| !s.is_empty()).ok_or(LifecycleError::NoUnitName)
}

/// Static configuration file path.
pub fn config_path() -> PathBuf {
    std::env::var("JAC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/jac/config.toml"))
}

/// Workload supervisor socket path override.
pub fn supervisor_socket() -> Option<PathBuf> {
    std::env::var("JAC_SUPERVISOR_SOCKET").ok().map(PathBuf::from)
}

/// Delay before a deferred event is redelivered (default 5s).
pub fn redeliver_delay() -> Duration {
    std::env::var("JAC_REDELIVER_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Credential validation probe timeout (default 5s).
pub fn validation_timeout() -> Duration {
    std::env::var("JAC_VALIDATE_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Agent artifact download timeout (default 300s).
pub fn download_timeout() -> Duration {
    std::env::var("JAC_DOWNLOAD_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(300))
}
