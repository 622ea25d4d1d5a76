// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service reconciliation: drive the supervisor's layer to the desired
//! declaration and (re)start the agent service.
//!
//! The reconciler performs no retries and no readiness checks of its own;
//! a not-yet-ready environment is the caller's problem (the event is
//! deferred and redelivered).

use crate::adapters::workload::{WorkloadAdapter, WorkloadError};
use jac_core::service::{READY_PATH, SERVICE_NAME};
use jac_core::ServiceLayer;
use std::path::Path;
use tracing::info;

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Layer changed; the service was replanned.
    Restarted,
    /// Declared layer already matched; nothing to do.
    Unchanged,
}

/// Declare the desired service layer and replan the agent service.
///
/// Idempotent: recomputes the layer from its inputs and compares it
/// against the currently-declared one; an identical layer is a no-op so a
/// redelivered event never restarts a healthy agent.
pub async fn reconcile<W: WorkloadAdapter>(
    workload: &W,
    server_url: &str,
    pairs: &[(String, String)],
) -> Result<ReconcileOutcome, WorkloadError> {
    let desired = ServiceLayer::for_agent(server_url, pairs);

    if workload.current_layer(SERVICE_NAME).await?.as_ref() == Some(&desired) {
        info!(service = SERVICE_NAME, "service layer unchanged");
        return Ok(ReconcileOutcome::Unchanged);
    }

    workload.add_layer(&desired).await?;
    workload.replan(SERVICE_NAME).await?;
    info!(service = SERVICE_NAME, "service layer declared and replanned");
    Ok(ReconcileOutcome::Restarted)
}

/// Stop the agent service cleanly.
///
/// Explicitly checks whether the service is running rather than inferring
/// it from errors; a stop on an idle unit is a no-op. The readiness marker
/// is removed so a later start is not short-circuited by a stale
/// "already registered" signal.
pub async fn stop_agent<W: WorkloadAdapter>(workload: &W) -> Result<(), WorkloadError> {
    if !workload.service_running(SERVICE_NAME).await? {
        return Ok(());
    }
    workload.stop_service(SERVICE_NAME).await?;
    workload.remove_file(Path::new(READY_PATH)).await?;
    info!(service = SERVICE_NAME, "agent service stopped");
    Ok(())
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
