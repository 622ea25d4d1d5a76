// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jacd: the Jenkins agent lifecycle controller daemon.

use jac_controller::adapters::{HttpArtifactFetcher, SidecarWorkload};
use jac_controller::{lifecycle, listener, Controller, Disposition};
use jac_core::{AgentIdentity, Event, RawConfig, UnitStatus};
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("jacd: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), lifecycle::LifecycleError> {
    let config = lifecycle::Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;

    let file_appender =
        tracing_appender::rolling::never(&config.state_dir, "jacd.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("JAC_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let unit_name = jac_controller::env::unit_name()?;
    let startup = lifecycle::startup(&config)?;

    // Labels come from the config file once, at startup; the identity is
    // immutable for the controller's process lifetime.
    let label_override = std::fs::read_to_string(&config.config_path)
        .ok()
        .and_then(|contents| RawConfig::from_toml_str(&contents).ok())
        .map(|raw| raw.agent_labels)
        .filter(|labels| !labels.is_empty());

    let identity = match AgentIdentity::from_host(&unit_name, label_override.as_deref()) {
        Ok(identity) => identity,
        Err(e) => {
            // Invalid host state is fatal: surface blocked status and stop
            // before processing any event.
            error!(error = %e, "invalid agent identity");
            let status = UnitStatus::blocked(format!("invalid agent state: {e}"));
            if let Ok(bytes) = serde_json::to_vec_pretty(&status) {
                let _ = std::fs::write(&config.status_path, bytes);
            }
            lifecycle::shutdown(&config);
            return Err(e.into());
        }
    };
    info!(name = %identity.name, executors = identity.executors, "agent identity");

    let workload = SidecarWorkload::new(&config.supervisor_socket);
    let fetcher = HttpArtifactFetcher::new(jac_controller::env::download_timeout());
    let mut controller = Controller::new(identity, &unit_name, workload, fetcher, config.clone());

    let (tx, mut rx) = mpsc::channel::<Event>(64);
    tokio::spawn(listener::run_listener(startup.listener, tx.clone()));

    // The dispatch boundary also delivers a start event, but an initial
    // pass at boot makes a restarted controller converge without waiting
    // for one.
    let _ = tx.send(Event::Start).await;

    let mut sigterm =
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let redeliver_delay = jac_controller::env::redeliver_delay();

    loop {
        let event = tokio::select! {
            event = rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = sigterm.recv() => Event::Shutdown,
            _ = tokio::signal::ctrl_c() => Event::Shutdown,
        };

        if event == Event::Shutdown {
            let _ = controller.handle_event(Event::Shutdown).await;
            break;
        }

        // At-least-once redelivery: a deferred event goes back on the
        // queue after a short delay.
        if controller.handle_event(event.clone()).await == Disposition::Deferred {
            let tx = tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(redeliver_delay).await;
                let _ = tx.send(event).await;
            });
        }
    }

    lifecycle::shutdown(&config);
    Ok(())
}
