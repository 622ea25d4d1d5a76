// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event routing and the registration pipeline.
//!
//! One transition function per event kind; every pass runs the same
//! resolve → download → validate → reconcile pipeline against whichever
//! credential source governs. The controller is the only place an error
//! becomes a status side effect.

use crate::adapters::artifact::{download_agent, ArtifactFetcher};
use crate::adapters::workload::WorkloadAdapter;
use crate::lifecycle::Config;
use crate::observer::{ChannelState, Disposition, Outcome, RelationObserver};
use crate::reconciler;
use crate::validator;
use jac_core::service::READY_PATH;
use jac_core::{
    resolve, AgentIdentity, ControllerState, Event, JenkinsConfig, RawConfig,
    RegistrationState, RelationCandidate, RelationChannel, RelationUnit, UnitStatus,
};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

/// Reason surfaced when no credential source is available.
const NO_SOURCE_REASON: &str = "waiting for config/relation";

/// The agent lifecycle controller.
///
/// Generic over its two collaborators so the whole pipeline can be driven
/// with fakes in tests.
pub struct Controller<W: WorkloadAdapter, F: ArtifactFetcher> {
    identity: AgentIdentity,
    local_app: String,
    workload: W,
    fetcher: F,
    paths: Config,
    observer: RelationObserver,
    state: ControllerState,
    status: UnitStatus,
    persist_credentials: bool,
    validation_timeout: Duration,
    jitter: bool,
}

impl<W: WorkloadAdapter, F: ArtifactFetcher> Controller<W, F> {
    /// Build a controller. Persisted state is loaded from the state file
    /// but only honored once configuration enables `persist_credentials`.
    pub fn new(
        identity: AgentIdentity,
        unit_name: &str,
        workload: W,
        fetcher: F,
        paths: Config,
    ) -> Self {
        let local_app = unit_name.split('/').next().unwrap_or(unit_name).to_string();
        let state = load_state(&paths.state_path);
        Self {
            identity,
            local_app,
            workload,
            fetcher,
            paths,
            observer: RelationObserver::new(),
            state,
            status: UnitStatus::maintenance("starting controller"),
            persist_credentials: false,
            validation_timeout: crate::env::validation_timeout(),
            jitter: true,
        }
    }

    /// Disable validation jitter (tests).
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    pub fn status(&self) -> &UnitStatus {
        &self.status
    }

    pub fn channel_state(&self, channel: RelationChannel) -> ChannelState {
        self.observer.state(channel)
    }

    pub fn committed(&self) -> Option<&jac_core::CommittedCredential> {
        self.state.committed.as_ref()
    }

    /// Process one lifecycle event to completion.
    pub async fn handle_event(&mut self, event: Event) -> Disposition {
        let name = event.name();
        info!(event = name, "handling event");
        let outcome = match event {
            Event::Start | Event::ConfigChanged | Event::Upgrade => self.on_config_event().await,
            Event::RelationJoined { channel } => self.on_relation_joined(channel).await,
            Event::RelationChanged { channel, units } => {
                self.on_relation_changed(channel, units).await
            }
            Event::RelationDeparted { channel } => self.on_relation_departed(channel).await,
            Event::Shutdown => Outcome::handled(),
        };

        if let Some(status) = outcome.status {
            self.set_status(status);
        }
        if outcome.disposition == Disposition::Deferred {
            info!(event = name, "event deferred");
        }
        outcome.disposition
    }

    // -- transitions --

    async fn on_relation_joined(&mut self, channel: RelationChannel) -> Outcome {
        match self.governing_config() {
            Err(e) => Outcome::handled_with(UnitStatus::blocked(e.to_string())),
            Ok(Some(_)) => {
                warn!(%channel, "static configuration governs; ignoring relation");
                Outcome::handled()
            }
            Ok(None) => {
                info!(%channel, "relation joined");
                self.observer.relation_joined(channel);
                self.publish_identity(channel);
                if self.observer.state(channel) == ChannelState::Idle {
                    self.observer.set_state(channel, ChannelState::AwaitingCredentials);
                }
                Outcome::handled_with(UnitStatus::maintenance("Setting up relation."))
            }
        }
    }

    async fn on_relation_changed(
        &mut self,
        channel: RelationChannel,
        units: Vec<RelationUnit>,
    ) -> Outcome {
        self.observer.relation_changed(channel, units);

        match self.governing_config() {
            Err(e) => return Outcome::handled_with(UnitStatus::blocked(e.to_string())),
            Ok(Some(_)) => {
                warn!(%channel, "static configuration governs; ignoring relation data");
                return Outcome::handled();
            }
            Ok(None) => {}
        }

        if !self.workload.can_connect().await {
            warn!("workload environment not yet ready; deferring");
            return Outcome::deferred();
        }
        if self.is_registered().await {
            info!("agent already registered; skipping");
            return Outcome::handled_with(UnitStatus::Active);
        }

        let resolved =
            resolve(None, &self.observer.snapshots(), &self.identity.name, &self.local_app);
        match resolved {
            RegistrationState::NoSource | RegistrationState::Static(_) => {
                Outcome::handled_with(UnitStatus::blocked(NO_SOURCE_REASON))
            }
            RegistrationState::Relation { candidates } if candidates.is_empty() => {
                self.observer.set_state(channel, ChannelState::AwaitingCredentials);
                info!(%channel, "waiting for complete relation data");
                Outcome::handled_with(UnitStatus::waiting("waiting for complete relation data"))
            }
            RegistrationState::Relation { candidates } => {
                self.register_with_candidates(candidates).await
            }
        }
    }

    async fn on_relation_departed(&mut self, channel: RelationChannel) -> Outcome {
        info!(%channel, "relation departed");
        self.observer.relation_departed(channel);

        // Departure always demotes, but with the environment unreachable
        // there is nothing to tear down.
        if !self.workload.can_connect().await {
            self.observer.set_state(channel, ChannelState::Departed);
            return Outcome::handled();
        }

        if let Err(e) = reconciler::stop_agent(&self.workload).await {
            warn!(error = %e, "failed to stop agent service on departure");
        }
        self.state.clear();
        self.persist_state();
        self.observer.set_state(channel, ChannelState::Departed);
        Outcome::handled_with(UnitStatus::blocked(NO_SOURCE_REASON))
    }

    /// Start / config-changed / upgrade: re-run the pipeline with static
    /// configuration as the preferred credential source.
    async fn on_config_event(&mut self) -> Outcome {
        let raw = match self.load_raw_config() {
            Ok(raw) => raw,
            Err(e) => return Outcome::handled_with(UnitStatus::blocked(e.to_string())),
        };
        self.persist_credentials = raw.persist_credentials;

        let config = match JenkinsConfig::from_raw(&raw) {
            Ok(config) => config,
            Err(e) => return Outcome::handled_with(UnitStatus::blocked(e.to_string())),
        };

        let resolved = resolve(
            config.as_ref(),
            &self.observer.snapshots(),
            &self.identity.name,
            &self.local_app,
        );
        match resolved {
            RegistrationState::NoSource => self.recommit_or_block().await,
            RegistrationState::Static(config) => self.register_from_config(config).await,
            RegistrationState::Relation { candidates } if candidates.is_empty() => {
                Outcome::handled_with(UnitStatus::waiting("waiting for complete relation data"))
            }
            RegistrationState::Relation { candidates } => {
                if !self.workload.can_connect().await {
                    warn!("workload environment not yet ready; deferring");
                    return Outcome::deferred();
                }
                if self.is_registered().await {
                    return Outcome::handled_with(UnitStatus::Active);
                }
                self.register_with_candidates(candidates).await
            }
        }
    }

    // -- pipeline --

    async fn register_from_config(&mut self, config: JenkinsConfig) -> Outcome {
        if !self.workload.can_connect().await {
            warn!("workload environment not yet ready; deferring");
            return Outcome::deferred();
        }
        if self.is_registered().await {
            info!("agent already registered; skipping");
            return Outcome::handled_with(UnitStatus::Active);
        }

        self.set_status(UnitStatus::maintenance("Downloading Jenkins agent executable."));
        if let Err(e) = download_agent(&self.workload, &self.fetcher, &config.server_url).await {
            error!(error = %e, "agent executable download failed");
            return Outcome::handled_with(UnitStatus::blocked(
                "Failed to download Jenkins agent executable.",
            ));
        }

        self.set_status(UnitStatus::maintenance("Validating credentials."));
        let accepted = match validator::find_valid_credentials(
            &self.workload,
            &config.server_url,
            &config.pairs,
            self.jitter,
            self.validation_timeout,
        )
        .await
        {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "credential probe transport failure; deferring");
                return Outcome::deferred();
            }
        };

        let Some((name, token)) = accepted else {
            return Outcome::handled_with(UnitStatus::blocked(
                "additional valid agent-token pairs required",
            ));
        };

        let pair = [(name.clone(), token.clone())];
        if let Err(e) = reconciler::reconcile(&self.workload, &config.server_url, &pair).await {
            warn!(error = %e, "service reconcile failed; deferring");
            return Outcome::deferred();
        }
        self.state.commit(&config.server_url, &name, &token);
        self.persist_state();
        Outcome::handled_with(UnitStatus::Active)
    }

    async fn register_with_candidates(&mut self, candidates: Vec<RelationCandidate>) -> Outcome {
        let mut downloaded: Option<String> = None;
        for candidate in &candidates {
            let url = &candidate.credentials.server_url;
            if downloaded.as_deref() != Some(url.as_str()) {
                self.set_status(UnitStatus::maintenance(
                    "Downloading Jenkins agent executable.",
                ));
                if let Err(e) = download_agent(&self.workload, &self.fetcher, url).await {
                    error!(error = %e, "agent executable download failed");
                    return Outcome::handled_with(UnitStatus::blocked(
                        "Failed to download Jenkins agent executable.",
                    ));
                }
                downloaded = Some(url.clone());
            }

            self.set_status(UnitStatus::maintenance("Validating credentials."));
            self.observer.set_state(candidate.channel, ChannelState::Validating);
            let accepted = match validator::validate(
                &self.workload,
                &self.identity.name,
                &candidate.credentials,
                self.jitter,
                self.validation_timeout,
            )
            .await
            {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "credential probe transport failure; deferring");
                    self.observer
                        .set_state(candidate.channel, ChannelState::AwaitingCredentials);
                    return Outcome::deferred();
                }
            };

            if !accepted {
                // Expected when a racing peer claimed the secret first.
                warn!(
                    channel = %candidate.channel,
                    agent = %self.identity.name,
                    "credential rejected by server"
                );
                self.observer.set_state(candidate.channel, ChannelState::AwaitingCredentials);
                continue;
            }

            let pair = [(self.identity.name.clone(), candidate.credentials.secret.clone())];
            if let Err(e) = reconciler::reconcile(&self.workload, url, &pair).await {
                warn!(error = %e, "service reconcile failed; deferring");
                self.observer.set_state(candidate.channel, ChannelState::AwaitingCredentials);
                return Outcome::deferred();
            }
            self.state.commit(url, &self.identity.name, &candidate.credentials.secret);
            self.persist_state();
            self.observer.set_state(candidate.channel, ChannelState::Registered);
            return Outcome::handled_with(UnitStatus::Active);
        }

        Outcome::handled_with(UnitStatus::waiting("waiting for credentials"))
    }

    /// No source resolved: re-commit a persisted credential for continuity,
    /// or hold in blocked until configuration or a relation appears.
    async fn recommit_or_block(&mut self) -> Outcome {
        if !self.persist_credentials {
            return Outcome::handled_with(UnitStatus::blocked(NO_SOURCE_REASON));
        }
        let Some(committed) = self.state.committed.clone() else {
            return Outcome::handled_with(UnitStatus::blocked(NO_SOURCE_REASON));
        };

        if !self.workload.can_connect().await {
            warn!("workload environment not yet ready; deferring");
            return Outcome::deferred();
        }
        if self.is_registered().await {
            return Outcome::handled_with(UnitStatus::Active);
        }

        info!(agent = %committed.agent_name, "re-committing persisted credential");
        let pair = [(committed.agent_name.clone(), committed.secret.clone())];
        if let Err(e) = reconciler::reconcile(&self.workload, &committed.server_url, &pair).await {
            warn!(error = %e, "service reconcile failed; deferring");
            return Outcome::deferred();
        }
        Outcome::handled_with(UnitStatus::Active)
    }

    // -- helpers --

    async fn is_registered(&self) -> bool {
        self.workload.file_exists(Path::new(READY_PATH)).await
    }

    fn load_raw_config(&self) -> Result<RawConfig, jac_core::ConfigError> {
        match std::fs::read_to_string(&self.paths.config_path) {
            Ok(contents) => RawConfig::from_toml_str(&contents),
            // Absent file means configuration not in use.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RawConfig::default()),
            Err(e) => Err(jac_core::ConfigError::Parse(e.to_string())),
        }
    }

    fn governing_config(&self) -> Result<Option<JenkinsConfig>, jac_core::ConfigError> {
        JenkinsConfig::from_raw(&self.load_raw_config()?)
    }

    /// Publish this unit's identity onto the relation databag — the only
    /// relation write the agent side performs.
    fn publish_identity(&self, channel: RelationChannel) {
        let data = match channel {
            RelationChannel::Legacy => self.identity.legacy_databag(),
            RelationChannel::Current => self.identity.current_databag(),
        };
        info!(%channel, ?data, "publishing agent identity");
        let line = serde_json::json!({ "relation": channel.relation_name(), "data": data });
        if let Err(e) = append_line(&self.paths.databag_out_path, &line.to_string()) {
            warn!(error = %e, "failed to record databag write");
        }
    }

    fn set_status(&mut self, status: UnitStatus) {
        if status != self.status {
            info!(from = %self.status, to = %status, "status changed");
        }
        self.status = status;
        match serde_json::to_vec_pretty(&self.status) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&self.paths.status_path, bytes) {
                    warn!(error = %e, "failed to write status file");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode status"),
        }
    }

    fn persist_state(&self) {
        if !self.persist_credentials {
            // Stateless mode: make sure nothing stale survives a restart.
            let _ = std::fs::remove_file(&self.paths.state_path);
            return;
        }
        match serde_json::to_vec_pretty(&self.state) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&self.paths.state_path, bytes) {
                    warn!(error = %e, "failed to write state file");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode state"),
        }
    }
}

/// Load persisted controller state, falling back to a fresh value on any
/// missing or unreadable file.
fn load_state(path: &Path) -> ControllerState {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return ControllerState::default();
    };
    match serde_json::from_str::<ControllerState>(&contents) {
        Ok(state) if state.version == ControllerState::VERSION => state,
        Ok(state) => {
            warn!(version = state.version, "discarding state file with unknown version");
            ControllerState::default()
        }
        Err(e) => {
            warn!(error = %e, "discarding unreadable state file");
            ControllerState::default()
        }
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
