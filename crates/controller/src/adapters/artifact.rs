// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent artifact download and installation.
//!
//! The agent client executable is served by the Jenkins server itself at
//! `{server_url}/jnlpJars/agent.jar`. A failed download is terminal for
//! the current pass; the next delivered event retries it.

use crate::adapters::workload::{WorkloadAdapter, WorkloadError};
use async_trait::async_trait;
use jac_core::service::AGENT_JAR_PATH;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors downloading or installing the agent executable.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to download agent executable: {0}")]
    Download(String),
    #[error("failed to install agent executable: {0}")]
    Install(#[from] WorkloadError),
}

/// Adapter fetching the agent client executable.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, server_url: &str) -> Result<Vec<u8>, ArtifactError>;
}

/// HTTP fetcher against the live server.
#[derive(Debug, Clone)]
pub struct HttpArtifactFetcher {
    client: reqwest::Client,
}

impl HttpArtifactFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

#[async_trait]
impl ArtifactFetcher for HttpArtifactFetcher {
    async fn fetch(&self, server_url: &str) -> Result<Vec<u8>, ArtifactError> {
        let url = format!("{server_url}/jnlpJars/agent.jar");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ArtifactError::Download(e.to_string()))?
            .error_for_status()
            .map_err(|e| ArtifactError::Download(e.to_string()))?;
        let bytes =
            response.bytes().await.map_err(|e| ArtifactError::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Download the agent executable and install it into the workload.
pub async fn download_agent<W: WorkloadAdapter, F: ArtifactFetcher>(
    workload: &W,
    fetcher: &F,
    server_url: &str,
) -> Result<(), ArtifactError> {
    let bytes = fetcher.fetch(server_url).await?;
    workload.write_file(Path::new(AGENT_JAR_PATH), &bytes).await?;
    Ok(())
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ArtifactError, ArtifactFetcher};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct FakeArtifactState {
        bytes: Vec<u8>,
        fail: bool,
        fetches: Vec<String>,
    }

    /// Fake artifact source for testing.
    #[derive(Clone)]
    pub struct FakeArtifactFetcher {
        inner: Arc<Mutex<FakeArtifactState>>,
    }

    impl Default for FakeArtifactFetcher {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeArtifactState {
                    bytes: b"jar-bytes".to_vec(),
                    fail: false,
                    fetches: Vec::new(),
                })),
            }
        }
    }

    impl FakeArtifactFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail(&self, fail: bool) {
            self.inner.lock().fail = fail;
        }

        /// Server URLs fetched so far.
        pub fn fetches(&self) -> Vec<String> {
            self.inner.lock().fetches.clone()
        }
    }

    #[async_trait]
    impl ArtifactFetcher for FakeArtifactFetcher {
        async fn fetch(&self, server_url: &str) -> Result<Vec<u8>, ArtifactError> {
            let mut state = self.inner.lock();
            state.fetches.push(server_url.to_string());
            if state.fail {
                return Err(ArtifactError::Download("server unreachable".into()));
            }
            Ok(state.bytes.clone())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeArtifactFetcher;

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
