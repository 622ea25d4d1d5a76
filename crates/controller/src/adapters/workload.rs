// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workload supervisor adapter.
//!
//! The agent process is owned by a sidecar service manager. Service-layer
//! operations (declare, replan, stop) go to its HTTP API over a Unix
//! domain socket; file and exec operations act directly on the shared
//! workload volume, which the controller mounts alongside the workload.

use async_trait::async_trait;
use jac_core::ServiceLayer;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Errors from workload supervisor operations.
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("supervisor not reachable: {0}")]
    NotReady(String),
    #[error("supervisor API error: {0}")]
    Api(String),
    #[error("exec failed: {0}")]
    ExecFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Adapter for the workload execution environment.
#[async_trait]
pub trait WorkloadAdapter: Send + Sync {
    /// Whether the supervisor is up and accepting requests.
    async fn can_connect(&self) -> bool;

    /// The layer currently declared under `label`, if any.
    async fn current_layer(&self, label: &str) -> Result<Option<ServiceLayer>, WorkloadError>;

    /// Idempotent layer upsert keyed by the layer's label.
    async fn add_layer(&self, layer: &ServiceLayer) -> Result<(), WorkloadError>;

    /// Replan just the named service (never the whole environment).
    async fn replan(&self, service: &str) -> Result<(), WorkloadError>;

    async fn stop_service(&self, service: &str) -> Result<(), WorkloadError>;

    /// Whether the named service is declared and running.
    async fn service_running(&self, service: &str) -> Result<bool, WorkloadError>;

    /// Run a command in the workload environment, returning combined
    /// output lines collected until exit or `timeout`, whichever first.
    async fn exec_capture(
        &self,
        command: &[String],
        timeout: Duration,
    ) -> Result<Vec<String>, WorkloadError>;

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), WorkloadError>;

    async fn file_exists(&self, path: &Path) -> bool;

    async fn remove_file(&self, path: &Path) -> Result<(), WorkloadError>;
}

/// Supervisor client for the sidecar arrangement: service operations over
/// the supervisor socket, file and exec operations on the shared volume.
#[derive(Debug, Clone)]
pub struct SidecarWorkload {
    socket_path: PathBuf,
    workdir: PathBuf,
}

#[derive(Deserialize)]
struct PlanResponse {
    layer: Option<ServiceLayer>,
}

#[derive(Deserialize)]
struct ServiceResponse {
    #[serde(default)]
    running: bool,
}

impl SidecarWorkload {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            workdir: PathBuf::from(jac_core::service::WORKDIR),
        }
    }

    /// Override the exec working directory (tests).
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }
}

#[async_trait]
impl WorkloadAdapter for SidecarWorkload {
    async fn can_connect(&self) -> bool {
        http::get(&self.socket_path, "/v1/health").await.is_ok()
    }

    async fn current_layer(&self, label: &str) -> Result<Option<ServiceLayer>, WorkloadError> {
        let body = http::get(&self.socket_path, &format!("/v1/plan?label={label}")).await?;
        let plan: PlanResponse =
            serde_json::from_str(&body).map_err(|e| WorkloadError::Api(e.to_string()))?;
        Ok(plan.layer)
    }

    async fn add_layer(&self, layer: &ServiceLayer) -> Result<(), WorkloadError> {
        let body = serde_json::json!({ "combine": true, "layer": layer });
        http::post(&self.socket_path, "/v1/layers", &body.to_string()).await?;
        Ok(())
    }

    async fn replan(&self, service: &str) -> Result<(), WorkloadError> {
        let body = serde_json::json!({ "action": "replan", "name": service });
        http::post(&self.socket_path, "/v1/services", &body.to_string()).await?;
        Ok(())
    }

    async fn stop_service(&self, service: &str) -> Result<(), WorkloadError> {
        let body = serde_json::json!({ "action": "stop", "name": service });
        http::post(&self.socket_path, "/v1/services", &body.to_string()).await?;
        Ok(())
    }

    async fn service_running(&self, service: &str) -> Result<bool, WorkloadError> {
        let body = http::get(&self.socket_path, &format!("/v1/services?name={service}")).await?;
        let service: ServiceResponse =
            serde_json::from_str(&body).map_err(|e| WorkloadError::Api(e.to_string()))?;
        Ok(service.running)
    }

    async fn exec_capture(
        &self,
        command: &[String],
        timeout: Duration,
    ) -> Result<Vec<String>, WorkloadError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| WorkloadError::ExecFailed("empty command".into()))?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkloadError::ExecFailed(format!("spawn {program}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WorkloadError::ExecFailed("no stdout handle".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| WorkloadError::ExecFailed("no stderr handle".into()))?;

        // Drain both streams into one transcript. Relative ordering across
        // the two streams is not preserved; marker scanning does not care.
        // A process that outlives the deadline is killed and the transcript
        // collected so far is the result (a successfully connected agent
        // never exits on its own).
        let deadline = tokio::time::Instant::now() + timeout;
        let mut lines = Vec::new();
        let mut out = BufReader::new(stdout).lines();
        let mut err = BufReader::new(stderr).lines();
        let mut out_open = true;
        let mut err_open = true;
        while out_open || err_open {
            let step = tokio::time::timeout_at(deadline, async {
                tokio::select! {
                    line = out.next_line(), if out_open => (true, line),
                    line = err.next_line(), if err_open => (false, line),
                }
            })
            .await;
            match step {
                Err(_) => {
                    let _ = child.start_kill();
                    break;
                }
                Ok((_, Ok(Some(line)))) => lines.push(line),
                Ok((from_stdout, _)) => {
                    if from_stdout {
                        out_open = false;
                    } else {
                        err_open = false;
                    }
                }
            }
        }
        let _ = tokio::time::timeout(Duration::from_secs(1), child.wait()).await;
        Ok(lines)
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), WorkloadError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
        Ok(())
    }

    async fn file_exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn remove_file(&self, path: &Path) -> Result<(), WorkloadError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// HTTP/1.1 over Unix domain sockets.
///
/// Reads responses using Content-Length framing (does not depend on
/// connection close for EOF).
mod http {
    use super::WorkloadError;
    use std::path::Path;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::UnixStream;

    pub async fn get(socket_path: &Path, path: &str) -> Result<String, WorkloadError> {
        let request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path);
        timed_request(socket_path, &request).await
    }

    pub async fn post(
        socket_path: &Path,
        path: &str,
        body: &str,
    ) -> Result<String, WorkloadError> {
        let request = format!(
            "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            path,
            body.len(),
            body
        );
        timed_request(socket_path, &request).await
    }

    /// Connect, send, and read with a 5-second timeout covering the entire
    /// operation (connect + write + read). Prevents hangs when the
    /// supervisor accepts the connection but doesn't send a response.
    async fn timed_request(socket_path: &Path, request: &str) -> Result<String, WorkloadError> {
        tokio::time::timeout(Duration::from_secs(5), send_request(socket_path, request))
            .await
            .map_err(|_| WorkloadError::NotReady("supervisor request timed out".into()))?
    }

    async fn send_request(socket_path: &Path, request: &str) -> Result<String, WorkloadError> {
        let mut stream = UnixStream::connect(socket_path)
            .await
            .map_err(|e| WorkloadError::NotReady(format!("connect failed: {}", e)))?;
        stream
            .write_all(request.as_bytes())
            .await
            .map_err(|e| WorkloadError::NotReady(format!("write failed: {}", e)))?;

        let mut reader = BufReader::new(&mut stream);
        read_http_response(&mut reader).await
    }

    /// Read and parse an HTTP/1.1 response from a buffered stream.
    async fn read_http_response<R: tokio::io::AsyncRead + Unpin>(
        reader: &mut BufReader<R>,
    ) -> Result<String, WorkloadError> {
        // Read status line
        let mut status_line = String::new();
        reader
            .read_line(&mut status_line)
            .await
            .map_err(|e| WorkloadError::NotReady(format!("read status failed: {}", e)))?;

        let status_code =
            status_line.split_whitespace().nth(1).and_then(|s| s.parse::<u16>().ok()).unwrap_or(0);

        // Read headers, extract Content-Length (case-insensitive)
        let mut content_length: usize = 0;
        loop {
            let mut line = String::new();
            reader
                .read_line(&mut line)
                .await
                .map_err(|e| WorkloadError::NotReady(format!("read header failed: {}", e)))?;
            if line == "\r\n" || line.is_empty() {
                break;
            }
            let line_lower = line.to_ascii_lowercase();
            if let Some(val) = line_lower.strip_prefix("content-length:") {
                content_length = val.trim().parse().unwrap_or(0);
            }
        }

        // Read body
        let body = if content_length > 0 {
            let mut buf = vec![0u8; content_length];
            reader
                .read_exact(&mut buf)
                .await
                .map_err(|e| WorkloadError::NotReady(format!("read body failed: {}", e)))?;
            String::from_utf8_lossy(&buf).into_owned()
        } else {
            String::new()
        };

        if status_code >= 400 {
            return Err(WorkloadError::Api(format!("HTTP {}: {}", status_code, body.trim())));
        }

        Ok(body)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{WorkloadAdapter, WorkloadError};
    use async_trait::async_trait;
    use jac_core::ServiceLayer;
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, BTreeSet, VecDeque};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    /// Recorded workload operation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum WorkloadCall {
        AddLayer(ServiceLayer),
        Replan(String),
        Stop(String),
        Exec(Vec<String>),
    }

    struct FakeWorkloadState {
        connected: bool,
        layers: BTreeMap<String, ServiceLayer>,
        running: BTreeSet<String>,
        files: BTreeMap<PathBuf, Vec<u8>>,
        exec_outputs: VecDeque<Vec<String>>,
        exec_error: bool,
        calls: Vec<WorkloadCall>,
    }

    /// Fake workload supervisor for testing.
    #[derive(Clone)]
    pub struct FakeWorkload {
        inner: Arc<Mutex<FakeWorkloadState>>,
    }

    impl Default for FakeWorkload {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeWorkloadState {
                    connected: true,
                    layers: BTreeMap::new(),
                    running: BTreeSet::new(),
                    files: BTreeMap::new(),
                    exec_outputs: VecDeque::new(),
                    exec_error: false,
                    calls: Vec::new(),
                })),
            }
        }
    }

    impl FakeWorkload {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_connected(&self, connected: bool) {
            self.inner.lock().connected = connected;
        }

        /// Queue combined output lines for the next exec call. With no
        /// queued output an exec returns an empty transcript.
        pub fn push_exec_output(&self, lines: &[&str]) {
            self.inner.lock().exec_outputs.push_back(lines.iter().map(|l| l.to_string()).collect());
        }

        pub fn set_exec_error(&self, error: bool) {
            self.inner.lock().exec_error = error;
        }

        pub fn set_file(&self, path: impl Into<PathBuf>, contents: &[u8]) {
            self.inner.lock().files.insert(path.into(), contents.to_vec());
        }

        pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
            self.inner.lock().files.get(path.as_ref()).cloned()
        }

        pub fn layer(&self, label: &str) -> Option<ServiceLayer> {
            self.inner.lock().layers.get(label).cloned()
        }

        pub fn is_running(&self, service: &str) -> bool {
            self.inner.lock().running.contains(service)
        }

        /// Get all recorded operations.
        pub fn calls(&self) -> Vec<WorkloadCall> {
            self.inner.lock().calls.clone()
        }

        pub fn replan_count(&self) -> usize {
            self.inner
                .lock()
                .calls
                .iter()
                .filter(|c| matches!(c, WorkloadCall::Replan(_)))
                .count()
        }

        pub fn exec_count(&self) -> usize {
            self.inner.lock().calls.iter().filter(|c| matches!(c, WorkloadCall::Exec(_))).count()
        }
    }

    #[async_trait]
    impl WorkloadAdapter for FakeWorkload {
        async fn can_connect(&self) -> bool {
            self.inner.lock().connected
        }

        async fn current_layer(
            &self,
            label: &str,
        ) -> Result<Option<ServiceLayer>, WorkloadError> {
            Ok(self.inner.lock().layers.get(label).cloned())
        }

        async fn add_layer(&self, layer: &ServiceLayer) -> Result<(), WorkloadError> {
            let mut state = self.inner.lock();
            state.layers.insert(layer.label.clone(), layer.clone());
            state.calls.push(WorkloadCall::AddLayer(layer.clone()));
            Ok(())
        }

        async fn replan(&self, service: &str) -> Result<(), WorkloadError> {
            let mut state = self.inner.lock();
            state.running.insert(service.to_string());
            state.calls.push(WorkloadCall::Replan(service.to_string()));
            Ok(())
        }

        async fn stop_service(&self, service: &str) -> Result<(), WorkloadError> {
            let mut state = self.inner.lock();
            state.running.remove(service);
            state.calls.push(WorkloadCall::Stop(service.to_string()));
            Ok(())
        }

        async fn service_running(&self, service: &str) -> Result<bool, WorkloadError> {
            Ok(self.inner.lock().running.contains(service))
        }

        async fn exec_capture(
            &self,
            command: &[String],
            _timeout: Duration,
        ) -> Result<Vec<String>, WorkloadError> {
            let mut state = self.inner.lock();
            state.calls.push(WorkloadCall::Exec(command.to_vec()));
            if state.exec_error {
                return Err(WorkloadError::ExecFailed("exec unavailable".into()));
            }
            Ok(state.exec_outputs.pop_front().unwrap_or_default())
        }

        async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<(), WorkloadError> {
            self.inner.lock().files.insert(path.to_path_buf(), contents.to_vec());
            Ok(())
        }

        async fn file_exists(&self, path: &Path) -> bool {
            self.inner.lock().files.contains_key(path)
        }

        async fn remove_file(&self, path: &Path) -> Result<(), WorkloadError> {
            self.inner.lock().files.remove(path);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWorkload, WorkloadCall};

#[cfg(test)]
#[path = "workload_tests.rs"]
mod tests;
