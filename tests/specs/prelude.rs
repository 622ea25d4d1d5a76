//! Shared spec harness.

use jac_controller::adapters::{FakeArtifactFetcher, FakeWorkload};
use jac_controller::{lifecycle, Controller};
use jac_core::{AgentIdentity, Event, RelationChannel, RelationUnit};

pub const UNIT: &str = "jenkins-agent/0";
pub const AGENT: &str = "jenkins-agent-0";

pub struct Spec {
    pub controller: Controller<FakeWorkload, FakeArtifactFetcher>,
    pub workload: FakeWorkload,
    pub fetcher: FakeArtifactFetcher,
    pub paths: lifecycle::Config,
    _dir: tempfile::TempDir,
}

impl Spec {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().to_path_buf();
        let paths = lifecycle::Config {
            socket_path: state_dir.join("jacd.sock"),
            lock_path: state_dir.join("jacd.pid"),
            status_path: state_dir.join("status.json"),
            state_path: state_dir.join("state.json"),
            databag_out_path: state_dir.join("databag-out.jsonl"),
            log_path: state_dir.join("jacd.log"),
            supervisor_socket: state_dir.join("supervisor.sock"),
            config_path: state_dir.join("config.toml"),
            state_dir,
        };
        let workload = FakeWorkload::new();
        let fetcher = FakeArtifactFetcher::new();
        let identity = AgentIdentity::new(2, "x86_64", UNIT).unwrap();
        let controller =
            Controller::new(identity, UNIT, workload.clone(), fetcher.clone(), paths.clone())
                .with_jitter(false);
        Self { controller, workload, fetcher, paths, _dir: dir }
    }

    pub fn write_config(&self, contents: &str) {
        std::fs::write(&self.paths.config_path, contents).unwrap();
    }

    /// The status the dispatch boundary reads from the status file.
    pub fn reported_status(&self) -> serde_json::Value {
        let contents = std::fs::read_to_string(&self.paths.status_path).unwrap();
        serde_json::from_str(&contents).unwrap()
    }
}

pub fn changed(channel: RelationChannel, entries: &[(&str, &str)]) -> Event {
    Event::RelationChanged {
        channel,
        units: vec![RelationUnit {
            unit: "jenkins/0".to_string(),
            databag: entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }],
    }
}
