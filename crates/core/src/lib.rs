// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jac-core: value types and decision logic for the Jenkins agent controller.
//!
//! Everything in this crate is pure: no sockets, no subprocesses, no
//! filesystem. The controller crate owns all I/O and feeds snapshots of the
//! outside world (configuration, relation databags) into the functions here.

pub mod config;
pub mod credentials;
pub mod event;
pub mod identity;
pub mod registration;
pub mod relation;
pub mod service;
pub mod state;
pub mod status;

pub use config::{ConfigError, JenkinsConfig, RawConfig};
pub use credentials::{Credentials, WireFormat};
pub use event::Event;
pub use identity::{AgentIdentity, IdentityError};
pub use registration::{resolve, RegistrationState, RelationCandidate};
pub use relation::{Databag, RelationChannel, RelationSnapshot, RelationUnit};
pub use service::{ReadyCheck, ServiceLayer};
pub use state::{CommittedCredential, ControllerState};
pub use status::UnitStatus;
