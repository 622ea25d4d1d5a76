// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_state_has_no_commitment() {
    let state = ControllerState::default();
    assert_eq!(state.version, ControllerState::VERSION);
    assert!(state.committed.is_none());
}

#[test]
fn commit_replaces_previous_credential() {
    let mut state = ControllerState::default();
    state.commit("http://j", "unit-0", "old");
    state.commit("http://j", "unit-0", "new");
    assert_eq!(
        state.committed,
        Some(CommittedCredential {
            server_url: "http://j".to_string(),
            agent_name: "unit-0".to_string(),
            secret: "new".to_string(),
        })
    );
}

#[test]
fn clear_removes_commitment() {
    let mut state = ControllerState::default();
    state.commit("http://j", "unit-0", "tok");
    state.clear();
    assert!(state.committed.is_none());
}

#[test]
fn round_trips_through_json() {
    let mut state = ControllerState::default();
    state.commit("http://j", "unit-0", "tok");
    let json = serde_json::to_string(&state).unwrap();
    let back: ControllerState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
}

#[test]
fn uncommitted_state_omits_field() {
    let json = serde_json::to_string(&ControllerState::default()).unwrap();
    assert_eq!(json, r#"{"version":1}"#);
}
