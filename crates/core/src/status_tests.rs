// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn display_includes_reason() {
    assert_eq!(UnitStatus::Active.to_string(), "active");
    assert_eq!(
        UnitStatus::waiting("waiting for credentials").to_string(),
        "waiting: waiting for credentials"
    );
    assert_eq!(
        UnitStatus::blocked("waiting for config/relation").to_string(),
        "blocked: waiting for config/relation"
    );
}

#[test]
fn serializes_with_state_tag() {
    let json = serde_json::to_string(&UnitStatus::waiting("x")).unwrap();
    assert_eq!(json, r#"{"state":"waiting","message":"x"}"#);

    let json = serde_json::to_string(&UnitStatus::Active).unwrap();
    assert_eq!(json, r#"{"state":"active"}"#);
}

#[test]
fn round_trips() {
    let status = UnitStatus::maintenance("Validating credentials.");
    let json = serde_json::to_string(&status).unwrap();
    let back: UnitStatus = serde_json::from_str(&json).unwrap();
    assert_eq!(back, status);
}
