// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn unit(name: &str, entries: &[(&str, &str)]) -> RelationUnit {
    RelationUnit {
        unit: name.to_string(),
        databag: entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    }
}

#[test]
fn channel_names() {
    assert_eq!(RelationChannel::Legacy.relation_name(), "slave");
    assert_eq!(RelationChannel::Current.relation_name(), "agent");
}

#[test]
fn priority_tries_current_first() {
    assert_eq!(
        RelationChannel::PRIORITY,
        [RelationChannel::Current, RelationChannel::Legacy]
    );
}

#[test]
fn server_unit_skips_own_application_peers() {
    let snapshot = RelationSnapshot {
        channel: RelationChannel::Current,
        units: vec![
            unit("jenkins-agent/1", &[]),
            unit("jenkins/0", &[("url", "http://jenkins")]),
        ],
    };
    let server = snapshot.server_unit("jenkins-agent");
    assert_eq!(server.map(|u| u.unit.as_str()), Some("jenkins/0"));
}

#[test]
fn server_unit_none_when_only_peers_present() {
    let snapshot = RelationSnapshot {
        channel: RelationChannel::Legacy,
        units: vec![unit("jenkins-agent/1", &[]), unit("jenkins-agent/2", &[])],
    };
    assert!(snapshot.server_unit("jenkins-agent").is_none());
}

#[test]
fn unit_app_is_prefix_before_slash() {
    assert_eq!(unit("jenkins/0", &[]).app(), "jenkins");
    assert_eq!(unit("standalone", &[]).app(), "standalone");
}

#[test]
fn channel_serializes_snake_case() {
    let json = serde_json::to_string(&RelationChannel::Current).unwrap();
    assert_eq!(json, r#""current""#);
    let back: RelationChannel = serde_json::from_str(r#""legacy""#).unwrap();
    assert_eq!(back, RelationChannel::Legacy);
}
