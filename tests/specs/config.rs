//! Static-configuration scenarios.

use crate::prelude::*;
use jac_core::service::SERVICE_NAME;
use jac_core::{Event, RelationChannel, UnitStatus};

#[tokio::test]
async fn bulk_provisioned_pairs_probe_in_order() {
    let mut spec = Spec::new();
    spec.write_config(
        r#"
server_url = "http://j"
agent_name = "a1:a2"
agent_token = "t1:t2"
"#,
    );
    spec.workload.push_exec_output(&[]); // a1 rejected (no markers)
    spec.workload.push_exec_output(&["INFO: Connected"]); // a2 accepted

    spec.controller.handle_event(Event::ConfigChanged).await;

    assert_eq!(spec.controller.status(), &UnitStatus::Active);
    let layer = spec.workload.layer(SERVICE_NAME).unwrap();
    assert_eq!(layer.environment.get("JENKINS_AGENT").map(String::as_str), Some("a2"));
    assert_eq!(layer.environment.get("JENKINS_TOKEN").map(String::as_str), Some("t2"));
}

#[tokio::test]
async fn config_governs_even_with_a_live_relation() {
    let mut spec = Spec::new();
    spec.write_config(
        r#"
server_url = "http://config"
agent_name = "a1"
agent_token = "t1"
"#,
    );

    // Relation events are ignored while configuration governs: no databag
    // write, no probe.
    spec.controller
        .handle_event(Event::RelationJoined { channel: RelationChannel::Current })
        .await;
    assert!(!spec.paths.databag_out_path.exists());

    spec.controller
        .handle_event(changed(
            RelationChannel::Current,
            &[("url", "http://relation"), ("jenkins-agent-0_secret", "tok")],
        ))
        .await;
    assert_eq!(spec.workload.exec_count(), 0);

    spec.workload.push_exec_output(&["INFO: Connected"]);
    spec.controller.handle_event(Event::ConfigChanged).await;
    let layer = spec.workload.layer(SERVICE_NAME).unwrap();
    assert_eq!(
        layer.environment.get("JENKINS_URL").map(String::as_str),
        Some("http://config")
    );
}

#[tokio::test]
async fn operator_fixing_partial_config_recovers_the_unit() {
    let mut spec = Spec::new();
    spec.write_config(r#"agent_name = "a1""#);

    spec.controller.handle_event(Event::ConfigChanged).await;
    let status = spec.reported_status();
    assert_eq!(status["state"], "blocked");
    assert_eq!(status["message"], "missing required config: agent_token server_url");

    spec.write_config(
        r#"
server_url = "http://j"
agent_name = "a1"
agent_token = "t1"
"#,
    );
    spec.workload.push_exec_output(&["INFO: Connected"]);
    spec.controller.handle_event(Event::ConfigChanged).await;
    assert_eq!(spec.controller.status(), &UnitStatus::Active);
}

#[tokio::test]
async fn unconfigured_unit_blocks_until_input_arrives() {
    let mut spec = Spec::new();
    spec.controller.handle_event(Event::Start).await;
    assert_eq!(
        spec.controller.status(),
        &UnitStatus::blocked("waiting for config/relation")
    );

    spec.controller.handle_event(Event::Upgrade).await;
    assert_eq!(
        spec.controller.status(),
        &UnitStatus::blocked("waiting for config/relation")
    );
}
