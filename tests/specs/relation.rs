//! Relation-driven registration scenarios.

use crate::prelude::*;
use jac_core::service::SERVICE_NAME;
use jac_core::{Event, RelationChannel, UnitStatus};

#[tokio::test]
async fn full_relation_lifecycle() {
    let mut spec = Spec::new();

    // Joined: identity published, setting-up status.
    spec.controller
        .handle_event(Event::RelationJoined { channel: RelationChannel::Current })
        .await;
    assert_eq!(
        spec.controller.status(),
        &UnitStatus::maintenance("Setting up relation.")
    );

    // Server exported only its URL so far: hold in waiting.
    spec.controller
        .handle_event(changed(RelationChannel::Current, &[("url", "http://j")]))
        .await;
    assert_eq!(
        spec.controller.status(),
        &UnitStatus::waiting("waiting for complete relation data")
    );
    assert!(spec.fetcher.fetches().is_empty());

    // Secret provisioned: download, validate, reconcile, go active.
    spec.workload.push_exec_output(&["INFO: Connected"]);
    spec.controller
        .handle_event(changed(
            RelationChannel::Current,
            &[("url", "http://j"), ("jenkins-agent-0_secret", "tok")],
        ))
        .await;
    assert_eq!(spec.controller.status(), &UnitStatus::Active);
    assert_eq!(spec.reported_status()["state"], "active");

    let layer = spec.workload.layer(SERVICE_NAME).unwrap();
    assert_eq!(layer.environment.get("JENKINS_URL").map(String::as_str), Some("http://j"));
    assert_eq!(layer.environment.get("JENKINS_AGENT").map(String::as_str), Some(AGENT));
    assert_eq!(layer.environment.get("JENKINS_TOKEN").map(String::as_str), Some("tok"));
    assert!(spec.workload.is_running(SERVICE_NAME));

    // Departed: service stopped, unit demoted.
    spec.controller
        .handle_event(Event::RelationDeparted { channel: RelationChannel::Current })
        .await;
    assert_eq!(
        spec.controller.status(),
        &UnitStatus::blocked("waiting for config/relation")
    );
    assert!(!spec.workload.is_running(SERVICE_NAME));
}

#[tokio::test]
async fn redelivered_event_does_not_restart_a_healthy_agent() {
    let mut spec = Spec::new();
    let event = changed(
        RelationChannel::Current,
        &[("url", "http://j"), ("jenkins-agent-0_secret", "tok")],
    );

    spec.workload.push_exec_output(&["INFO: Connected"]);
    spec.controller.handle_event(event.clone()).await;
    assert_eq!(spec.workload.replan_count(), 1);

    // Redelivery after the agent connected: the readiness marker
    // short-circuits before any probe or restart.
    spec.workload.set_file(jac_core::service::READY_PATH, b"ready");
    spec.controller.handle_event(event).await;
    assert_eq!(spec.workload.replan_count(), 1);
    assert_eq!(spec.controller.status(), &UnitStatus::Active);
}

#[tokio::test]
async fn lost_secret_race_waits_for_next_delivery() {
    let mut spec = Spec::new();

    // Another unit claimed the shared secret first: the probe sees an
    // explicit teardown.
    spec.workload.push_exec_output(&["INFO: Connected", "INFO: Terminated"]);
    spec.controller
        .handle_event(changed(RelationChannel::Legacy, &[("url", "http://j"), ("secret", "s")]))
        .await;

    assert_eq!(spec.controller.status(), &UnitStatus::waiting("waiting for credentials"));
    assert!(!spec.workload.is_running(SERVICE_NAME));

    // The server rotates the secret and the next delivery succeeds.
    spec.workload.push_exec_output(&["INFO: Connected"]);
    spec.controller
        .handle_event(changed(RelationChannel::Legacy, &[("url", "http://j"), ("secret", "s2")]))
        .await;
    assert_eq!(spec.controller.status(), &UnitStatus::Active);
}
