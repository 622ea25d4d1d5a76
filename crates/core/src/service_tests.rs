// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
    entries.iter().map(|(n, t)| (n.to_string(), t.to_string())).collect()
}

#[test]
fn single_pair_uses_singular_env_vars() {
    let layer = ServiceLayer::for_agent("http://j", &pairs(&[("unit-0", "tok")]));
    assert_eq!(layer.environment.get("JENKINS_URL").map(String::as_str), Some("http://j"));
    assert_eq!(layer.environment.get("JENKINS_AGENT").map(String::as_str), Some("unit-0"));
    assert_eq!(layer.environment.get("JENKINS_TOKEN").map(String::as_str), Some("tok"));
    assert!(!layer.environment.contains_key("JENKINS_AGENTS"));
}

#[test]
fn multiple_pairs_are_colon_joined() {
    let layer = ServiceLayer::for_agent("http://j", &pairs(&[("a1", "t1"), ("a2", "t2")]));
    assert_eq!(layer.environment.get("JENKINS_AGENTS").map(String::as_str), Some("a1:a2"));
    assert_eq!(layer.environment.get("JENKINS_TOKENS").map(String::as_str), Some("t1:t2"));
    assert!(!layer.environment.contains_key("JENKINS_AGENT"));
}

#[test]
fn layer_shape_is_stable() {
    let layer = ServiceLayer::for_agent("http://j", &pairs(&[("a", "t")]));
    assert_eq!(layer.label, SERVICE_NAME);
    assert_eq!(layer.command, ENTRYPOINT_PATH);
    assert!(layer.startup_enabled);
    assert_eq!(layer.user, USER);
    assert_eq!(layer.check.exec, format!("/bin/cat {READY_PATH}"));
}

#[test]
fn identical_inputs_build_equal_layers() {
    let a = ServiceLayer::for_agent("http://j", &pairs(&[("a", "t")]));
    let b = ServiceLayer::for_agent("http://j", &pairs(&[("a", "t")]));
    assert_eq!(a, b);

    let c = ServiceLayer::for_agent("http://j", &pairs(&[("a", "other")]));
    assert_ne!(a, c);
}
