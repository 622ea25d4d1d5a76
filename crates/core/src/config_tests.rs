// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn raw(server_url: &str, agent_name: &str, agent_token: &str) -> RawConfig {
    RawConfig {
        server_url: server_url.to_string(),
        agent_name: agent_name.to_string(),
        agent_token: agent_token.to_string(),
        ..RawConfig::default()
    }
}

#[test]
fn all_empty_means_not_in_use() {
    assert_eq!(JenkinsConfig::from_raw(&RawConfig::default()), Ok(None));
}

#[test]
fn single_pair_config() {
    let config = JenkinsConfig::from_raw(&raw("http://jenkins:8080", "agent-one", "tok"))
        .unwrap()
        .unwrap();
    assert_eq!(config.server_url, "http://jenkins:8080");
    assert_eq!(config.pairs, vec![("agent-one".to_string(), "tok".to_string())]);
}

#[test]
fn colon_delimited_pairs_preserve_order() {
    let config =
        JenkinsConfig::from_raw(&raw("http://j", "a1:a2", "t1:t2")).unwrap().unwrap();
    assert_eq!(
        config.pairs,
        vec![("a1".to_string(), "t1".to_string()), ("a2".to_string(), "t2".to_string())]
    );
}

#[parameterized(
    url_only = { "http://j", "", "", &["agent_name", "agent_token"] },
    name_only = { "", "a1", "", &["agent_token", "server_url"] },
    token_only = { "", "", "t1", &["agent_name", "server_url"] },
    name_and_token = { "", "a1", "t1", &["server_url"] },
)]
fn partial_config_reports_missing_fields(
    server_url: &str,
    agent_name: &str,
    agent_token: &str,
    expected: &[&'static str],
) {
    let err = JenkinsConfig::from_raw(&raw(server_url, agent_name, agent_token)).unwrap_err();
    assert_eq!(err, ConfigError::MissingFields(expected.to_vec()));
}

#[test]
fn missing_fields_message_is_operator_readable() {
    let err = JenkinsConfig::from_raw(&raw("http://j", "", "")).unwrap_err();
    assert_eq!(err.to_string(), "missing required config: agent_name agent_token");
}

#[parameterized(
    no_scheme = { "jenkins.example.com" },
    bad_scheme = { "ftp://jenkins" },
    not_a_url = { "::::" },
)]
fn invalid_server_url_is_rejected(server_url: &str) {
    let err = JenkinsConfig::from_raw(&raw(server_url, "a1", "t1")).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl(_)), "got {err:?}");
}

#[test]
fn mismatched_pair_counts_are_rejected() {
    let err = JenkinsConfig::from_raw(&raw("http://j", "a1:a2", "t1")).unwrap_err();
    assert_eq!(err, ConfigError::MismatchedPairs { names: 2, tokens: 1 });
}

#[test]
fn trailing_slash_is_normalized() {
    let config = JenkinsConfig::from_raw(&raw("http://j:8080/", "a1", "t1")).unwrap().unwrap();
    assert_eq!(config.server_url, "http://j:8080");
}

#[test]
fn raw_config_parses_from_toml() {
    let raw = RawConfig::from_toml_str(
        r#"
server_url = "http://jenkins:8080"
agent_name = "a1"
agent_token = "t1"
agent_labels = "gpu"
persist_credentials = true
"#,
    )
    .unwrap();
    assert_eq!(raw.server_url, "http://jenkins:8080");
    assert_eq!(raw.agent_labels, "gpu");
    assert!(raw.persist_credentials);
}

#[test]
fn empty_toml_parses_to_defaults() {
    assert_eq!(RawConfig::from_toml_str("").unwrap(), RawConfig::default());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = RawConfig::from_toml_str("server_url = [").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
