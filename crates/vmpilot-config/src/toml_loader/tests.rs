//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_vmpilot_config.toml"));
    let err = result.unwrap_err();
    assert!(matches!(err, vmpilot_common::ConfigError::FileNotFound(_)));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[server]
port = 9001

[agent]
default_model = "claude-3-5-sonnet-20241022"
parallel_tool_calls = true
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.server.port, 9001);
    assert_eq!(config.agent.default_model, "claude-3-5-sonnet-20241022");
    assert!(config.agent.parallel_tool_calls);
    // Defaults preserved
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.instance.tool_timeout_secs, 60);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, vmpilot_common::ConfigError::ParseError(_)));
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vmpilot").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.agent.default_model, "claude-3-7-sonnet-20250219");
}

#[test]
fn default_template_is_valid_toml() {
    let content = super::template::default_config_toml();
    let parsed: Result<crate::schema::PilotConfig, _> = toml::from_str(&content);
    assert!(parsed.is_ok(), "template failed to parse: {parsed:?}");
}

#[test]
fn default_config_path_ends_with_vmpilot() {
    if let Ok(path) = default_config_path() {
        assert!(path.ends_with("vmpilot/config.toml"));
    }
}
