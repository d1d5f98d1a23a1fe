//! vmpilot configuration system.
//!
//! Provides TOML-based configuration with environment overrides and full
//! validation. All config sections use sensible defaults so partial configs
//! work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vmpilot_config::{load_config, config_to_json};
//!
//! let config = load_config(None).expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{PilotConfig, CONFIG_SCHEMA_VERSION};

use std::path::Path;

use vmpilot_common::ConfigError;

/// Load, override, and validate the config.
///
/// With `path` the file must exist; without it the platform default is used
/// and created on first run. Environment overrides are applied before
/// validation, so an out-of-range `VMPILOT_PORT` is reported like any other
/// error. A value that is not a number is logged and ignored.
pub fn load_config(path: Option<&Path>) -> Result<PilotConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    env::apply_env_overrides(&mut config);
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &PilotConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let config = PilotConfig::default();
        let json = config_to_json(&config);
        for section in [
            "\"server\"",
            "\"agent\"",
            "\"sampling\"",
            "\"instance\"",
            "\"session\"",
            "\"credits\"",
            "\"logging\"",
        ] {
            assert!(json.contains(section), "missing {section}");
        }
    }

    #[test]
    fn config_schema_version_is_1() {
        assert_eq!(CONFIG_SCHEMA_VERSION, 1);
    }

    #[test]
    fn load_config_with_explicit_path_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\nmax_tool_rounds = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn load_config_with_missing_explicit_path_fails() {
        let err = load_config(Some(Path::new("/tmp/vmpilot-does-not-exist.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let config = PilotConfig::default();
        let json = config_to_json(&config);
        let parsed: PilotConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.server.port, 8000);
        assert_eq!(parsed.agent.default_model, "claude-3-7-sonnet-20250219");
    }
}
