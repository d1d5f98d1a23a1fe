//! Full configuration validation.
//!
//! Validates numeric ranges and cross-field constraints. Each section has
//! its own validator; this orchestrator calls them all and collects errors
//! into a single `ConfigError`.

mod helpers;
mod sections;


use crate::schema::PilotConfig;
use vmpilot_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &PilotConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_server(&mut errors, config);
    sections::validate_agent(&mut errors, config);
    sections::validate_sampling(&mut errors, config);
    sections::validate_instance(&mut errors, config);
    sections::validate_session(&mut errors, config);
    sections::validate_credits(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
