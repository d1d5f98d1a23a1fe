//! Configuration schema types for vmpilot.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Secrets are never part of the schema; they come from the environment.

mod agent;
mod credits;
mod instance;
mod logging;
mod sampling;
mod server;
mod session;

pub use agent::*;
pub use credits::*;
pub use instance::*;
pub use logging::*;
pub use sampling::*;
pub use server::*;
pub use session::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for the vmpilot server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PilotConfig {
    pub server: ServerConfig,
    pub agent: AgentConfig,
    pub sampling: SamplingConfig,
    pub instance: InstanceConfig,
    pub session: SessionConfig,
    pub credits: CreditsConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_section() {
        let config = PilotConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.hello_timeout_secs, 10);
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn default_agent_section() {
        let config = PilotConfig::default();
        assert_eq!(config.agent.default_model, "claude-3-7-sonnet-20250219");
        assert_eq!(config.agent.max_tokens, 4096);
        assert_eq!(config.agent.images_to_keep, 3);
        assert!(!config.agent.parallel_tool_calls);
        assert!(config.agent.system_prompt.is_none());
    }

    #[test]
    fn default_instance_and_session_sections() {
        let config = PilotConfig::default();
        assert_eq!(config.instance.instance_type, "ubuntu");
        assert_eq!(config.instance.tool_timeout_secs, 60);
        assert_eq!(config.instance.display_width, 1024);
        assert_eq!(config.instance.display_height, 768);
        assert_eq!(config.session.idle_timeout_secs, 600);
    }

    #[test]
    fn default_credits_are_disabled() {
        let config = PilotConfig::default();
        assert_eq!(config.credits.backend, CreditBackend::Disabled);
        assert_eq!(config.credits.policy, CreditPolicyKind::Admission);
        assert!(config.credits.accounts.is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let toml_str = r#"
[server]
port = 9100

[credits]
backend = "memory"
policy = "per_turn"

[credits.accounts]
"key-123" = 5.0
"#;
        let config: PilotConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.credits.backend, CreditBackend::Memory);
        assert_eq!(config.credits.policy, CreditPolicyKind::PerTurn);
        assert_eq!(config.credits.accounts.get("key-123"), Some(&5.0));
        assert_eq!(config.agent.max_tool_rounds, 50);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let toml_str = r#"
[credits]
backend = "redis"
"#;
        assert!(toml::from_str::<PilotConfig>(toml_str).is_err());
    }
}
