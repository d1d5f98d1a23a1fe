//! Remote instance provider configuration.

use serde::{Deserialize, Serialize};

/// Where and how remote instances are provisioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub api_url: String,
    pub instance_type: String,
    pub provision_timeout_secs: u32,
    /// Upper bound for one tool call against the instance.
    pub tool_timeout_secs: u32,
    pub release_timeout_secs: u32,
    pub display_width: u32,
    pub display_height: u32,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.scrapybara.com".into(),
            instance_type: "ubuntu".into(),
            provision_timeout_secs: 120,
            tool_timeout_secs: 60,
            release_timeout_secs: 30,
            display_width: 1024,
            display_height: 768,
        }
    }
}
