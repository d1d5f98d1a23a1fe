//! LLM request retry configuration.

use serde::{Deserialize, Serialize};

/// Retry and timeout settings for sampling requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u32,
    pub max_backoff_ms: u32,
    pub request_timeout_secs: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
            request_timeout_secs: 120,
        }
    }
}
