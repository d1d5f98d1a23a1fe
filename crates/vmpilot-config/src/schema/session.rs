use serde::{Deserialize, Serialize};

/// Per-session limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a ready session waits for the next client frame.
    pub idle_timeout_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 600,
        }
    }
}
