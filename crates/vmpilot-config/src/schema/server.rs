//! Listener configuration.

use serde::{Deserialize, Serialize};

/// WebSocket listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u32,
    /// Seconds a new connection has to send its hello frame.
    pub hello_timeout_secs: u32,
    /// Seconds between active-session log lines.
    pub stats_interval_secs: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            hello_timeout_secs: 10,
            stats_interval_secs: 60,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
