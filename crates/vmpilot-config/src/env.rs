//! Environment variable overrides applied after the file is loaded.

use tracing::{info, warn};

use crate::schema::PilotConfig;

pub const HOST_VAR: &str = "VMPILOT_HOST";
pub const PORT_VAR: &str = "VMPILOT_PORT";

/// Apply `VMPILOT_HOST` / `VMPILOT_PORT` from the process environment.
pub fn apply_env_overrides(config: &mut PilotConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides using an arbitrary lookup, so tests never touch the real environment.
pub fn apply_overrides_from(config: &mut PilotConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup(HOST_VAR).filter(|h| !h.trim().is_empty()) {
        info!(host = %host, "host overridden from environment");
        config.server.host = host;
    }

    if let Some(port) = lookup(PORT_VAR) {
        match port.trim().parse::<u32>() {
            Ok(port) => {
                info!(port, "port overridden from environment");
                config.server.port = port;
            }
            Err(e) => warn!(value = %port, error = %e, "ignoring invalid {PORT_VAR}"),
        }
    }
}
