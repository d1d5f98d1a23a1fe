//! Shared, read-only context handed to every session.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vmpilot_ai::{DisplaySize, RetryPolicy, Sampler};
use vmpilot_config::PilotConfig;
use vmpilot_instance::{InstanceProvider, InstanceTimeouts};

use crate::credits::CreditPolicy;
use crate::table::SessionTable;

/// Time bounds a session applies to its suspension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub hello: Duration,
    pub idle: Duration,
    pub tool: Duration,
    pub instance: InstanceTimeouts,
}

impl Timeouts {
    pub fn from_config(config: &PilotConfig) -> Self {
        let secs = |s: u32| Duration::from_secs(u64::from(s));
        Self {
            hello: secs(config.server.hello_timeout_secs),
            idle: secs(config.session.idle_timeout_secs),
            tool: secs(config.instance.tool_timeout_secs),
            instance: InstanceTimeouts {
                provision: secs(config.instance.provision_timeout_secs),
                release: secs(config.instance.release_timeout_secs),
            },
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<PilotConfig>,
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
    pub sampler: Arc<dyn Sampler>,
    pub provider: Arc<dyn InstanceProvider>,
    pub credits: Option<Arc<CreditPolicy>>,
    pub table: SessionTable,
    /// Parent of every session's cancellation token.
    pub shutdown: CancellationToken,
}

impl AppContext {
    pub fn new(
        config: PilotConfig,
        sampler: Arc<dyn Sampler>,
        provider: Arc<dyn InstanceProvider>,
        credits: Option<Arc<CreditPolicy>>,
    ) -> Self {
        let retry = RetryPolicy {
            max_attempts: config.sampling.max_attempts,
            initial_backoff: Duration::from_millis(u64::from(config.sampling.initial_backoff_ms)),
            max_backoff: Duration::from_millis(u64::from(config.sampling.max_backoff_ms)),
        };
        Self {
            timeouts: Timeouts::from_config(&config),
            retry,
            config: Arc::new(config),
            sampler,
            provider,
            credits,
            table: SessionTable::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn display(&self) -> DisplaySize {
        DisplaySize {
            width: self.config.instance.display_width,
            height: self.config.instance.display_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_follow_config() {
        let mut config = PilotConfig::default();
        config.session.idle_timeout_secs = 30;
        config.instance.tool_timeout_secs = 5;
        let timeouts = Timeouts::from_config(&config);
        assert_eq!(timeouts.idle, Duration::from_secs(30));
        assert_eq!(timeouts.tool, Duration::from_secs(5));
        assert_eq!(timeouts.hello, Duration::from_secs(10));
        assert_eq!(timeouts.instance.provision, Duration::from_secs(120));
    }
}
