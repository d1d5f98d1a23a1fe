//! Instance Handle - one provisioned VM, exclusively owned by a session.
//!
//! Lifecycle: provisioned -> in use -> released. Release happens exactly
//! once, whether through `release()` or, as a fallback, on drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::{
    BashCommand, ComputerAction, EditOperation, InstanceError, InstanceInfo, InstanceProvider,
    ProvisionOptions, ToolOutput,
};

/// Time bounds for lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceTimeouts {
    pub provision: Duration,
    pub release: Duration,
}

impl Default for InstanceTimeouts {
    fn default() -> Self {
        Self {
            provision: Duration::from_secs(120),
            release: Duration::from_secs(30),
        }
    }
}

pub struct InstanceHandle {
    info: InstanceInfo,
    provider: Arc<dyn InstanceProvider>,
    released: AtomicBool,
    release_timeout: Duration,
    /// Bound on provider lookups made after provisioning.
    lookup_timeout: Duration,
    created_at: Instant,
}

impl std::fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceHandle")
            .field("id", &self.info.id)
            .field("released", &self.is_released())
            .finish()
    }
}

impl InstanceHandle {
    /// Provision an instance and, when asked, restore its browser state.
    ///
    /// If the browser step fails the fresh instance is released before the
    /// error is returned.
    pub async fn provision(
        provider: Arc<dyn InstanceProvider>,
        opts: &ProvisionOptions,
        timeouts: InstanceTimeouts,
    ) -> Result<Self, InstanceError> {
        let info = tokio::time::timeout(timeouts.provision, provider.provision(opts))
            .await
            .map_err(|_| InstanceError::Timeout {
                operation: "provision",
                after: timeouts.provision,
            })??;

        info!(instance = %info.id, "Instance provisioned");

        let handle = Self {
            info,
            provider,
            released: AtomicBool::new(false),
            release_timeout: timeouts.release,
            lookup_timeout: timeouts.provision,
            created_at: Instant::now(),
        };

        if let Some(auth_state_id) = opts.auth_state_id.as_deref() {
            let auth = tokio::time::timeout(
                timeouts.provision,
                handle
                    .provider
                    .authenticate_browser(&handle.info, auth_state_id),
            )
            .await;
            let failure = match auth {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(InstanceError::Provision(format!(
                    "browser authentication failed: {e}"
                ))),
                Err(_) => Some(InstanceError::Timeout {
                    operation: "browser authentication",
                    after: timeouts.provision,
                }),
            };
            if let Some(e) = failure {
                handle.release().await;
                return Err(e);
            }
            debug!(instance = %handle.info.id, "Browser authenticated");
        }

        Ok(handle)
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn info(&self) -> &InstanceInfo {
        &self.info
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Time since provisioning completed.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Viewer URL for the instance, bounded by the provisioning timeout.
    pub async fn stream_url(&self) -> Result<String, InstanceError> {
        self.ensure_live()?;
        tokio::time::timeout(self.lookup_timeout, self.provider.stream_url(&self.info))
            .await
            .map_err(|_| InstanceError::Timeout {
                operation: "stream url",
                after: self.lookup_timeout,
            })?
    }

    pub async fn computer(&self, action: &ComputerAction) -> Result<ToolOutput, InstanceError> {
        self.ensure_live()?;
        self.provider.computer(&self.info, action).await
    }

    pub async fn bash(&self, command: &BashCommand) -> Result<ToolOutput, InstanceError> {
        self.ensure_live()?;
        self.provider.bash(&self.info, command).await
    }

    pub async fn edit(&self, operation: &EditOperation) -> Result<ToolOutput, InstanceError> {
        self.ensure_live()?;
        self.provider.edit(&self.info, operation).await
    }

    /// Release the instance. Returns `true` only for the call that actually
    /// performed the release; later calls are no-ops.
    ///
    /// Provider failures are logged, not returned: the handle counts as
    /// released either way.
    pub async fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }

        match tokio::time::timeout(self.release_timeout, self.provider.release(&self.info)).await {
            Ok(Ok(())) => {
                info!(
                    instance = %self.info.id,
                    age_secs = self.age().as_secs(),
                    "Instance released"
                );
            }
            Ok(Err(e)) => warn!(instance = %self.info.id, error = %e, "Instance release failed"),
            Err(_) => warn!(
                instance = %self.info.id,
                timeout_secs = self.release_timeout.as_secs(),
                "Instance release timed out"
            ),
        }
        true
    }

    fn ensure_live(&self) -> Result<(), InstanceError> {
        if self.is_released() {
            Err(InstanceError::Released)
        } else {
            Ok(())
        }
    }
}

impl Drop for InstanceHandle {
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }

        let provider = Arc::clone(&self.provider);
        let info = self.info.clone();
        let timeout = self.release_timeout;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                warn!(instance = %info.id, "Instance dropped unreleased, releasing in background");
                runtime.spawn(async move {
                    if let Ok(Err(e)) = tokio::time::timeout(timeout, provider.release(&info)).await {
                        warn!(instance = %info.id, error = %e, "Background release failed");
                    }
                });
            }
            Err(_) => warn!(instance = %info.id, "Instance dropped outside a runtime, not released"),
        }
    }
}

#[cfg(test)]
mod tests;
