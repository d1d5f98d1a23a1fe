//! The remote-instance provider contract.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{BashCommand, ComputerAction, EditOperation, InstanceError, ToolOutput};

/// What to provision for a session.
#[derive(Clone)]
pub struct ProvisionOptions {
    /// Provider credential supplied by the client.
    pub api_key: String,
    pub instance_type: String,
    /// Saved browser session to restore after boot.
    pub auth_state_id: Option<String>,
}

impl fmt::Debug for ProvisionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionOptions")
            .field("api_key", &"[REDACTED]")
            .field("instance_type", &self.instance_type)
            .field("auth_state_id", &self.auth_state_id)
            .finish()
    }
}

/// A provisioned instance as reported by the provider.
#[derive(Clone)]
pub struct InstanceInfo {
    pub id: String,
    pub launch_time: DateTime<Utc>,
    /// Credential for follow-up calls on this instance.
    pub api_key: String,
}

impl fmt::Debug for InstanceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceInfo")
            .field("id", &self.id)
            .field("launch_time", &self.launch_time)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Provisions virtual machines and drives their control surfaces.
///
/// Every operation is independently failable. Time bounds are applied by
/// the caller (`InstanceHandle`, `ToolDispatcher`).
#[async_trait]
pub trait InstanceProvider: Send + Sync {
    async fn provision(&self, opts: &ProvisionOptions) -> Result<InstanceInfo, InstanceError>;

    async fn release(&self, instance: &InstanceInfo) -> Result<(), InstanceError>;

    /// Live view URL for the client.
    async fn stream_url(&self, instance: &InstanceInfo) -> Result<String, InstanceError>;

    /// Start the browser and restore a saved authentication state.
    async fn authenticate_browser(
        &self,
        instance: &InstanceInfo,
        auth_state_id: &str,
    ) -> Result<(), InstanceError>;

    async fn computer(
        &self,
        instance: &InstanceInfo,
        action: &ComputerAction,
    ) -> Result<ToolOutput, InstanceError>;

    async fn bash(
        &self,
        instance: &InstanceInfo,
        command: &BashCommand,
    ) -> Result<ToolOutput, InstanceError>;

    async fn edit(
        &self,
        instance: &InstanceInfo,
        operation: &EditOperation,
    ) -> Result<ToolOutput, InstanceError>;
}
