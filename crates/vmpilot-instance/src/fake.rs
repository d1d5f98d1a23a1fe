//! In-memory provider for tests, here and in dependent crates.
//!
//! `bash` understands two commands: `false` fails with a remote error and
//! `sleep <ms>` waits before answering.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    BashCommand, ComputerAction, EditOperation, InstanceError, InstanceInfo, InstanceProvider,
    ProvisionOptions, ToolOutput,
};

#[derive(Default)]
pub struct FakeProvider {
    pub provisions: AtomicUsize,
    pub releases: AtomicUsize,
    pub fail_provision: bool,
    pub fail_auth: bool,
    /// `stream_url` never answers.
    pub stall_stream_url: bool,
    pub provision_delay: Option<Duration>,
    pub tool_delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn provisions(&self) -> usize {
        self.provisions.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Completed tool calls, in completion order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn tool(&self, label: String) -> Result<ToolOutput, InstanceError> {
        if let Some(delay) = self.tool_delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(label.clone());
        Ok(ToolOutput::text(label))
    }
}

#[async_trait]
impl InstanceProvider for FakeProvider {
    async fn provision(&self, opts: &ProvisionOptions) -> Result<InstanceInfo, InstanceError> {
        if let Some(delay) = self.provision_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_provision {
            return Err(InstanceError::Provision("no capacity".into()));
        }
        let n = self.provisions.fetch_add(1, Ordering::SeqCst);
        Ok(InstanceInfo {
            id: format!("inst-{n}"),
            launch_time: Utc::now(),
            api_key: opts.api_key.clone(),
        })
    }

    async fn release(&self, _instance: &InstanceInfo) -> Result<(), InstanceError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stream_url(&self, instance: &InstanceInfo) -> Result<String, InstanceError> {
        if self.stall_stream_url {
            std::future::pending::<()>().await;
        }
        Ok(format!("https://stream.test/{}", instance.id))
    }

    async fn authenticate_browser(
        &self,
        _instance: &InstanceInfo,
        auth_state_id: &str,
    ) -> Result<(), InstanceError> {
        if self.fail_auth {
            return Err(InstanceError::Remote(format!("unknown auth state {auth_state_id}")));
        }
        Ok(())
    }

    async fn computer(
        &self,
        _instance: &InstanceInfo,
        action: &ComputerAction,
    ) -> Result<ToolOutput, InstanceError> {
        if matches!(action, ComputerAction::Screenshot) {
            self.calls.lock().unwrap().push("computer:screenshot".into());
            return Ok(ToolOutput::screenshot("iVBORw0KGgo"));
        }
        self.tool(format!("computer:{}", action.name())).await
    }

    async fn bash(
        &self,
        _instance: &InstanceInfo,
        command: &BashCommand,
    ) -> Result<ToolOutput, InstanceError> {
        let line = command.command.as_deref().unwrap_or("restart");
        if line == "false" {
            return Err(InstanceError::Remote("exit status 1".into()));
        }
        if let Some(ms) = line.strip_prefix("sleep ").and_then(|ms| ms.parse().ok()) {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        self.tool(format!("bash:{line}")).await
    }

    async fn edit(
        &self,
        _instance: &InstanceInfo,
        operation: &EditOperation,
    ) -> Result<ToolOutput, InstanceError> {
        self.tool(format!("edit:{}", operation.path())).await
    }
}
