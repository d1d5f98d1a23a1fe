//! Tool dispatch: model tool call -> typed invocation -> remote surface.
//!
//! Failures of any kind (unknown tool, bad arguments, remote fault,
//! timeout) come back as a failed `ToolOutput` so the model can react.

use std::time::Duration;

use tracing::{debug, warn};
use vmpilot_common::ToolKind;

use crate::tool::parse_args;
use crate::{BashCommand, ComputerAction, EditOperation, InstanceError, InstanceHandle, ToolOutput};

/// A parsed tool call, one variant per control surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    Computer(ComputerAction),
    Bash(BashCommand),
    Edit(EditOperation),
}

impl ToolInvocation {
    pub fn parse(name: &str, input: &serde_json::Value) -> Result<Self, InstanceError> {
        let kind =
            ToolKind::from_name(name).ok_or_else(|| InstanceError::UnknownTool(name.to_string()))?;
        Ok(match kind {
            ToolKind::Computer => ToolInvocation::Computer(parse_args(input)?),
            ToolKind::Bash => ToolInvocation::Bash(parse_args(input)?),
            ToolKind::Edit => ToolInvocation::Edit(parse_args(input)?),
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInvocation::Computer(_) => ToolKind::Computer,
            ToolInvocation::Bash(_) => ToolKind::Bash,
            ToolInvocation::Edit(_) => ToolKind::Edit,
        }
    }

    async fn run(&self, handle: &InstanceHandle) -> Result<ToolOutput, InstanceError> {
        match self {
            ToolInvocation::Computer(action) => handle.computer(action).await,
            ToolInvocation::Bash(command) => handle.bash(command).await,
            ToolInvocation::Edit(operation) => handle.edit(operation).await,
        }
    }
}

/// Executes tool calls against one instance with a per-call time bound.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run one tool call. Never fails: errors become the output's `error`.
    pub async fn execute(
        &self,
        handle: &InstanceHandle,
        name: &str,
        input: &serde_json::Value,
    ) -> ToolOutput {
        match self.try_execute(handle, name, input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %name, instance = %handle.id(), error = %e, "Tool call failed");
                ToolOutput::failure(e.to_string())
            }
        }
    }

    async fn try_execute(
        &self,
        handle: &InstanceHandle,
        name: &str,
        input: &serde_json::Value,
    ) -> Result<ToolOutput, InstanceError> {
        let invocation = ToolInvocation::parse(name, input)?;
        debug!(tool = %invocation.kind(), instance = %handle.id(), "Dispatching tool call");

        tokio::time::timeout(self.timeout, invocation.run(handle))
            .await
            .map_err(|_| InstanceError::Timeout {
                operation: invocation.kind().name(),
                after: self.timeout,
            })?
    }
}
