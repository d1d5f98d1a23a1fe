//! Remote-instance side of a computer-use session.
//!
//! Provides:
//! - The `InstanceProvider` contract and a REST implementation
//! - `InstanceHandle`, an exclusively owned instance released exactly once
//! - Typed tool arguments for the computer, shell and editor surfaces
//! - `ToolDispatcher`, which runs a model tool call under a timeout and
//!   always yields a `ToolOutput`

pub mod dispatch;
pub mod error;
pub mod handle;
pub mod http;
pub mod provider;
pub mod tool;

pub use dispatch::{ToolDispatcher, ToolInvocation};
pub use error::InstanceError;
pub use handle::{InstanceHandle, InstanceTimeouts};
pub use http::HttpInstanceProvider;
pub use provider::{InstanceInfo, InstanceProvider, ProvisionOptions};
pub use tool::{BashCommand, ComputerAction, EditOperation, ScrollDirection, ToolOutput};

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
