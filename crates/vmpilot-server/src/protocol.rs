//! Client wire protocol. Every frame is a JSON text frame.

use serde::{Deserialize, Serialize};

/// First frame a client sends.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Hello {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub auth_state_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Pause,
    Terminate,
}

/// Frames accepted after the hello.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ClientFrame {
    Command { command: Command },
    Message { message: String },
}

/// Why a session ended. Carried by the terminal frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminateReason {
    ClientTerminated,
    ClientDisconnected,
    ProtocolError,
    HelloTimeout,
    InvalidModel,
    ProvisionFailed,
    SamplingFailed,
    InsufficientCredits,
    CreditError,
    HistoryLimit,
    IdleTimeout,
    Shutdown,
}

impl TerminateReason {
    /// Whether the client can still receive a terminal frame.
    pub fn client_reachable(self) -> bool {
        self != TerminateReason::ClientDisconnected
    }
}

/// Frames the server sends, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Status {
        content: String,
    },
    InstanceInfo {
        url: Option<String>,
        instance_id: String,
        launch_time: String,
    },
    Text {
        content: String,
    },
    Reasoning {
        content: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        has_image: bool,
    },
    LoopComplete {
        content: String,
    },
    LoopPaused {
        content: String,
    },
    /// Non-fatal problem; the session continues.
    Error {
        message: String,
    },
    /// Always the last frame of a session.
    Terminated {
        reason: TerminateReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ServerFrame {
    pub fn status(content: impl Into<String>) -> Self {
        ServerFrame::Status {
            content: content.into(),
        }
    }

    pub fn loop_complete() -> Self {
        ServerFrame::LoopComplete {
            content: "Loop complete".into(),
        }
    }

    pub fn loop_paused() -> Self {
        ServerFrame::LoopPaused {
            content: "Loop paused".into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerFrame::Error {
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ServerFrame::Terminated { .. })
    }
}
