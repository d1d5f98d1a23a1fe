//! Supported models and the computer-use tool generation each expects.

use std::fmt;

use crate::AiError;

/// Model names accepted from clients.
pub const SUPPORTED_MODELS: &[&str] = &[
    "claude-3-7-sonnet-20250219",
    "claude-3-7-sonnet-20250219-thinking",
    "claude-3-5-sonnet-20241022",
];

/// Computer-use tool generation, tied to a beta flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolVersion {
    V20241022,
    V20250124,
}

impl ToolVersion {
    pub fn beta_flag(self) -> &'static str {
        match self {
            ToolVersion::V20241022 => "computer-use-2024-10-22",
            ToolVersion::V20250124 => "computer-use-2025-01-24",
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            ToolVersion::V20241022 => "20241022",
            ToolVersion::V20250124 => "20250124",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    Sonnet37,
    /// Claude 3.7 Sonnet with extended thinking enabled.
    Sonnet37Thinking,
    Sonnet35,
}

impl ModelChoice {
    pub fn from_name(name: &str) -> Result<Self, AiError> {
        match name {
            "claude-3-7-sonnet-20250219" => Ok(ModelChoice::Sonnet37),
            "claude-3-7-sonnet-20250219-thinking" => Ok(ModelChoice::Sonnet37Thinking),
            "claude-3-5-sonnet-20241022" => Ok(ModelChoice::Sonnet35),
            other => Err(AiError::InvalidModel(other.to_string())),
        }
    }

    /// Client-facing name, including the `-thinking` marker.
    pub fn name(self) -> &'static str {
        match self {
            ModelChoice::Sonnet37 => "claude-3-7-sonnet-20250219",
            ModelChoice::Sonnet37Thinking => "claude-3-7-sonnet-20250219-thinking",
            ModelChoice::Sonnet35 => "claude-3-5-sonnet-20241022",
        }
    }

    /// Model id sent to the API.
    pub fn api_name(self) -> &'static str {
        match self {
            ModelChoice::Sonnet37 | ModelChoice::Sonnet37Thinking => "claude-3-7-sonnet-20250219",
            ModelChoice::Sonnet35 => "claude-3-5-sonnet-20241022",
        }
    }

    pub fn thinking_enabled(self) -> bool {
        matches!(self, ModelChoice::Sonnet37Thinking)
    }

    pub fn tool_version(self) -> ToolVersion {
        match self {
            ModelChoice::Sonnet37 | ModelChoice::Sonnet37Thinking => ToolVersion::V20250124,
            ModelChoice::Sonnet35 => ToolVersion::V20241022,
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
