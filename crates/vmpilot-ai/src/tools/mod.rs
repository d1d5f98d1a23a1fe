//! Computer-use tool definitions exposed to the model.
//!
//! These are Anthropic-defined tools: the schema is implied by the `type`
//! field, so only the type, name and display geometry are sent.

use serde::{Deserialize, Serialize};
use vmpilot_common::ToolKind;

use crate::model::ToolVersion;

/// Screen geometry of the remote instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplaySize {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub kind: ToolKind,
    pub version: ToolVersion,
    pub display: DisplaySize,
}

impl ToolSpec {
    /// Versioned tool type, e.g. `computer_20250124`.
    pub fn api_type(&self) -> String {
        let base = match self.kind {
            ToolKind::Computer => "computer",
            ToolKind::Bash => "bash",
            ToolKind::Edit => "text_editor",
        };
        format!("{base}_{}", self.version.suffix())
    }

    /// Convert to the Claude API format.
    pub fn to_claude_tool(&self) -> serde_json::Value {
        let mut tool = serde_json::json!({
            "type": self.api_type(),
            "name": self.kind.name(),
        });
        if self.kind == ToolKind::Computer {
            tool["display_width_px"] = serde_json::json!(self.display.width);
            tool["display_height_px"] = serde_json::json!(self.display.height);
            tool["display_number"] = serde_json::json!(1);
        }
        tool
    }
}

/// The tool set offered on every sampling step of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    specs: Vec<ToolSpec>,
    version: ToolVersion,
}

impl ToolSchema {
    /// Computer, shell and editor tools for one model generation.
    pub fn computer_use(version: ToolVersion, display: DisplaySize) -> Self {
        let specs = ToolKind::ALL
            .into_iter()
            .map(|kind| ToolSpec {
                kind,
                version,
                display,
            })
            .collect();
        Self { specs, version }
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn beta_flag(&self) -> &'static str {
        self.version.beta_flag()
    }

    pub fn to_claude_tools(&self) -> Vec<serde_json::Value> {
        self.specs.iter().map(ToolSpec::to_claude_tool).collect()
    }
}
