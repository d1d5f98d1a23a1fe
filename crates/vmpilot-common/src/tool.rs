//! Tool kinds shared by the sampling schema and the instance dispatcher.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of control surfaces a model can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Pointer, keyboard and screenshot control.
    Computer,
    /// Shell command execution.
    Bash,
    /// File viewing and editing.
    Edit,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::Computer, ToolKind::Bash, ToolKind::Edit];

    /// Tool name as the model sees it.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Computer => "computer",
            ToolKind::Bash => "bash",
            ToolKind::Edit => "str_replace_editor",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(ToolKind::from_name("browser"), None);
        assert_eq!(ToolKind::from_name(""), None);
    }

    #[test]
    fn editor_uses_model_facing_name() {
        assert_eq!(ToolKind::Edit.to_string(), "str_replace_editor");
    }
}
