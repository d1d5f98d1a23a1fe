//! Typed arguments for the three control surfaces, and their output.
//!
//! Arguments deserialize directly from the `input` of a model tool call.

use serde::{Deserialize, Serialize};

use crate::InstanceError;

/// Screen position `[x, y]` in pixels.
pub type Coordinate = [i32; 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// Pointer, keyboard and screen actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ComputerAction {
    Key {
        text: String,
    },
    Type {
        text: String,
    },
    MouseMove {
        coordinate: Coordinate,
    },
    LeftClick {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinate: Option<Coordinate>,
        /// Modifier keys held during the click.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    RightClick {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinate: Option<Coordinate>,
    },
    MiddleClick {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinate: Option<Coordinate>,
    },
    DoubleClick {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinate: Option<Coordinate>,
    },
    TripleClick {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinate: Option<Coordinate>,
    },
    LeftClickDrag {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_coordinate: Option<Coordinate>,
        coordinate: Coordinate,
    },
    LeftMouseDown,
    LeftMouseUp,
    Scroll {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinate: Option<Coordinate>,
        scroll_direction: ScrollDirection,
        scroll_amount: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    HoldKey {
        text: String,
        duration: f64,
    },
    Wait {
        duration: f64,
    },
    Screenshot,
    CursorPosition,
}

impl ComputerAction {
    pub fn name(&self) -> &'static str {
        match self {
            ComputerAction::Key { .. } => "key",
            ComputerAction::Type { .. } => "type",
            ComputerAction::MouseMove { .. } => "mouse_move",
            ComputerAction::LeftClick { .. } => "left_click",
            ComputerAction::RightClick { .. } => "right_click",
            ComputerAction::MiddleClick { .. } => "middle_click",
            ComputerAction::DoubleClick { .. } => "double_click",
            ComputerAction::TripleClick { .. } => "triple_click",
            ComputerAction::LeftClickDrag { .. } => "left_click_drag",
            ComputerAction::LeftMouseDown => "left_mouse_down",
            ComputerAction::LeftMouseUp => "left_mouse_up",
            ComputerAction::Scroll { .. } => "scroll",
            ComputerAction::HoldKey { .. } => "hold_key",
            ComputerAction::Wait { .. } => "wait",
            ComputerAction::Screenshot => "screenshot",
            ComputerAction::CursorPosition => "cursor_position",
        }
    }

    fn check(&self) -> Result<(), InstanceError> {
        match self {
            ComputerAction::Key { text } | ComputerAction::Type { text } if text.is_empty() => {
                Err(InstanceError::InvalidArguments(format!(
                    "{} requires non-empty text",
                    self.name()
                )))
            }
            ComputerAction::HoldKey { duration, .. } | ComputerAction::Wait { duration }
                if !(0.0..=100.0).contains(duration) =>
            {
                Err(InstanceError::InvalidArguments(format!(
                    "{} duration must be between 0 and 100 seconds",
                    self.name()
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Shell command, or a restart of the shell session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BashCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub restart: bool,
}

impl BashCommand {
    pub fn run(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            restart: false,
        }
    }

    fn check(&self) -> Result<(), InstanceError> {
        match (&self.command, self.restart) {
            (_, true) => Ok(()),
            (Some(cmd), false) if !cmd.trim().is_empty() => Ok(()),
            _ => Err(InstanceError::InvalidArguments(
                "bash requires a command or restart".into(),
            )),
        }
    }
}

/// File editor operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditOperation {
    View {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        view_range: Option<[i64; 2]>,
    },
    Create {
        path: String,
        file_text: String,
    },
    StrReplace {
        path: String,
        old_str: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        new_str: Option<String>,
    },
    Insert {
        path: String,
        insert_line: u64,
        new_str: String,
    },
    UndoEdit {
        path: String,
    },
}

impl EditOperation {
    pub fn path(&self) -> &str {
        match self {
            EditOperation::View { path, .. }
            | EditOperation::Create { path, .. }
            | EditOperation::StrReplace { path, .. }
            | EditOperation::Insert { path, .. }
            | EditOperation::UndoEdit { path } => path,
        }
    }

    fn check(&self) -> Result<(), InstanceError> {
        if !self.path().starts_with('/') {
            return Err(InstanceError::InvalidArguments(format!(
                "path must be absolute: {}",
                self.path()
            )));
        }
        Ok(())
    }
}

/// Parse and validate tool input.
pub(crate) fn parse_args<T>(input: &serde_json::Value) -> Result<T, InstanceError>
where
    T: serde::de::DeserializeOwned + Validate,
{
    let args: T = serde_json::from_value(input.clone())
        .map_err(|e| InstanceError::InvalidArguments(e.to_string()))?;
    args.validate()?;
    Ok(args)
}

pub(crate) trait Validate {
    fn validate(&self) -> Result<(), InstanceError>;
}

impl Validate for ComputerAction {
    fn validate(&self) -> Result<(), InstanceError> {
        self.check()
    }
}

impl Validate for BashCommand {
    fn validate(&self) -> Result<(), InstanceError> {
        self.check()
    }
}

impl Validate for EditOperation {
    fn validate(&self) -> Result<(), InstanceError> {
        self.check()
    }
}

/// Result of one remote action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub base64_image: Option<String>,
}

impl ToolOutput {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn screenshot(base64_image: impl Into<String>) -> Self {
        Self {
            base64_image: Some(base64_image.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
