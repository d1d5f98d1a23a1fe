pub mod errors;
pub mod id;
pub mod tool;

pub use errors::{ConfigError, PilotError};
pub use id::{new_id, SessionId};
pub use tool::ToolKind;

pub type Result<T> = std::result::Result<T, PilotError>;
