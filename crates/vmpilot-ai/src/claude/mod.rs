//! Claude API client (Anthropic Messages API with computer-use tools).

mod api;
mod client;
mod config;
mod events;

pub use client::ClaudeClient;
pub use config::{ClaudeConfig, DEFAULT_API_URL};
pub use events::ResponseAssembler;
