//! Agent loop configuration.

use serde::{Deserialize, Serialize};

/// Sampling-loop behaviour for every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model used when the hello frame names none.
    pub default_model: String,
    pub max_tokens: u32,
    /// Token budget for extended thinking on `-thinking` models.
    pub thinking_budget: u32,
    /// Tool batches allowed per user turn before the loop stops.
    pub max_tool_rounds: u32,
    /// Messages allowed in one session's history.
    pub max_history_messages: u32,
    /// Screenshots kept in history; older ones are pruned.
    pub images_to_keep: u32,
    /// Screenshots are pruned in multiples of this.
    pub image_removal_chunk: u32,
    /// Run the tool calls of one sampling step concurrently.
    pub parallel_tool_calls: bool,
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_model: "claude-3-7-sonnet-20250219".into(),
            max_tokens: 4096,
            thinking_budget: 1024,
            max_tool_rounds: 50,
            max_history_messages: 200,
            images_to_keep: 3,
            image_removal_chunk: 3,
            parallel_tool_calls: false,
            system_prompt: None,
        }
    }
}
