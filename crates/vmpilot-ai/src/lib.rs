//! Sampling engine for vmpilot.
//!
//! Provides the LLM side of a computer-use session:
//! - The `Sampler` contract and an Anthropic Messages client
//! - Streaming (SSE) support with incremental text and reasoning deltas
//! - Content-block message model and an ordered, checked history
//! - Computer-use tool schemas per model generation
//! - Bounded retry with exponential backoff
//! - Token usage tracking

pub mod claude;
pub mod history;
pub mod message;
pub mod model;
pub mod prompt;
pub mod retry;
pub mod streaming;
pub mod token_tracker;
pub mod tools;

use async_trait::async_trait;

pub use claude::{ClaudeClient, ClaudeConfig};
pub use history::{History, HistoryError};
pub use message::{
    Completion, ContentBlock, ImageSource, Message, Role, StreamDelta, TokenUsage, ToolCall,
    ToolResult,
};
pub use model::{ModelChoice, ToolVersion, SUPPORTED_MODELS};
pub use retry::{sample_with_retry, RetryPolicy};
pub use token_tracker::TokenTracker;
pub use tools::{DisplaySize, ToolSchema, ToolSpec};

/// Everything one sampling step needs.
#[derive(Debug, Clone, Copy)]
pub struct SampleRequest<'a> {
    pub model: ModelChoice,
    pub system: &'a str,
    pub messages: &'a [Message],
    pub tools: &'a ToolSchema,
}

/// Callback receiving incremental output while a sample streams in.
pub type DeltaFn = dyn Fn(StreamDelta) + Send + Sync;

/// One invocation of the model over the current history.
///
/// Returns either final text or a set of tool calls; both are carried by
/// the completion's content blocks.
#[async_trait]
pub trait Sampler: Send + Sync {
    async fn sample(
        &self,
        request: &SampleRequest<'_>,
        on_delta: &DeltaFn,
    ) -> Result<Completion, AiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Rate limited")]
    RateLimited,
    #[error("Model overloaded")]
    Overloaded,
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Timeout")]
    Timeout,
    #[error("Invalid model name: {0}")]
    InvalidModel(String),
    #[error("Not configured: {0}")]
    NotConfigured(String),
}

impl AiError {
    /// Whether another attempt at the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::RateLimited
            | AiError::Overloaded
            | AiError::NetworkError(_)
            | AiError::ParseError(_)
            | AiError::Timeout => true,
            AiError::Http { status, .. } => *status >= 500,
            AiError::ApiError(_) | AiError::InvalidModel(_) | AiError::NotConfigured(_) => false,
        }
    }
}

impl From<AiError> for vmpilot_common::PilotError {
    fn from(e: AiError) -> Self {
        vmpilot_common::PilotError::Ai(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(AiError::RateLimited.is_retryable());
        assert!(AiError::Overloaded.is_retryable());
        assert!(AiError::Timeout.is_retryable());
        assert!(AiError::NetworkError("reset".into()).is_retryable());
        assert!(AiError::ParseError("truncated".into()).is_retryable());
        assert!(AiError::Http {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(!AiError::Http {
            status: 400,
            message: "bad request".into()
        }
        .is_retryable());
        assert!(!AiError::InvalidModel("gpt".into()).is_retryable());
        assert!(!AiError::NotConfigured("key".into()).is_retryable());
        assert!(!AiError::ApiError("invalid_request_error".into()).is_retryable());
    }

    #[test]
    fn http_error_display() {
        let err = AiError::Http {
            status: 401,
            message: "invalid x-api-key".into(),
        };
        assert_eq!(err.to_string(), "HTTP 401: invalid x-api-key");
    }
}
