//! Assembles a streamed Messages API response into a `Completion`.

use serde_json::Value;

use crate::streaming::SseEvent;
use crate::{AiError, Completion, ContentBlock, StreamDelta, TokenUsage};

/// A content block while its deltas are still arriving.
#[derive(Debug)]
enum PartialBlock {
    Text(String),
    Thinking { thinking: String, signature: String },
    RedactedThinking(String),
    ToolUse { id: String, name: String, json: String },
}

impl PartialBlock {
    fn finish(self) -> Result<ContentBlock, AiError> {
        Ok(match self {
            PartialBlock::Text(text) => ContentBlock::Text { text },
            PartialBlock::Thinking {
                thinking,
                signature,
            } => ContentBlock::Thinking {
                thinking,
                signature,
            },
            PartialBlock::RedactedThinking(data) => ContentBlock::RedactedThinking { data },
            PartialBlock::ToolUse { id, name, json } => {
                let input = if json.trim().is_empty() {
                    Value::Object(Default::default())
                } else {
                    serde_json::from_str(&json).map_err(|e| {
                        AiError::ParseError(format!("tool input for {name}: {e}"))
                    })?
                };
                ContentBlock::ToolUse { id, name, input }
            }
        })
    }
}

/// Folds SSE events into content blocks, emitting deltas as they arrive.
#[derive(Debug, Default)]
pub struct ResponseAssembler {
    blocks: Vec<ContentBlock>,
    current: Option<PartialBlock>,
    stop_reason: Option<String>,
    usage: TokenUsage,
    stopped: bool,
    error: Option<AiError>,
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one event. Errors are latched and reported by `finish`.
    pub fn handle(&mut self, event: &SseEvent, on_delta: &dyn Fn(StreamDelta)) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.apply(event, on_delta) {
            self.error = Some(e);
        }
    }

    fn apply(&mut self, event: &SseEvent, on_delta: &dyn Fn(StreamDelta)) -> Result<(), AiError> {
        let data: Value = serde_json::from_str(&event.data)
            .map_err(|e| AiError::ParseError(format!("event data: {e}")))?;
        let kind = event
            .event
            .as_deref()
            .or_else(|| data["type"].as_str())
            .unwrap_or("");

        match kind {
            "message_start" => {
                let usage = &data["message"]["usage"];
                self.usage.input_tokens = usage["input_tokens"].as_u64().unwrap_or(0);
                self.usage.output_tokens = usage["output_tokens"].as_u64().unwrap_or(0);
            }
            "content_block_start" => {
                self.close_block()?;
                let block = &data["content_block"];
                self.current = Some(match block["type"].as_str().unwrap_or("") {
                    "text" => PartialBlock::Text(block["text"].as_str().unwrap_or("").to_string()),
                    "thinking" => PartialBlock::Thinking {
                        thinking: block["thinking"].as_str().unwrap_or("").to_string(),
                        signature: block["signature"].as_str().unwrap_or("").to_string(),
                    },
                    "redacted_thinking" => PartialBlock::RedactedThinking(
                        block["data"].as_str().unwrap_or("").to_string(),
                    ),
                    "tool_use" => PartialBlock::ToolUse {
                        id: block["id"].as_str().unwrap_or("").to_string(),
                        name: block["name"].as_str().unwrap_or("").to_string(),
                        json: String::new(),
                    },
                    other => {
                        return Err(AiError::ParseError(format!(
                            "unknown content block type: {other}"
                        )))
                    }
                });
            }
            "content_block_delta" => self.apply_delta(&data["delta"], on_delta)?,
            "content_block_stop" => self.close_block()?,
            "message_delta" => {
                if let Some(reason) = data["delta"]["stop_reason"].as_str() {
                    self.stop_reason = Some(reason.to_string());
                }
                if let Some(out) = data["usage"]["output_tokens"].as_u64() {
                    self.usage.output_tokens = out;
                }
            }
            "message_stop" => {
                self.close_block()?;
                self.stopped = true;
            }
            "error" => {
                let error = &data["error"];
                let message = error["message"].as_str().unwrap_or("unknown error");
                return Err(match error["type"].as_str() {
                    Some("overloaded_error") => AiError::Overloaded,
                    Some("rate_limit_error") => AiError::RateLimited,
                    Some(kind) => AiError::ApiError(format!("{kind}: {message}")),
                    None => AiError::ApiError(message.to_string()),
                });
            }
            // ping and future event types
            _ => {}
        }
        Ok(())
    }

    fn apply_delta(&mut self, delta: &Value, on_delta: &dyn Fn(StreamDelta)) -> Result<(), AiError> {
        let Some(current) = self.current.as_mut() else {
            return Err(AiError::ParseError("delta outside of a content block".into()));
        };

        match (delta["type"].as_str().unwrap_or(""), current) {
            ("text_delta", PartialBlock::Text(text)) => {
                let chunk = delta["text"].as_str().unwrap_or("");
                if !chunk.is_empty() {
                    text.push_str(chunk);
                    on_delta(StreamDelta::Text(chunk.to_string()));
                }
            }
            ("thinking_delta", PartialBlock::Thinking { thinking, .. }) => {
                let chunk = delta["thinking"].as_str().unwrap_or("");
                if !chunk.is_empty() {
                    thinking.push_str(chunk);
                    on_delta(StreamDelta::Reasoning(chunk.to_string()));
                }
            }
            ("signature_delta", PartialBlock::Thinking { signature, .. }) => {
                signature.push_str(delta["signature"].as_str().unwrap_or(""));
            }
            ("input_json_delta", PartialBlock::ToolUse { json, .. }) => {
                json.push_str(delta["partial_json"].as_str().unwrap_or(""));
            }
            (kind, _) => {
                return Err(AiError::ParseError(format!(
                    "delta {kind} does not match the open block"
                )))
            }
        }
        Ok(())
    }

    fn close_block(&mut self) -> Result<(), AiError> {
        if let Some(block) = self.current.take() {
            self.blocks.push(block.finish()?);
        }
        Ok(())
    }

    /// Produce the completion once the stream has ended.
    pub fn finish(mut self) -> Result<Completion, AiError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        if !self.stopped {
            return Err(AiError::ParseError(
                "stream ended before message_stop".into(),
            ));
        }
        Ok(Completion {
            content: self.blocks,
            stop_reason: self.stop_reason,
            usage: self.usage,
        })
    }
}
