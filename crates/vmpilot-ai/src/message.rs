//! Conversation message model.
//!
//! Content blocks serialize to the Anthropic Messages wire format, so a
//! history can be sent as-is.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Base64 image payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

impl ImageSource {
    pub fn png_base64(data: impl Into<String>) -> Self {
        Self {
            kind: "base64".into(),
            media_type: "image/png".into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: Vec<ContentBlock>,
        #[serde(default)]
        is_error: bool,
    },
    Thinking {
        thinking: String,
        signature: String,
    },
    RedactedThinking {
        data: String,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ContentBlock::Image { .. })
    }
}

/// A turn in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// A user-role message carrying one result block per tool call.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::User,
            content: results.into_iter().map(ToolResult::into_block).collect(),
        }
    }

    /// Tool calls requested by this message, in emission order.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        collect_tool_calls(&self.content)
    }

    pub fn is_tool_result(&self) -> bool {
        self.role == Role::User
            && !self.content.is_empty()
            && self
                .content
                .iter()
                .all(|b| matches!(b, ContentBlock::ToolResult { .. }))
    }

    /// Ids of the tool calls this message answers, in order.
    pub fn tool_result_ids(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Concatenated text blocks.
    pub fn text(&self) -> String {
        collect_text(&self.content)
    }
}

/// A request for remote action emitted by a sampling step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// Outcome of one tool call, before it is folded into a content block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub output: Option<String>,
    pub error: Option<String>,
    pub base64_image: Option<String>,
}

impl ToolResult {
    pub fn success(tool_use_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            output: Some(output.into()),
            ..Default::default()
        }
    }

    pub fn failure(tool_use_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Build the wire block. An error replaces any output or image.
    pub fn into_block(self) -> ContentBlock {
        let mut content = Vec::new();
        let is_error = self.error.is_some();

        if let Some(error) = self.error {
            content.push(ContentBlock::text(error));
        } else {
            if let Some(output) = self.output.filter(|o| !o.is_empty()) {
                content.push(ContentBlock::text(output));
            }
            if let Some(image) = self.base64_image {
                content.push(ContentBlock::Image {
                    source: ImageSource::png_base64(image),
                });
            }
        }

        ContentBlock::ToolResult {
            tool_use_id: self.tool_use_id,
            content,
            is_error,
        }
    }
}

/// Incremental output surfaced while a sample streams.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamDelta {
    Text(String),
    Reasoning(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// The model's answer to one sampling step.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    pub usage: TokenUsage,
}

impl Completion {
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        collect_tool_calls(&self.content)
    }

    /// True when the model yielded a final message with no tool calls.
    pub fn is_final(&self) -> bool {
        !self
            .content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }

    pub fn text(&self) -> String {
        collect_text(&self.content)
    }
}

fn collect_tool_calls(blocks: &[ContentBlock]) -> Vec<ToolCall> {
    blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::ToolUse { id, name, input } => Some(ToolCall {
                id: id.clone(),
                name: name.clone(),
                input: input.clone(),
            }),
            _ => None,
        })
        .collect()
}

fn collect_text(blocks: &[ContentBlock]) -> String {
    blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_use_serializes_to_wire_format() {
        let block = ContentBlock::ToolUse {
            id: "toolu_1".into(),
            name: "computer".into(),
            input: json!({"action": "screenshot"}),
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_use");
        assert_eq!(value["id"], "toolu_1");
        assert_eq!(value["input"]["action"], "screenshot");
    }

    #[test]
    fn failed_tool_result_carries_only_error_text() {
        let mut result = ToolResult::failure("toolu_1", "timed out after 60s");
        result.output = Some("partial".into());
        result.base64_image = Some("AAAA".into());

        let value = serde_json::to_value(result.into_block()).unwrap();
        assert_eq!(value["type"], "tool_result");
        assert_eq!(value["is_error"], true);
        assert_eq!(value["content"].as_array().unwrap().len(), 1);
        assert_eq!(value["content"][0]["text"], "timed out after 60s");
    }

    #[test]
    fn successful_tool_result_with_screenshot() {
        let result = ToolResult {
            tool_use_id: "toolu_2".into(),
            output: Some("clicked".into()),
            error: None,
            base64_image: Some("iVBORw0KGgo".into()),
        };
        let block = result.into_block();
        let ContentBlock::ToolResult {
            content, is_error, ..
        } = &block
        else {
            panic!("expected tool result block");
        };
        assert!(!is_error);
        assert_eq!(content.len(), 2);
        assert!(content[1].is_image());

        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["content"][1]["source"]["type"], "base64");
        assert_eq!(value["content"][1]["source"]["media_type"], "image/png");
    }

    #[test]
    fn empty_output_is_omitted() {
        let block = ToolResult::success("toolu_3", "").into_block();
        let ContentBlock::ToolResult { content, .. } = block else {
            panic!("expected tool result block");
        };
        assert!(content.is_empty());
    }

    #[test]
    fn completion_with_tool_use_is_not_final() {
        let completion = Completion {
            content: vec![
                ContentBlock::text("Let me look."),
                ContentBlock::ToolUse {
                    id: "a".into(),
                    name: "computer".into(),
                    input: json!({}),
                },
            ],
            stop_reason: Some("tool_use".into()),
            usage: TokenUsage::default(),
        };
        assert!(!completion.is_final());
        assert_eq!(completion.tool_calls().len(), 1);
        assert_eq!(completion.text(), "Let me look.");
    }

    #[test]
    fn tool_results_message_is_recognised() {
        let msg = Message::tool_results(vec![
            ToolResult::success("a", "ok"),
            ToolResult::failure("b", "boom"),
        ]);
        assert!(msg.is_tool_result());
        assert_eq!(msg.tool_result_ids(), vec!["a", "b"]);
        assert!(!Message::user_text("hi").is_tool_result());
    }

    #[test]
    fn message_round_trips_through_json() {
        let msg = Message::assistant(vec![
            ContentBlock::Thinking {
                thinking: "hmm".into(),
                signature: "sig".into(),
            },
            ContentBlock::text("done"),
        ]);
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn token_usage_total() {
        let usage = TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
        };
        assert_eq!(usage.total_tokens(), 15);
    }
}
