//! Claude API client struct and request building.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use crate::{AiError, SampleRequest};

use super::config::ClaudeConfig;

pub(crate) const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude API client.
pub struct ClaudeClient {
    pub(crate) config: ClaudeConfig,
    pub(crate) http: reqwest::Client,
}

impl ClaudeClient {
    pub fn new(config: ClaudeConfig) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AiError::NotConfigured(format!("HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClaudeConfig {
        &self.config
    }

    /// Headers for one request. The beta flag follows the tool generation.
    pub(crate) fn headers(&self, beta_flag: &str) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", header_value(&self.config.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert("anthropic-beta", header_value(beta_flag)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Build the JSON request body for the Messages API.
    pub(crate) fn build_request_body(&self, request: &SampleRequest<'_>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model.api_name(),
            "max_tokens": self.config.max_tokens,
            "messages": request.messages,
            "tools": request.tools.to_claude_tools(),
            "stream": true,
        });

        if !request.system.is_empty() {
            body["system"] = serde_json::json!(request.system);
        }

        if request.model.thinking_enabled() {
            body["thinking"] = serde_json::json!({
                "type": "enabled",
                "budget_tokens": self.config.thinking_budget,
            });
        }

        body
    }
}

fn header_value(value: &str) -> Result<HeaderValue, AiError> {
    HeaderValue::from_str(value)
        .map_err(|_| AiError::NotConfigured("header contains invalid characters".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DisplaySize, Message, ModelChoice, ToolSchema};

    fn client() -> ClaudeClient {
        ClaudeClient::new(ClaudeConfig::new("sk-ant-test").with_thinking_budget(2048)).unwrap()
    }

    #[test]
    fn body_uses_api_model_and_streams() {
        let model = ModelChoice::Sonnet37;
        let tools = ToolSchema::computer_use(model.tool_version(), DisplaySize::default());
        let messages = vec![Message::user_text("open google.com")];
        let request = SampleRequest {
            model,
            system: "You are operating a VM.",
            messages: &messages,
            tools: &tools,
        };

        let body = client().build_request_body(&request);
        assert_eq!(body["model"], "claude-3-7-sonnet-20250219");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["system"], "You are operating a VM.");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"][0]["text"], "open google.com");
        assert_eq!(body["tools"].as_array().unwrap().len(), 3);
        assert!(body.get("thinking").is_none());
    }

    #[test]
    fn thinking_model_enables_budget() {
        let model = ModelChoice::Sonnet37Thinking;
        let tools = ToolSchema::computer_use(model.tool_version(), DisplaySize::default());
        let request = SampleRequest {
            model,
            system: "",
            messages: &[],
            tools: &tools,
        };

        let body = client().build_request_body(&request);
        assert_eq!(body["model"], "claude-3-7-sonnet-20250219");
        assert_eq!(body["thinking"]["type"], "enabled");
        assert_eq!(body["thinking"]["budget_tokens"], 2048);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn headers_carry_beta_flag() {
        let headers = client().headers("computer-use-2024-10-22").unwrap();
        assert_eq!(headers["x-api-key"], "sk-ant-test");
        assert_eq!(headers["anthropic-version"], ANTHROPIC_VERSION);
        assert_eq!(headers["anthropic-beta"], "computer-use-2024-10-22");
    }

    #[test]
    fn invalid_key_is_rejected_at_request_time() {
        let client = ClaudeClient::new(ClaudeConfig::new("bad\nkey")).unwrap();
        assert!(matches!(
            client.headers("computer-use-2025-01-24"),
            Err(AiError::NotConfigured(_))
        ));
    }
}
