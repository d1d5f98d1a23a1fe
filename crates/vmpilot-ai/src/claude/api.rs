//! Sampler implementation for ClaudeClient (streaming Messages API).

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::streaming::{parse_sse_stream, SseEvent};
use crate::{AiError, Completion, DeltaFn, SampleRequest, Sampler};

use super::client::ClaudeClient;
use super::events::ResponseAssembler;

#[async_trait]
impl Sampler for ClaudeClient {
    async fn sample(
        &self,
        request: &SampleRequest<'_>,
        on_delta: &DeltaFn,
    ) -> Result<Completion, AiError> {
        let body = self.build_request_body(request);
        let headers = self.headers(request.tools.beta_flag())?;

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Claude API streaming request"
        );

        let response = self
            .http
            .post(&self.config.api_url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout
                } else {
                    AiError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &text));
        }

        let mut assembler = ResponseAssembler::new();
        parse_sse_stream(response, |event: SseEvent| {
            assembler.handle(&event, on_delta);
        })
        .await?;

        let completion = assembler.finish()?;
        if completion.usage.total_tokens() == 0 {
            warn!("No usage data received in streaming response");
        }
        debug!(
            stop_reason = ?completion.stop_reason,
            blocks = completion.content.len(),
            input_tokens = completion.usage.input_tokens,
            output_tokens = completion.usage.output_tokens,
            "Claude API response complete"
        );
        Ok(completion)
    }
}

/// Map a non-2xx status to an error, keeping a short excerpt of the body.
pub(crate) fn status_error(status: u16, body: &str) -> AiError {
    match status {
        429 => AiError::RateLimited,
        529 => AiError::Overloaded,
        _ => {
            let message = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(String::from))
                .unwrap_or_else(|| body.chars().take(200).collect());
            AiError::Http { status, message }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttling_statuses_map_to_retryable_errors() {
        assert!(matches!(status_error(429, ""), AiError::RateLimited));
        assert!(matches!(status_error(529, ""), AiError::Overloaded));
    }

    #[test]
    fn api_error_message_is_extracted() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let err = status_error(401, body);
        assert_eq!(err.to_string(), "HTTP 401: invalid x-api-key");
        assert!(!err.is_retryable());
    }

    #[test]
    fn plain_body_is_truncated() {
        let body = "x".repeat(500);
        let AiError::Http { status, message } = status_error(502, &body) else {
            panic!("expected http error");
        };
        assert_eq!(status, 502);
        assert_eq!(message.len(), 200);
    }
}
