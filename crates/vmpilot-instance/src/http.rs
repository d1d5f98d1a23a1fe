//! REST client for a hosted VM provider.
//!
//! Every call authenticates with the per-session key via `x-api-key`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{
    BashCommand, ComputerAction, EditOperation, InstanceError, InstanceInfo, InstanceProvider,
    ProvisionOptions, ToolOutput,
};

/// Hosted VM provider reached over HTTP.
pub struct HttpInstanceProvider {
    base_url: String,
    http: reqwest::Client,
}

impl HttpInstanceProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, InstanceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| InstanceError::Network(format!("HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn instance_url(&self, instance: &InstanceInfo, path: &str) -> String {
        format!("{}/v1/instance/{}/{}", self.base_url, instance.id, path)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        api_key: &str,
        body: &B,
    ) -> Result<serde_json::Value, InstanceError> {
        let response = self
            .http
            .post(url)
            .header("x-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| InstanceError::Network(e.to_string()))?;
        read_json(response).await
    }

    async fn get_json(&self, url: &str, api_key: &str) -> Result<serde_json::Value, InstanceError> {
        let response = self
            .http
            .get(url)
            .header("x-api-key", api_key)
            .send()
            .await
            .map_err(|e| InstanceError::Network(e.to_string()))?;
        read_json(response).await
    }

    async fn tool_call<B: Serialize + ?Sized>(
        &self,
        instance: &InstanceInfo,
        path: &str,
        body: &B,
    ) -> Result<ToolOutput, InstanceError> {
        let url = self.instance_url(instance, path);
        let json = self.post_json(&url, &instance.api_key, body).await?;
        serde_json::from_value(json).map_err(|e| InstanceError::Remote(format!("bad {path} response: {e}")))
    }
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, InstanceError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v["detail"].as_str().map(String::from))
            .unwrap_or_else(|| text.chars().take(200).collect());
        return Err(InstanceError::Remote(format!("HTTP {status}: {detail}")));
    }
    response
        .json()
        .await
        .map_err(|e| InstanceError::Remote(format!("invalid JSON: {e}")))
}

/// Launch times arrive either as RFC 3339 or as a naive UTC timestamp.
pub(crate) fn parse_launch_time(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return Utc::now();
    };
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return t.with_timezone(&Utc);
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(t) => t.and_utc(),
        Err(_) => Utc::now(),
    }
}

#[async_trait]
impl InstanceProvider for HttpInstanceProvider {
    async fn provision(&self, opts: &ProvisionOptions) -> Result<InstanceInfo, InstanceError> {
        let url = format!("{}/v1/start", self.base_url);
        debug!(instance_type = %opts.instance_type, "Provisioning instance");

        let json = self
            .post_json(
                &url,
                &opts.api_key,
                &serde_json::json!({ "instance_type": opts.instance_type }),
            )
            .await
            .map_err(|e| InstanceError::Provision(e.to_string()))?;

        let id = json["id"]
            .as_str()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| InstanceError::Provision("response has no instance id".into()))?
            .to_string();

        Ok(InstanceInfo {
            id,
            launch_time: parse_launch_time(json["launch_time"].as_str()),
            api_key: opts.api_key.clone(),
        })
    }

    async fn release(&self, instance: &InstanceInfo) -> Result<(), InstanceError> {
        let url = self.instance_url(instance, "stop");
        self.post_json(&url, &instance.api_key, &serde_json::json!({}))
            .await
            .map(|_| ())
    }

    async fn stream_url(&self, instance: &InstanceInfo) -> Result<String, InstanceError> {
        let url = self.instance_url(instance, "stream_url");
        let json = self.get_json(&url, &instance.api_key).await?;
        json["stream_url"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| InstanceError::Remote("response has no stream_url".into()))
    }

    async fn authenticate_browser(
        &self,
        instance: &InstanceInfo,
        auth_state_id: &str,
    ) -> Result<(), InstanceError> {
        let start = self.instance_url(instance, "browser/start");
        self.post_json(&start, &instance.api_key, &serde_json::json!({}))
            .await?;

        let auth = self.instance_url(instance, "browser/authenticate");
        self.post_json(
            &auth,
            &instance.api_key,
            &serde_json::json!({ "auth_state_id": auth_state_id }),
        )
        .await?;
        Ok(())
    }

    async fn computer(
        &self,
        instance: &InstanceInfo,
        action: &ComputerAction,
    ) -> Result<ToolOutput, InstanceError> {
        self.tool_call(instance, "computer", action).await
    }

    async fn bash(
        &self,
        instance: &InstanceInfo,
        command: &BashCommand,
    ) -> Result<ToolOutput, InstanceError> {
        self.tool_call(instance, "bash", command).await
    }

    async fn edit(
        &self,
        instance: &InstanceInfo,
        operation: &EditOperation,
    ) -> Result<ToolOutput, InstanceError> {
        self.tool_call(instance, "edit", operation).await
    }
}
