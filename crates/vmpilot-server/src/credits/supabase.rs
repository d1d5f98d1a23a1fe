//! Credits kept in Supabase: `keys` maps an API key to a user, `users`
//! holds `agent_credits`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use vmpilot_common::ConfigError;

use super::{CreditError, CreditStore};

/// Optimistic-update attempts before giving up on a contended balance.
const MAX_DEBIT_ATTEMPTS: usize = 3;

pub struct SupabaseCreditStore {
    url: String,
    key: String,
    http: reqwest::Client,
}

impl fmt::Debug for SupabaseCreditStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseCreditStore")
            .field("url", &self.url)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SupabaseCreditStore {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Result<Self, CreditError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| CreditError::Store(format!("HTTP client: {e}")))?;
        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            key: key.into(),
            http,
        })
    }

    /// Build from `SUPABASE_URL` and `SUPABASE_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| ConfigError::MissingCredential("SUPABASE_URL".into()))?;
        let key = std::env::var("SUPABASE_KEY")
            .map_err(|_| ConfigError::MissingCredential("SUPABASE_KEY".into()))?;
        Self::new(url, key).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.table_url(table))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    async fn rows(&self, builder: reqwest::RequestBuilder) -> Result<Vec<Value>, CreditError> {
        let response = builder
            .send()
            .await
            .map_err(|e| CreditError::Store(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(CreditError::Store(format!("HTTP {status}: {text}")));
        }
        response
            .json()
            .await
            .map_err(|e| CreditError::Store(format!("invalid JSON: {e}")))
    }

    async fn user_id(&self, api_key: &str) -> Result<String, CreditError> {
        let rows = self
            .rows(
                self.request(reqwest::Method::GET, "keys")
                    .query(&[("select", "user_id"), ("api_key", format!("eq.{api_key}").as_str())]),
            )
            .await?;
        rows.first()
            .and_then(|row| match &row["user_id"] {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or(CreditError::UnknownAccount)
    }

    async fn user_credits(&self, user_id: &str) -> Result<f64, CreditError> {
        let rows = self
            .rows(
                self.request(reqwest::Method::GET, "users")
                    .query(&[("select", "agent_credits"), ("id", format!("eq.{user_id}").as_str())]),
            )
            .await?;
        parse_credits(rows.first()).ok_or(CreditError::UnknownAccount)
    }
}

fn parse_credits(row: Option<&Value>) -> Option<f64> {
    row.and_then(|row| row["agent_credits"].as_f64())
}

#[async_trait]
impl CreditStore for SupabaseCreditStore {
    async fn balance(&self, account: &str) -> Result<f64, CreditError> {
        let user_id = self.user_id(account).await?;
        self.user_credits(&user_id).await
    }

    async fn debit(&self, account: &str, amount: f64) -> Result<f64, CreditError> {
        let user_id = self.user_id(account).await?;

        for attempt in 1..=MAX_DEBIT_ATTEMPTS {
            let balance = self.user_credits(&user_id).await?;
            if balance < amount {
                return Err(CreditError::InsufficientFunds {
                    balance,
                    required: amount,
                });
            }

            // Only matches if nobody changed the balance since we read it.
            let remaining = balance - amount;
            let rows = self
                .rows(
                    self.request(reqwest::Method::PATCH, "users")
                        .query(&[
                            ("id", format!("eq.{user_id}")),
                            ("agent_credits", format!("eq.{balance}")),
                        ])
                        .header("Prefer", "return=representation")
                        .json(&serde_json::json!({ "agent_credits": remaining })),
                )
                .await?;

            if let Some(updated) = parse_credits(rows.first()) {
                return Ok(updated);
            }
            debug!(attempt, "Credit balance changed concurrently, retrying debit");
        }

        Err(CreditError::Store(
            "balance kept changing during debit".into(),
        ))
    }
}
