//! Credit accounting configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which credit store backs the policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CreditBackend {
    #[default]
    Disabled,
    Memory,
    Supabase,
}

/// When credits are consulted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreditPolicyKind {
    /// Check the balance once when the session opens.
    #[default]
    Admission,
    /// Debit before every user turn.
    PerTurn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditsConfig {
    pub backend: CreditBackend,
    pub policy: CreditPolicyKind,
    pub cost_per_turn: f64,
    /// Seed balances for the memory backend, keyed by api key.
    pub accounts: HashMap<String, f64>,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            backend: CreditBackend::Disabled,
            policy: CreditPolicyKind::Admission,
            cost_per_turn: 1.0,
            accounts: HashMap::new(),
        }
    }
}
