//! Credit accounting: a pluggable store and the policy that consults it.

mod memory;
mod policy;
mod supabase;

use async_trait::async_trait;

pub use memory::MemoryCreditStore;
pub use policy::CreditPolicy;
pub use supabase::SupabaseCreditStore;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreditError {
    #[error("insufficient credits: balance {balance}, required {required}")]
    InsufficientFunds { balance: f64, required: f64 },

    #[error("unknown account")]
    UnknownAccount,

    #[error("credit store error: {0}")]
    Store(String),
}

impl CreditError {
    /// Errors that mean "this client may not proceed", as opposed to a
    /// store outage.
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            CreditError::InsufficientFunds { .. } | CreditError::UnknownAccount
        )
    }
}

impl From<CreditError> for vmpilot_common::PilotError {
    fn from(e: CreditError) -> Self {
        vmpilot_common::PilotError::Credits(e.to_string())
    }
}

/// Balance lookup and debit, keyed by the client's API key.
#[async_trait]
pub trait CreditStore: Send + Sync {
    async fn balance(&self, account: &str) -> Result<f64, CreditError>;

    /// Debit `amount`, failing without side effects when the balance is
    /// short. Returns the remaining balance.
    async fn debit(&self, account: &str, amount: f64) -> Result<f64, CreditError>;
}
