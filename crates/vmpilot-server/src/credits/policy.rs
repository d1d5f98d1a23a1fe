//! When and how much to charge.

use std::sync::Arc;

use tracing::{debug, info};
use vmpilot_config::schema::{CreditPolicyKind, CreditsConfig};

use super::{CreditError, CreditStore};

pub struct CreditPolicy {
    kind: CreditPolicyKind,
    cost: f64,
    store: Arc<dyn CreditStore>,
}

impl CreditPolicy {
    pub fn new(kind: CreditPolicyKind, cost: f64, store: Arc<dyn CreditStore>) -> Self {
        Self { kind, cost, store }
    }

    pub fn from_config(config: &CreditsConfig, store: Arc<dyn CreditStore>) -> Self {
        Self::new(config.policy, config.cost_per_turn, store)
    }

    /// Called once after the hello, before provisioning. Only checks that
    /// the account can pay for one charge; nothing is debited yet.
    pub async fn admit(&self, account: &str) -> Result<(), CreditError> {
        let balance = self.store.balance(account).await?;
        if balance < self.cost {
            return Err(CreditError::InsufficientFunds {
                balance,
                required: self.cost,
            });
        }
        Ok(())
    }

    /// Called once the session's instance is bound. `Admission` charges
    /// for the whole session here, so a failed provisioning costs nothing.
    pub async fn charge_session(&self, account: &str) -> Result<(), CreditError> {
        if self.kind == CreditPolicyKind::Admission {
            let remaining = self.store.debit(account, self.cost).await?;
            info!(remaining, "Session admitted");
        }
        Ok(())
    }

    /// Called before each user turn.
    pub async fn charge_turn(&self, account: &str) -> Result<(), CreditError> {
        if self.kind == CreditPolicyKind::PerTurn {
            let remaining = self.store.debit(account, self.cost).await?;
            debug!(remaining, "Turn charged");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::credits::MemoryCreditStore;

    fn store(balance: f64) -> Arc<MemoryCreditStore> {
        Arc::new(MemoryCreditStore::new(HashMap::from([(
            "sb-1".to_string(),
            balance,
        )])))
    }

    #[tokio::test]
    async fn admission_charges_once_the_instance_is_bound() {
        let store = store(1.0);
        let policy = CreditPolicy::new(CreditPolicyKind::Admission, 1.0, store.clone());
        policy.admit("sb-1").await.unwrap();
        assert_eq!(store.balance("sb-1").await.unwrap(), 1.0);

        policy.charge_session("sb-1").await.unwrap();
        policy.charge_turn("sb-1").await.unwrap();
        policy.charge_turn("sb-1").await.unwrap();
        assert_eq!(store.balance("sb-1").await.unwrap(), 0.0);

        assert!(policy.admit("sb-1").await.unwrap_err().is_refusal());
    }

    #[tokio::test]
    async fn per_turn_checks_then_debits_each_turn() {
        let store = store(2.0);
        let policy = CreditPolicy::new(CreditPolicyKind::PerTurn, 1.0, store.clone());
        policy.admit("sb-1").await.unwrap();
        policy.charge_session("sb-1").await.unwrap();
        assert_eq!(store.balance("sb-1").await.unwrap(), 2.0);

        policy.charge_turn("sb-1").await.unwrap();
        policy.charge_turn("sb-1").await.unwrap();
        let err = policy.charge_turn("sb-1").await.unwrap_err();
        assert!(matches!(err, CreditError::InsufficientFunds { .. }));
    }

    #[tokio::test]
    async fn per_turn_refuses_empty_account_at_admission() {
        let policy = CreditPolicy::new(CreditPolicyKind::PerTurn, 1.0, store(0.5));
        assert!(policy.admit("sb-1").await.is_err());
    }
}
