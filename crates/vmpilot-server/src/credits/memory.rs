use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CreditError, CreditStore};

/// Balances held in process memory, seeded from config.
#[derive(Debug, Default)]
pub struct MemoryCreditStore {
    accounts: Mutex<HashMap<String, f64>>,
}

impl MemoryCreditStore {
    pub fn new(accounts: HashMap<String, f64>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
        }
    }
}

#[async_trait]
impl CreditStore for MemoryCreditStore {
    async fn balance(&self, account: &str) -> Result<f64, CreditError> {
        self.accounts
            .lock()
            .await
            .get(account)
            .copied()
            .ok_or(CreditError::UnknownAccount)
    }

    async fn debit(&self, account: &str, amount: f64) -> Result<f64, CreditError> {
        let mut accounts = self.accounts.lock().await;
        let balance = accounts
            .get_mut(account)
            .ok_or(CreditError::UnknownAccount)?;
        if *balance < amount {
            return Err(CreditError::InsufficientFunds {
                balance: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        Ok(*balance)
    }
}
