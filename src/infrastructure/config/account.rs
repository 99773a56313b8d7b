//! Account configuration.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{AccountId, AccountState};

/// The account served by the binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub id: String,
    /// Opening balance in account currency; also the initial peak.
    pub initial_balance: Decimal,
    /// Start with automated trading switched on.
    pub auto_trading: bool,
}

impl AccountConfig {
    #[must_use]
    pub fn account_id(&self) -> AccountId {
        AccountId::new(self.id.trim())
    }

    /// Opening account state.
    #[must_use]
    pub fn initial_state(&self) -> AccountState {
        let mut state = AccountState::new(self.initial_balance);
        state.set_auto_trading(self.auto_trading);
        state
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            id: "default".into(),
            initial_balance: Decimal::from(10_000),
            auto_trading: false,
        }
    }
}
