//! Account balance, daily P&L and bot status.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::money::Amount;
use crate::error::ValidationError;

/// Operating status of the trading bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BotStatus {
    Active,
    Inactive,
    Error,
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Error => "ERROR",
        })
    }
}

/// Financial and operational state of a single trading account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountState {
    balance: Amount,
    daily_realized_pnl: Amount,
    peak_balance: Amount,
    auto_trading: bool,
    fault: Option<String>,
}

impl AccountState {
    /// Create an account with the given opening balance.
    #[must_use]
    pub fn new(balance: Amount) -> Self {
        Self {
            balance,
            daily_realized_pnl: Decimal::ZERO,
            peak_balance: balance,
            auto_trading: false,
            fault: None,
        }
    }

    #[must_use]
    pub fn balance(&self) -> Amount {
        self.balance
    }

    #[must_use]
    pub fn daily_realized_pnl(&self) -> Amount {
        self.daily_realized_pnl
    }

    /// Highest balance observed since the account was opened.
    #[must_use]
    pub fn peak_balance(&self) -> Amount {
        self.peak_balance
    }

    #[must_use]
    pub fn auto_trading(&self) -> bool {
        self.auto_trading
    }

    /// Reason for the current fault, if any.
    #[must_use]
    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    /// ERROR while a fault is recorded, otherwise follows the auto-trading toggle.
    #[must_use]
    pub fn bot_status(&self) -> BotStatus {
        if self.fault.is_some() {
            BotStatus::Error
        } else if self.auto_trading {
            BotStatus::Active
        } else {
            BotStatus::Inactive
        }
    }

    /// Percentage decline of the balance from its peak.
    ///
    /// Zero while the peak is not positive. Saturates at `Decimal::MAX`
    /// when the decline cannot be represented.
    #[must_use]
    pub fn drawdown_percent(&self) -> Decimal {
        if self.peak_balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.peak_balance
            .checked_sub(self.balance)
            .and_then(|decline| decline.checked_div(self.peak_balance))
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .unwrap_or(Decimal::MAX)
    }

    /// Book a closed trade's profit (or loss).
    ///
    /// Fails without touching the account when the balance or the daily
    /// P&L would leave the decimal range.
    pub fn record_realized(&mut self, profit: Amount) -> Result<(), ValidationError> {
        let (Some(balance), Some(daily)) = (
            self.balance.checked_add(profit),
            self.daily_realized_pnl.checked_add(profit),
        ) else {
            return Err(ValidationError::new(
                "profit",
                format!("{profit} does not fit in the account balance"),
            ));
        };

        self.balance = balance;
        self.daily_realized_pnl = daily;
        self.raise_peak();
        Ok(())
    }

    /// Overwrite the balance, e.g. after reconciling with the broker.
    pub fn set_balance(&mut self, balance: Amount) {
        self.balance = balance;
        self.raise_peak();
    }

    pub fn set_auto_trading(&mut self, enabled: bool) {
        self.auto_trading = enabled;
    }

    pub fn set_fault(&mut self, reason: String) {
        self.fault = Some(reason);
    }

    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    /// Reset the daily realised P&L at the start of a trading day.
    pub fn start_trading_day(&mut self) {
        self.daily_realized_pnl = Decimal::ZERO;
    }

    fn raise_peak(&mut self) {
        if self.balance > self.peak_balance {
            self.peak_balance = self.balance;
        }
    }
}

impl Default for AccountState {
    fn default() -> Self {
        Self::new(dec!(10000))
    }
}
