//! Statistics domain types.

use rust_decimal::Decimal;
use serde::Serialize;

/// Account-level statistics derived from the signal store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountStats {
    pub total_completed: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percentage of completed trades with positive profit; 0 with none.
    pub win_rate: f64,
    pub realized_pnl: Decimal,
    pub active_count: usize,
}

impl AccountStats {
    /// Completed trades that were neither wins nor losses.
    #[must_use]
    pub fn breakeven(&self) -> usize {
        self.total_completed - self.wins - self.losses
    }
}
