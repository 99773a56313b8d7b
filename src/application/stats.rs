//! Derived statistics over a signal store.
//!
//! Nothing is cached: each function scans the store it is given, so the
//! numbers can never drift from the signals they describe.

use rust_decimal::Decimal;

use super::store::{SignalFilter, SignalStore};
use crate::domain::{AccountStats, SignalStatus, TradeSignal};

/// Default number of trades returned by [`recent_trades`] callers.
pub const DEFAULT_RECENT_TRADES: usize = 10;

/// Count of COMPLETED signals.
#[must_use]
pub fn total_completed_trades(store: &SignalStore) -> usize {
    completed(store).count()
}

/// Percentage of completed trades with a strictly positive profit.
///
/// Returns exactly 0 when nothing has completed.
#[must_use]
pub fn win_rate(store: &SignalStore) -> f64 {
    let total = total_completed_trades(store);
    if total == 0 {
        return 0.0;
    }
    let wins = completed(store).filter(|s| s.is_win()).count();
    wins as f64 / total as f64 * 100.0
}

/// Up to `n` completed trades, most recently closed first.
#[must_use]
pub fn recent_trades(store: &SignalStore, n: usize) -> Vec<TradeSignal> {
    store.list(SignalFilter::RecentCompleted(n))
}

/// PENDING and EXECUTED trades in store order.
#[must_use]
pub fn active_trades(store: &SignalStore) -> Vec<TradeSignal> {
    store.list(SignalFilter::Active)
}

/// Sum of profit over completed trades.
#[must_use]
pub fn realized_pnl(store: &SignalStore) -> Decimal {
    completed(store).filter_map(TradeSignal::profit).sum()
}

/// All account statistics in one pass-per-figure snapshot.
#[must_use]
pub fn summarize(store: &SignalStore) -> AccountStats {
    let total_completed = total_completed_trades(store);
    let wins = completed(store).filter(|s| s.is_win()).count();
    let losses = completed(store)
        .filter(|s| s.profit().is_some_and(|p| p < Decimal::ZERO))
        .count();

    AccountStats {
        total_completed,
        wins,
        losses,
        win_rate: win_rate(store),
        realized_pnl: realized_pnl(store),
        active_count: store.active_count(),
    }
}

fn completed(store: &SignalStore) -> impl Iterator<Item = &TradeSignal> {
    store
        .iter()
        .filter(|s| s.status() == SignalStatus::Completed)
}
