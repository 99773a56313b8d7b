//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions so tests focus on assertions rather
//! than construction boilerplate.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::application::SignalEngine;
use crate::domain::{
    AccountId, AccountState, Direction, RiskConfiguration, SignalRequest, TradingHours,
};
use crate::port::Notifier;

/// A BUY request for `pair` at `entry`.
pub fn buy(pair: &str, entry: Decimal) -> SignalRequest {
    SignalRequest::new(pair, Direction::Buy, entry)
}

/// A SELL request for `pair` at `entry`.
pub fn sell(pair: &str, entry: Decimal) -> SignalRequest {
    SignalRequest::new(pair, Direction::Sell, entry)
}

/// The canonical EURUSD BUY @ 1.08765 candidate.
pub fn eurusd_buy() -> SignalRequest {
    buy("EURUSD", dec!(1.08765))
}

/// 12:00 UTC on a weekday, inside the default trading window.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Default risk configuration with the trading-hours gate switched off,
/// so results do not depend on the wall clock.
pub fn any_hour_config() -> RiskConfiguration {
    RiskConfiguration {
        trading_hours: TradingHours {
            enabled: false,
            ..TradingHours::default()
        },
        ..RiskConfiguration::default()
    }
}

/// Engine over a 10 000 balance with [`any_hour_config`].
pub fn engine() -> SignalEngine {
    SignalEngine::new(
        AccountId::default(),
        AccountState::default(),
        any_hour_config(),
    )
}

/// Engine with a custom configuration reporting to `notifier`.
pub fn engine_with(config: RiskConfiguration, notifier: Arc<dyn Notifier>) -> SignalEngine {
    SignalEngine::with_notifier(
        AccountId::default(),
        AccountState::default(),
        config,
        notifier,
    )
}
