//! Risk configuration owned by an account.
//!
//! The configuration only changes through [`RiskConfiguration::apply`], which
//! merges a partial update and validates the result before anything is
//! replaced. Out-of-range values are refused, never clamped.

use std::collections::BTreeSet;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::money::{normalize_pair, Amount, Lots};
use crate::error::ValidationError;

/// Upper bound for `max_drawdown_percent`.
pub const MAX_DRAWDOWN_PERCENT: Decimal = dec!(20);

/// Upper bound for `risk_per_trade_percent`.
pub const MAX_RISK_PER_TRADE_PERCENT: Decimal = dec!(5);

/// Pairs allowed when nothing else is configured.
pub const DEFAULT_ALLOWED_PAIRS: [&str; 10] = [
    "EURUSD", "GBPUSD", "USDJPY", "AUDUSD", "USDCAD", "USDCHF", "NZDUSD", "EURJPY", "GBPJPY",
    "EURGBP",
];

/// Daily window during which new signals may be admitted.
///
/// The window is `[start, end)`. When `start > end` it wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub enabled: bool,
}

impl TradingHours {
    /// Return true if `time` falls inside the window.
    ///
    /// A disabled window contains every time of day.
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        if !self.enabled {
            return true;
        }
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

impl Default for TradingHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            enabled: true,
        }
    }
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}

/// Risk limits and trade defaults for one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskConfiguration {
    /// Realised loss for the day at which admissions stop.
    pub max_daily_loss: Amount,
    /// Drawdown from peak balance, in percent, at which admissions stop.
    pub max_drawdown_percent: Decimal,
    pub default_stop_loss_pips: Decimal,
    pub default_take_profit_pips: Decimal,
    pub fixed_lot_size: Lots,
    /// Balance share risked per trade when risk sizing is requested.
    pub risk_per_trade_percent: Decimal,
    pub use_trailing_stop: bool,
    pub max_daily_trades: u32,
    pub max_simultaneous_trades: u32,
    pub allowed_pairs: BTreeSet<String>,
    pub trading_hours: TradingHours,
}

impl Default for RiskConfiguration {
    fn default() -> Self {
        Self {
            max_daily_loss: dec!(100),
            max_drawdown_percent: dec!(5),
            default_stop_loss_pips: dec!(10),
            default_take_profit_pips: dec!(25),
            fixed_lot_size: dec!(0.01),
            risk_per_trade_percent: dec!(1),
            use_trailing_stop: false,
            max_daily_trades: 10,
            max_simultaneous_trades: 3,
            allowed_pairs: DEFAULT_ALLOWED_PAIRS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            trading_hours: TradingHours::default(),
        }
    }
}

impl RiskConfiguration {
    /// Return true if the (already normalised) pair may be traded.
    #[must_use]
    pub fn is_pair_allowed(&self, pair: &str) -> bool {
        self.allowed_pairs.contains(pair)
    }

    /// Check every field against its permitted range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_drawdown_percent < Decimal::ZERO
            || self.max_drawdown_percent > MAX_DRAWDOWN_PERCENT
        {
            return Err(ValidationError::new(
                "max_drawdown_percent",
                format!(
                    "must be between 0 and {MAX_DRAWDOWN_PERCENT}, got {}",
                    self.max_drawdown_percent
                ),
            ));
        }
        if self.risk_per_trade_percent < Decimal::ZERO
            || self.risk_per_trade_percent > MAX_RISK_PER_TRADE_PERCENT
        {
            return Err(ValidationError::new(
                "risk_per_trade_percent",
                format!(
                    "must be between 0 and {MAX_RISK_PER_TRADE_PERCENT}, got {}",
                    self.risk_per_trade_percent
                ),
            ));
        }
        if self.max_daily_loss < Decimal::ZERO {
            return Err(ValidationError::new("max_daily_loss", "must be 0 or greater"));
        }
        if self.default_stop_loss_pips < Decimal::ZERO {
            return Err(ValidationError::new(
                "default_stop_loss_pips",
                "must be 0 or greater",
            ));
        }
        if self.default_take_profit_pips < Decimal::ZERO {
            return Err(ValidationError::new(
                "default_take_profit_pips",
                "must be 0 or greater",
            ));
        }
        if self.fixed_lot_size <= Decimal::ZERO {
            return Err(ValidationError::new(
                "fixed_lot_size",
                "must be greater than 0",
            ));
        }
        if self.trading_hours.enabled && self.trading_hours.start == self.trading_hours.end {
            return Err(ValidationError::new(
                "trading_hours",
                "start and end must differ",
            ));
        }
        Ok(())
    }

    /// Merge `update` into a copy of this configuration and validate it.
    ///
    /// `self` is never modified; on error the caller keeps the prior value.
    pub fn apply(&self, update: &RiskConfigurationUpdate) -> Result<Self, ValidationError> {
        let mut next = self.clone();

        if let Some(v) = update.max_daily_loss {
            next.max_daily_loss = v;
        }
        if let Some(v) = update.max_drawdown_percent {
            next.max_drawdown_percent = v;
        }
        if let Some(v) = update.default_stop_loss_pips {
            next.default_stop_loss_pips = v;
        }
        if let Some(v) = update.default_take_profit_pips {
            next.default_take_profit_pips = v;
        }
        if let Some(v) = update.fixed_lot_size {
            next.fixed_lot_size = v;
        }
        if let Some(v) = update.risk_per_trade_percent {
            next.risk_per_trade_percent = v;
        }
        if let Some(v) = update.use_trailing_stop {
            next.use_trailing_stop = v;
        }
        if let Some(v) = update.max_daily_trades {
            next.max_daily_trades = v;
        }
        if let Some(v) = update.max_simultaneous_trades {
            next.max_simultaneous_trades = v;
        }
        if let Some(pairs) = &update.allowed_pairs {
            next.allowed_pairs = pairs
                .iter()
                .map(|p| normalize_pair(p))
                .filter(|p| !p.is_empty())
                .collect();
        }
        if let Some(hours) = update.trading_hours {
            next.trading_hours = hours;
        }

        next.validate()?;
        Ok(next)
    }
}

/// Partial risk configuration update. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfigurationUpdate {
    pub max_daily_loss: Option<Amount>,
    pub max_drawdown_percent: Option<Decimal>,
    pub default_stop_loss_pips: Option<Decimal>,
    pub default_take_profit_pips: Option<Decimal>,
    pub fixed_lot_size: Option<Lots>,
    pub risk_per_trade_percent: Option<Decimal>,
    pub use_trailing_stop: Option<bool>,
    pub max_daily_trades: Option<u32>,
    pub max_simultaneous_trades: Option<u32>,
    pub allowed_pairs: Option<Vec<String>>,
    pub trading_hours: Option<TradingHours>,
}
