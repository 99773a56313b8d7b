//! Risk management configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::domain::risk::{parse_time_of_day, DEFAULT_ALLOWED_PAIRS};
use crate::domain::{normalize_pair, RiskConfiguration, TradingHours};
use crate::error::ConfigError;

/// Trading window as written in the config file (`HH:MM`, UTC).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingHoursConfig {
    pub start: String,
    pub end: String,
    pub enabled: bool,
}

impl Default for TradingHoursConfig {
    fn default() -> Self {
        Self {
            start: "09:00".into(),
            end: "17:00".into(),
            enabled: true,
        }
    }
}

impl TradingHoursConfig {
    fn to_trading_hours(&self) -> Result<TradingHours, ConfigError> {
        let parse = |field: &'static str, raw: &str| {
            parse_time_of_day(raw.trim()).map_err(|e| ConfigError::InvalidValue {
                field,
                reason: format!("expected HH:MM, got {raw:?} ({e})"),
            })
        };

        Ok(TradingHours {
            start: parse("trading_hours.start", &self.start)?,
            end: parse("trading_hours.end", &self.end)?,
            enabled: self.enabled,
        })
    }
}

/// Risk management configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Realised daily loss at which admissions stop.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,
    /// Drawdown from peak, in percent (0 to 20).
    #[serde(default = "default_max_drawdown_percent")]
    pub max_drawdown_percent: Decimal,
    #[serde(default = "default_stop_loss_pips")]
    pub default_stop_loss_pips: Decimal,
    #[serde(default = "default_take_profit_pips")]
    pub default_take_profit_pips: Decimal,
    #[serde(default = "default_fixed_lot_size")]
    pub fixed_lot_size: Decimal,
    /// Balance share risked per trade, in percent (0 to 5).
    #[serde(default = "default_risk_per_trade_percent")]
    pub risk_per_trade_percent: Decimal,
    #[serde(default)]
    pub use_trailing_stop: bool,
    #[serde(default = "default_max_daily_trades")]
    pub max_daily_trades: u32,
    #[serde(default = "default_max_simultaneous_trades")]
    pub max_simultaneous_trades: u32,
    #[serde(default = "default_allowed_pairs")]
    pub allowed_pairs: Vec<String>,
    #[serde(default)]
    pub trading_hours: TradingHoursConfig,
}

fn default_max_daily_loss() -> Decimal {
    dec!(100)
}

fn default_max_drawdown_percent() -> Decimal {
    dec!(5)
}

fn default_stop_loss_pips() -> Decimal {
    dec!(10)
}

fn default_take_profit_pips() -> Decimal {
    dec!(25)
}

fn default_fixed_lot_size() -> Decimal {
    dec!(0.01)
}

fn default_risk_per_trade_percent() -> Decimal {
    dec!(1)
}

const fn default_max_daily_trades() -> u32 {
    10
}

const fn default_max_simultaneous_trades() -> u32 {
    3
}

fn default_allowed_pairs() -> Vec<String> {
    DEFAULT_ALLOWED_PAIRS
        .iter()
        .map(|p| (*p).to_string())
        .collect()
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss: default_max_daily_loss(),
            max_drawdown_percent: default_max_drawdown_percent(),
            default_stop_loss_pips: default_stop_loss_pips(),
            default_take_profit_pips: default_take_profit_pips(),
            fixed_lot_size: default_fixed_lot_size(),
            risk_per_trade_percent: default_risk_per_trade_percent(),
            use_trailing_stop: false,
            max_daily_trades: default_max_daily_trades(),
            max_simultaneous_trades: default_max_simultaneous_trades(),
            allowed_pairs: default_allowed_pairs(),
            trading_hours: TradingHoursConfig::default(),
        }
    }
}

impl RiskConfig {
    /// Build the runtime configuration, applying the same validation as a
    /// live update.
    pub fn to_configuration(&self) -> Result<RiskConfiguration, ConfigError> {
        let config = RiskConfiguration {
            max_daily_loss: self.max_daily_loss,
            max_drawdown_percent: self.max_drawdown_percent,
            default_stop_loss_pips: self.default_stop_loss_pips,
            default_take_profit_pips: self.default_take_profit_pips,
            fixed_lot_size: self.fixed_lot_size,
            risk_per_trade_percent: self.risk_per_trade_percent,
            use_trailing_stop: self.use_trailing_stop,
            max_daily_trades: self.max_daily_trades,
            max_simultaneous_trades: self.max_simultaneous_trades,
            allowed_pairs: self
                .allowed_pairs
                .iter()
                .map(|p| normalize_pair(p))
                .filter(|p| !p.is_empty())
                .collect(),
            trading_hours: self.trading_hours.to_trading_hours()?,
        };
        config.validate()?;
        Ok(config)
    }
}
