//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; Telegram credentials come from
//! environment variables only.
//!
//! # Example
//!
//! ```no_run
//! use tradebolt::infrastructure::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::account::AccountConfig;
use super::logging::LoggingConfig;
use super::risk::RiskConfig;
use super::telegram::TelegramAppConfig;
use crate::adapter::notifier::activity::DEFAULT_ACTIVITY_CAPACITY;
use crate::domain::RiskConfiguration;
use crate::error::{ConfigError, Result};

/// In-memory activity log settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Entries kept before the oldest is evicted.
    pub capacity: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_ACTIVITY_CAPACITY,
        }
    }
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every table is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// The account this process trades for.
    #[serde(default)]
    pub account: AccountConfig,

    /// Risk limits and trade defaults applied at startup.
    #[serde(default)]
    pub risk: RiskConfig,

    /// Telegram notification configuration.
    #[serde(default)]
    pub telegram: TelegramAppConfig,

    #[serde(default)]
    pub activity: ActivityConfig,
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.account.id.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "account.id" }.into());
        }
        if self.account.initial_balance < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "account.initial_balance",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        if self.activity.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "activity.capacity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        self.risk.to_configuration()?;
        Ok(())
    }

    /// Validated risk configuration for the engine.
    #[allow(clippy::result_large_err)]
    pub fn risk_configuration(&self) -> Result<RiskConfiguration> {
        Ok(self.risk.to_configuration()?)
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
