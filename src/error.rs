use thiserror::Error;

use crate::domain::{SignalId, SignalStatus};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidValue {
            field: err.field,
            reason: err.reason,
        }
    }
}

/// Reasons a candidate signal is refused admission.
///
/// Variant order matches the order in which the risk policy evaluates them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("pair {pair} is not in the allowed list")]
    PairNotAllowed { pair: String },

    #[error("outside trading hours")]
    OutsideTradingHours,

    #[error("daily trade limit reached: {taken} >= {limit}")]
    DailyTradeLimitReached { taken: u32, limit: u32 },

    #[error("simultaneous trade limit reached: {open} >= {limit}")]
    SimultaneousTradeLimitReached { open: usize, limit: u32 },

    #[error("daily loss limit exceeded: {realized} <= -{limit}")]
    DailyLossLimitExceeded {
        realized: rust_decimal::Decimal,
        limit: rust_decimal::Decimal,
    },

    #[error("drawdown limit exceeded: {drawdown}% >= {limit}%")]
    DrawdownLimitExceeded {
        drawdown: rust_decimal::Decimal,
        limit: rust_decimal::Decimal,
    },
}

impl RejectReason {
    /// Stable short code used in logs and feed responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PairNotAllowed { .. } => "pair_not_allowed",
            Self::OutsideTradingHours => "outside_trading_hours",
            Self::DailyTradeLimitReached { .. } => "daily_trade_limit_reached",
            Self::SimultaneousTradeLimitReached { .. } => "simultaneous_trade_limit_reached",
            Self::DailyLossLimitExceeded { .. } => "daily_loss_limit_exceeded",
            Self::DrawdownLimitExceeded { .. } => "drawdown_limit_exceeded",
        }
    }
}

/// Errors raised by the signal store when a collaborator asks for
/// something the lifecycle does not allow. The store is unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("signal {id} not found")]
    NotFound { id: SignalId },

    #[error("invalid transition for signal {id}: {from} -> {to}")]
    InvalidTransition {
        id: SignalId,
        from: SignalStatus,
        to: SignalStatus,
    },

    #[error("signal {id} cannot complete without a profit")]
    MissingProfit { id: SignalId },

    #[error("profit {profit} for signal {id} does not fit in the account balance")]
    ProfitOutOfRange {
        id: SignalId,
        profit: rust_decimal::Decimal,
    },
}

/// A field value outside its permitted range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid value for {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Outcome of a refused `submit_signal` call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("signal rejected: {0}")]
    Rejected(RejectReason),

    #[error("malformed signal, {field}: {reason}")]
    InvalidSignal { field: &'static str, reason: String },
}

impl From<ValidationError> for SubmitError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidSignal {
            field: err.field,
            reason: err.reason,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
