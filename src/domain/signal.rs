//! Trade signal types and the lifecycle state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::{normalize_pair, Lots, Price};
use super::SignalId;
use crate::error::ValidationError;

/// Trade direction, fixed when the signal is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// +1 for BUY, -1 for SELL. Multiplies a favourable price move.
    #[must_use]
    pub fn sign(self) -> Decimal {
        match self {
            Self::Buy => Decimal::ONE,
            Self::Sell => Decimal::NEGATIVE_ONE,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a trade signal.
///
/// ```text
/// PENDING ──► EXECUTED ──► COMPLETED
///    │            │
///    └────────────┴──────► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalStatus {
    Pending,
    Executed,
    Completed,
    Cancelled,
}

impl SignalStatus {
    /// Whether `self -> target` is an edge of the lifecycle graph.
    ///
    /// Self-loops and every edge out of a terminal status are refused.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Executed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Executed, Self::Completed)
                | (Self::Executed, Self::Cancelled)
        )
    }

    /// PENDING or EXECUTED.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Executed)
    }

    /// COMPLETED or CANCELLED.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Executed => "EXECUTED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate signal as delivered by the ingestion gateway.
///
/// Stop loss and take profit are absolute prices; when omitted the
/// risk policy derives them from the configured pip distances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRequest {
    pub pair: String,
    pub direction: Direction,
    pub entry_price: Price,
    #[serde(default)]
    pub stop_loss: Option<Price>,
    #[serde(default)]
    pub take_profit: Option<Price>,
}

impl SignalRequest {
    /// Create a request without explicit stop loss or take profit.
    pub fn new(pair: impl Into<String>, direction: Direction, entry_price: Price) -> Self {
        Self {
            pair: pair.into(),
            direction,
            entry_price,
            stop_loss: None,
            take_profit: None,
        }
    }

    #[must_use]
    pub fn with_stop_loss(mut self, price: Price) -> Self {
        self.stop_loss = Some(price);
        self
    }

    #[must_use]
    pub fn with_take_profit(mut self, price: Price) -> Self {
        self.take_profit = Some(price);
        self
    }

    /// Pair symbol in its normalised form.
    #[must_use]
    pub fn normalized_pair(&self) -> String {
        normalize_pair(&self.pair)
    }

    /// Reject payloads that no risk rule could sensibly evaluate.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.normalized_pair().is_empty() {
            return Err(ValidationError::new("pair", "must not be empty"));
        }
        if self.entry_price <= Decimal::ZERO {
            return Err(ValidationError::new(
                "entry_price",
                format!("must be positive, got {}", self.entry_price),
            ));
        }
        if let Some(stop) = self.stop_loss {
            if stop <= Decimal::ZERO {
                return Err(ValidationError::new(
                    "stop_loss",
                    format!("must be positive, got {stop}"),
                ));
            }
        }
        if let Some(target) = self.take_profit {
            if target <= Decimal::ZERO {
                return Err(ValidationError::new(
                    "take_profit",
                    format!("must be positive, got {target}"),
                ));
            }
        }
        Ok(())
    }
}

/// Fully resolved signal fields produced by an accepting risk decision.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedSignal {
    pub pair: String,
    pub direction: Direction,
    pub entry_price: Price,
    pub stop_loss: Price,
    pub take_profit: Price,
    pub lot_size: Lots,
}

/// A trade signal tracked by the store.
///
/// Identity, direction and creation time never change. Profit is only
/// present once the signal has completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeSignal {
    id: SignalId,
    pair: String,
    direction: Direction,
    entry_price: Price,
    stop_loss: Price,
    take_profit: Price,
    lot_size: Lots,
    created_at: DateTime<Utc>,
    status: SignalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    profit: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    executed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    closed_at: Option<DateTime<Utc>>,
}

impl TradeSignal {
    /// Create a PENDING signal from admitted fields.
    #[must_use]
    pub fn new(id: SignalId, fields: AdmittedSignal, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            pair: fields.pair,
            direction: fields.direction,
            entry_price: fields.entry_price,
            stop_loss: fields.stop_loss,
            take_profit: fields.take_profit,
            lot_size: fields.lot_size,
            created_at,
            status: SignalStatus::Pending,
            profit: None,
            executed_at: None,
            closed_at: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SignalId {
        &self.id
    }

    #[must_use]
    pub fn pair(&self) -> &str {
        &self.pair
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn entry_price(&self) -> Price {
        self.entry_price
    }

    #[must_use]
    pub fn stop_loss(&self) -> Price {
        self.stop_loss
    }

    #[must_use]
    pub fn take_profit(&self) -> Price {
        self.take_profit
    }

    #[must_use]
    pub fn lot_size(&self) -> Lots {
        self.lot_size
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn status(&self) -> SignalStatus {
        self.status
    }

    /// Realised profit, present only for COMPLETED signals.
    #[must_use]
    pub fn profit(&self) -> Option<Decimal> {
        self.profit
    }

    #[must_use]
    pub fn executed_at(&self) -> Option<DateTime<Utc>> {
        self.executed_at
    }

    /// When the signal reached COMPLETED or CANCELLED.
    #[must_use]
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Completed with a strictly positive profit.
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.status == SignalStatus::Completed
            && self.profit.is_some_and(|p| p > Decimal::ZERO)
    }

    /// Move to `to`. The caller has already checked the edge.
    pub(crate) fn apply(&mut self, to: SignalStatus, profit: Option<Decimal>, at: DateTime<Utc>) {
        debug_assert!(self.status.can_transition_to(to));
        self.status = to;
        match to {
            SignalStatus::Executed => self.executed_at = Some(at),
            SignalStatus::Completed => {
                self.profit = profit;
                self.closed_at = Some(at);
            }
            SignalStatus::Cancelled => self.closed_at = Some(at),
            SignalStatus::Pending => {}
        }
    }
}
