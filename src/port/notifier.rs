//! Notifier port for lifecycle notifications.
//!
//! This module defines the trait for sending notifications about signal
//! lifecycle changes, rejected candidates and account status changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{BotStatus, Direction, Price, SignalId, SignalStatus, TradeSignal};
use crate::error::RejectReason;

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Event {
    /// A signal was created or changed status.
    Lifecycle(LifecycleEvent),
    /// A candidate signal failed the risk policy.
    SignalRejected(RejectionEvent),
    /// The bot moved between ACTIVE, INACTIVE and ERROR.
    BotStatusChanged {
        from: BotStatus,
        to: BotStatus,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// The Telegram link was connected or disconnected.
    TelegramLinkChanged {
        connected: bool,
        timestamp: DateTime<Utc>,
    },
    /// The risk configuration was replaced.
    RiskConfigurationUpdated { timestamp: DateTime<Utc> },
}

impl Event {
    /// When the underlying change was applied.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Lifecycle(e) => e.timestamp,
            Self::SignalRejected(e) => e.timestamp,
            Self::BotStatusChanged { timestamp, .. }
            | Self::TelegramLinkChanged { timestamp, .. }
            | Self::RiskConfigurationUpdated { timestamp } => *timestamp,
        }
    }
}

/// Signal creation or status transition.
///
/// `from` is `None` when the signal was just created.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub signal_id: SignalId,
    pub pair: String,
    pub direction: Direction,
    pub entry_price: Price,
    pub from: Option<SignalStatus>,
    pub to: SignalStatus,
    pub profit: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Describe `signal` as having just moved from `from` to its current status.
    #[must_use]
    pub fn new(signal: &TradeSignal, from: Option<SignalStatus>, timestamp: DateTime<Utc>) -> Self {
        Self {
            signal_id: signal.id().clone(),
            pair: signal.pair().to_string(),
            direction: signal.direction(),
            entry_price: signal.entry_price(),
            from,
            to: signal.status(),
            profit: signal.profit(),
            timestamp,
        }
    }
}

/// Risk rejection event.
#[derive(Debug, Clone)]
pub struct RejectionEvent {
    pub pair: String,
    pub direction: Direction,
    pub entry_price: Price,
    pub reason: RejectReason,
    pub timestamp: DateTime<Utc>,
}

/// Trait for notification handlers.
///
/// Notifications are fire-and-forget: a failing handler must never undo
/// the state change that produced the event.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `notify` is called after the account lock is released, but should
///   still return quickly; spawn a task for slow I/O
/// - Events of one account arrive in the order its state changed;
///   events of different accounts may interleave
/// - A handler must not call back into the engine that emitted the event
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, event: Event) {
        (**self).notify(event);
    }
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotifierRegistry {
    fn notify(&self, event: Event) {
        self.notify_all(event);
    }
}
