//! In-memory activity feed.
//!
//! Turns notifier events into short human-readable entries, keeps the
//! newest `capacity` of them and answers filtered queries for display.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{BotStatus, SignalStatus};
use crate::port::{Event, LifecycleEvent, Notifier};

/// Default number of entries retained.
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 500;

/// Category of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityKind {
    Info,
    Signal,
    Trade,
    Warning,
    Error,
}

/// A single activity entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub id: u64,
    pub kind: ActivityKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Filter for [`ActivityLog::entries`]. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActivityQuery {
    pub kind: Option<ActivityKind>,
    /// Case-insensitive substring of the message.
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl ActivityQuery {
    fn matches(&self, entry: &ActivityEntry, needle: Option<&str>) -> bool {
        if self.kind.is_some_and(|k| k != entry.kind) {
            return false;
        }
        needle.map_or(true, |n| entry.message.to_lowercase().contains(n))
    }
}

struct Inner {
    entries: VecDeque<ActivityEntry>,
    next_id: u64,
}

/// Bounded, newest-first activity log.
pub struct ActivityLog {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl ActivityLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                entries: VecDeque::with_capacity(capacity.min(1024)),
                next_id: 1,
            }),
        }
    }

    /// Append an entry, evicting the oldest when full.
    pub fn record(&self, kind: ActivityKind, message: impl Into<String>, timestamp: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        inner.entries.push_front(ActivityEntry {
            id,
            kind,
            message: message.into(),
            timestamp,
        });
        inner.entries.truncate(self.capacity);
    }

    /// Entries matching `query`, newest first.
    #[must_use]
    pub fn entries(&self, query: &ActivityQuery) -> Vec<ActivityEntry> {
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.inner
            .lock()
            .entries
            .iter()
            .filter(|e| query.matches(e, needle.as_deref()))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_CAPACITY)
    }
}

impl Notifier for ActivityLog {
    fn notify(&self, event: Event) {
        let timestamp = event.timestamp();
        let (kind, message) = describe(event);
        self.record(kind, message, timestamp);
    }
}

fn describe(event: Event) -> (ActivityKind, String) {
    match event {
        Event::Lifecycle(e) => describe_lifecycle(&e),
        Event::SignalRejected(e) => (
            ActivityKind::Warning,
            format!("Signal for {} ignored - {}", e.pair, e.reason),
        ),
        Event::BotStatusChanged {
            to: BotStatus::Error,
            reason,
            ..
        } => (
            ActivityKind::Error,
            format!("Bot fault: {}", reason.as_deref().unwrap_or("unknown")),
        ),
        Event::BotStatusChanged { from, to, .. } => (
            ActivityKind::Info,
            format!("Bot status changed: {from} -> {to}"),
        ),
        Event::TelegramLinkChanged { connected: true, .. } => {
            (ActivityKind::Info, "Connected to Telegram".to_string())
        }
        Event::TelegramLinkChanged {
            connected: false, ..
        } => (ActivityKind::Info, "Disconnected from Telegram".to_string()),
        Event::RiskConfigurationUpdated { .. } => {
            (ActivityKind::Info, "Risk settings updated".to_string())
        }
    }
}

fn describe_lifecycle(e: &LifecycleEvent) -> (ActivityKind, String) {
    match e.to {
        SignalStatus::Pending => (
            ActivityKind::Signal,
            format!(
                "Received signal for {}: {} @ {}",
                e.pair, e.direction, e.entry_price
            ),
        ),
        SignalStatus::Executed => (
            ActivityKind::Trade,
            format!(
                "Executed {} order for {} @ {}",
                e.direction, e.pair, e.entry_price
            ),
        ),
        SignalStatus::Completed => (
            ActivityKind::Trade,
            format!(
                "Trade closed: {} {} with {} profit",
                e.pair,
                e.direction,
                signed(e.profit.unwrap_or_default())
            ),
        ),
        SignalStatus::Cancelled => (
            ActivityKind::Info,
            format!("Signal cancelled: {} {} ({})", e.pair, e.direction, e.signal_id),
        ),
    }
}

fn signed(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{value}")
    } else {
        value.to_string()
    }
}
