//! Notification adapters.
//!
//! Implements the `port::Notifier` trait for various notification backends.

pub mod activity;
mod log;

#[cfg(feature = "telegram")]
pub mod telegram;

pub use activity::{ActivityEntry, ActivityKind, ActivityLog, ActivityQuery};
pub use log::{LogNotifier, NullNotifier};

#[cfg(feature = "telegram")]
pub use telegram::{TelegramConfig, TelegramNotifier};
