//! TradeBolt - forex signal admission and risk engine.
//!
//! Candidate trade signals arrive from an ingestion gateway, pass through a
//! configurable risk policy and, once admitted, follow a fixed lifecycle as
//! the execution venue reports fills and closes. Statistics are derived from
//! the signal history and every change is broadcast to notifiers.
//!
//! # Architecture
//!
//! The crate uses a hexagonal layout:
//!
//! - **`domain`** - Value types and their invariants: signals, statuses,
//!   risk configuration, account state, pip arithmetic
//! - **`application`** - Use cases: the risk policy, the signal store,
//!   statistics and the per-account [`SignalEngine`](application::SignalEngine)
//! - **`port`** - The [`Notifier`](port::Notifier) trait and its events
//! - **`adapter`** - Notifiers (log, activity log, Telegram) and the
//!   JSON-lines command feed
//! - **`infrastructure`** - Configuration, logging and bootstrap
//!
//! # Features
//!
//! - `telegram` - Forward events to a Telegram chat (enabled by default)
//! - `testkit` - Expose test builders to integration tests
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tradebolt::application::SignalEngine;
//! use tradebolt::domain::{AccountId, AccountState, Direction, RiskConfiguration, SignalRequest};
//!
//! let engine = SignalEngine::new(
//!     AccountId::default(),
//!     AccountState::new(dec!(10000)),
//!     RiskConfiguration::default(),
//! );
//! let _ = engine.submit_signal(SignalRequest::new("EURUSD", Direction::Buy, dec!(1.08765)));
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
