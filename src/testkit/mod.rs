//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for requests, configurations and engines.
//! - [`notifier`] - [`RecordingNotifier`](notifier::RecordingNotifier) for
//!   asserting on emitted events.

pub mod domain;
pub mod notifier;
