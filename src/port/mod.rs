//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Available Ports
//!
//! - [`Notifier`] - Lifecycle notifications (log, activity feed, Telegram)

mod notifier;

pub use notifier::{Event, LifecycleEvent, Notifier, NotifierRegistry, RejectionEvent};
