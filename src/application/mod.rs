//! Application services (use cases).
//!
//! These services apply the risk policy, own the signal store and derive
//! statistics, coordinating notifier adapters through the port layer.

pub mod engine;
pub mod registry;
pub mod risk;
pub mod stats;
pub mod store;

pub use engine::SignalEngine;
pub use registry::AccountRegistry;
pub use risk::{PositionSizing, RiskDecision, RiskPolicy};
pub use store::{SignalFilter, SignalStore, Transitioned};
