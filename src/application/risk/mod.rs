//! Risk management module.
//!
//! Provides the pre-admission gate that every candidate signal passes
//! before it reaches the signal store.

pub mod policy;

pub use policy::{PositionSizing, RiskDecision, RiskPolicy};
