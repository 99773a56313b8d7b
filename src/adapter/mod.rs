//! Implementations of ports (hexagonal adapters).

pub mod inbound;
pub mod notifier;
