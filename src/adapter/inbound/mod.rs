//! Inbound adapters that drive the engine.

pub mod feed;
