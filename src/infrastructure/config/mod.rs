//! Infrastructure configuration modules.

pub mod account;
pub mod logging;
pub mod risk;
pub mod settings;
pub mod telegram;

pub use settings::Config;
