//! Exchange-agnostic domain types.

pub mod account;
pub mod id;
pub mod money;
pub mod risk;
pub mod signal;
pub mod stats;
pub mod telegram;

pub use account::{AccountState, BotStatus};
pub use id::{AccountId, SignalId};
pub use money::{normalize_pair, pip_size, Amount, Lots, Price};
pub use risk::{RiskConfiguration, RiskConfigurationUpdate, TradingHours};
pub use signal::{AdmittedSignal, Direction, SignalRequest, SignalStatus, TradeSignal};
pub use stats::AccountStats;
pub use telegram::TelegramLink;
