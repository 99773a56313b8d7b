//! Composition root: wires configuration, notifiers and the engine.

use std::sync::Arc;

use tracing::info;
#[cfg(feature = "telegram")]
use tracing::warn;

use crate::adapter::inbound::feed::Feed;
use crate::adapter::notifier::{ActivityLog, LogNotifier};
#[cfg(feature = "telegram")]
use crate::adapter::notifier::TelegramNotifier;
use crate::application::{AccountRegistry, SignalEngine};
use crate::domain::AccountId;
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::port::{Notifier, NotifierRegistry};

/// Everything the binary needs at runtime.
pub struct Runtime {
    /// Engines per account; unknown accounts open from the configured template.
    pub accounts: AccountRegistry,
    pub default_account: AccountId,
    /// Engine of `default_account`, opened at startup.
    pub engine: Arc<SignalEngine>,
    pub activity: Arc<ActivityLog>,
}

impl Runtime {
    /// Command feed over this runtime's accounts.
    #[must_use]
    pub fn feed(&self) -> Feed<'_> {
        Feed::new(&self.accounts, &self.default_account, &self.activity)
    }
}

/// Build notifier registry from configuration.
///
/// The Telegram notifier spawns its worker, so this must run inside a Tokio
/// runtime when Telegram is enabled.
#[cfg(feature = "telegram")]
pub fn build_notifier_registry(config: &Config, activity: Arc<ActivityLog>) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry.register(Box::new(activity));

    if config.telegram.enabled {
        if let Some(tg_config) = config.telegram.notifier_config() {
            registry.register(Box::new(TelegramNotifier::new(tg_config)));
            info!("Telegram notifier enabled");
        } else {
            warn!("Telegram enabled but TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID not set");
        }
    }

    registry
}

/// Build notifier registry from configuration (non-telegram variant).
#[cfg(not(feature = "telegram"))]
pub fn build_notifier_registry(_config: &Config, activity: Arc<ActivityLog>) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry.register(Box::new(activity));
    registry
}

/// Build the account registry and open the configured account.
///
/// Every account shares the notifiers, the opening balance and the risk
/// configuration from `config`.
#[allow(clippy::result_large_err)]
pub fn build_runtime(config: &Config) -> Result<Runtime> {
    let risk = config.risk_configuration()?;
    let activity = Arc::new(ActivityLog::new(config.activity.capacity));
    let notifiers = build_notifier_registry(config, Arc::clone(&activity));

    let default_account = config.account.account_id();
    info!(
        account = %default_account,
        balance = %config.account.initial_balance,
        notifiers = notifiers.len(),
        "Building signal engine"
    );

    let notifiers: Arc<dyn Notifier> = Arc::new(notifiers);
    let initial = config.account.initial_state();
    let open_engine = move |id: &AccountId| {
        SignalEngine::with_notifier(
            id.clone(),
            initial.clone(),
            risk.clone(),
            Arc::clone(&notifiers),
        )
    };

    let first = open_engine(&default_account);
    let accounts = AccountRegistry::with_factory(open_engine);
    let engine = accounts.insert(first);

    Ok(Runtime {
        accounts,
        default_account,
        engine,
        activity,
    })
}
