//! Telegram notification configuration.

use serde::Deserialize;

const fn default_true() -> bool {
    true
}

/// Telegram notification configuration.
///
/// Credentials come from `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`,
/// never from the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramAppConfig {
    /// Enable telegram notifications.
    #[serde(default)]
    pub enabled: bool,
    /// Send signal lifecycle alerts.
    #[serde(default = "default_true")]
    pub notify_signals: bool,
    /// Send risk rejection alerts (can be noisy).
    #[serde(default)]
    pub notify_rejections: bool,
    /// Send bot status and settings alerts.
    #[serde(default = "default_true")]
    pub notify_status: bool,
}

impl Default for TelegramAppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            notify_signals: default_true(),
            notify_rejections: false,
            notify_status: default_true(),
        }
    }
}

#[cfg(feature = "telegram")]
impl TelegramAppConfig {
    /// Notifier settings, or `None` when disabled or credentials are missing.
    #[must_use]
    pub fn notifier_config(&self) -> Option<crate::adapter::notifier::TelegramConfig> {
        use crate::adapter::notifier::TelegramConfig;

        if !self.enabled {
            return None;
        }
        TelegramConfig::from_env().map(|env| TelegramConfig {
            notify_signals: self.notify_signals,
            notify_rejections: self.notify_rejections,
            notify_status: self.notify_status,
            ..env
        })
    }
}
