//! Tracing-backed and no-op notifiers.

use tracing::{info, warn};

use crate::port::{Event, Notifier};

/// A no-op notifier for testing or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::Lifecycle(e) => {
                let from = e.from.map_or("NEW", |s| s.as_str());
                info!(
                    signal_id = %e.signal_id,
                    pair = %e.pair,
                    direction = %e.direction,
                    from = from,
                    to = %e.to,
                    profit = ?e.profit,
                    "Signal lifecycle"
                );
            }
            Event::SignalRejected(e) => {
                info!(
                    pair = %e.pair,
                    direction = %e.direction,
                    reason = %e.reason,
                    "Signal rejected"
                );
            }
            Event::BotStatusChanged {
                from, to, reason, ..
            } => {
                if let Some(reason) = reason {
                    warn!(from = %from, to = %to, reason = %reason, "Bot status changed");
                } else {
                    info!(from = %from, to = %to, "Bot status changed");
                }
            }
            Event::TelegramLinkChanged { connected, .. } => {
                info!(connected, "Telegram link changed");
            }
            Event::RiskConfigurationUpdated { .. } => {
                info!("Risk configuration updated");
            }
        }
    }
}
