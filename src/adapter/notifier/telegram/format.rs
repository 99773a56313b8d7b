//! Message formatting for Telegram notifications.

use rust_decimal::Decimal;

use crate::domain::{BotStatus, SignalStatus};
use crate::port::{Event, LifecycleEvent};

use super::notifier::TelegramConfig;

/// Format an event into a Telegram message, or None if the event should be skipped.
pub fn format_event_message(event: &Event, config: &TelegramConfig) -> Option<String> {
    match event {
        Event::Lifecycle(e) if config.notify_signals => Some(format_lifecycle(e)),
        Event::SignalRejected(e) if config.notify_rejections => Some(format!(
            "⚠️ *Signal Rejected*\n\
            \n\
            💱 Pair: `{}`\n\
            🚫 Reason: {}",
            escape_markdown(&e.pair),
            escape_markdown(&e.reason.to_string())
        )),
        Event::BotStatusChanged { to, reason, .. } if config.notify_status => {
            let (emoji, title) = match to {
                BotStatus::Active => ("▶️", "Bot Active"),
                BotStatus::Inactive => ("⏸️", "Bot Inactive"),
                BotStatus::Error => ("🛑", "Bot Error"),
            };
            let mut msg = format!("{emoji} *{title}*");
            if let Some(reason) = reason {
                let reason = truncate(reason, 120);
                msg.push_str(&format!("\n\n⚠️ Reason: {}", escape_markdown(&reason)));
            }
            Some(msg)
        }
        Event::TelegramLinkChanged {
            connected: true, ..
        } if config.notify_status => Some("🔗 *Telegram Connected*".to_string()),
        Event::RiskConfigurationUpdated { .. } if config.notify_status => {
            Some("🛡️ *Risk Settings Updated*".to_string())
        }
        _ => None,
    }
}

fn format_lifecycle(e: &LifecycleEvent) -> String {
    let id = truncate(e.signal_id.as_str(), 8);
    let header = format!(
        "💱 Pair: `{}`\n\
        📈 Direction: `{}`\n\
        💵 Entry: `{}`\n\
        🆔 `{}`",
        escape_markdown(&e.pair),
        e.direction,
        escape_markdown(&e.entry_price.to_string()),
        escape_markdown(&id)
    );

    match e.to {
        SignalStatus::Pending => format!("🎯 *New Signal*\n\n{header}"),
        SignalStatus::Executed => format!("✅ *Order Executed*\n\n{header}"),
        SignalStatus::Completed => {
            let profit = e.profit.unwrap_or_default();
            let emoji = if profit >= Decimal::ZERO { "💰" } else { "📉" };
            format!(
                "🏁 *Trade Closed*\n\n{header}\n{emoji} Profit: `{}`",
                escape_markdown(&signed(profit))
            )
        }
        SignalStatus::Cancelled => format!("❌ *Signal Cancelled*\n\n{header}"),
    }
}

fn signed(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{value:.2}")
    } else {
        format!("{value:.2}")
    }
}

/// Truncate a string with ellipsis (Unicode-safe).
pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Escape special characters for Telegram `MarkdownV2`.
pub fn escape_markdown(text: &str) -> String {
    let special_chars = [
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut result = String::with_capacity(text.len() * 2);

    for c in text.chars() {
        if special_chars.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, SignalId};
    use crate::error::RejectReason;
    use crate::port::RejectionEvent;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn config() -> TelegramConfig {
        TelegramConfig {
            bot_token: "t".into(),
            chat_id: 1,
            notify_signals: true,
            notify_rejections: false,
            notify_status: true,
        }
    }

    fn closed(profit: Decimal) -> Event {
        Event::Lifecycle(LifecycleEvent {
            signal_id: SignalId::from("0123456789abcdef"),
            pair: "EURUSD".into(),
            direction: Direction::Buy,
            entry_price: dec!(1.08765),
            from: Some(SignalStatus::Executed),
            to: SignalStatus::Completed,
            profit: Some(profit),
            timestamp: Utc::now(),
        })
    }

    #[test]
    fn test_completed_trade_message() {
        let msg = format_event_message(&closed(dec!(18.7)), &config()).unwrap();
        assert!(msg.contains("Trade Closed"));
        assert!(msg.contains("1\\.08765"));
        assert!(msg.contains("\\+18\\.70"));
        assert!(msg.contains("01234567\\.\\.\\."));
    }

    #[test]
    fn test_losing_trade_message() {
        let msg = format_event_message(&closed(dec!(-5)), &config()).unwrap();
        assert!(msg.contains("📉"));
        assert!(msg.contains("\\-5\\.00"));
    }

    #[test]
    fn test_rejections_respect_flag() {
        let event = Event::SignalRejected(RejectionEvent {
            pair: "USDJPY".into(),
            direction: Direction::Sell,
            entry_price: dec!(151.2),
            reason: RejectReason::OutsideTradingHours,
            timestamp: Utc::now(),
        });
        assert!(format_event_message(&event, &config()).is_none());

        let loud = TelegramConfig {
            notify_rejections: true,
            ..config()
        };
        let msg = format_event_message(&event, &loud).unwrap();
        assert!(msg.contains("outside trading hours"));
    }

    #[test]
    fn test_signals_flag_silences_lifecycle() {
        let quiet = TelegramConfig {
            notify_signals: false,
            ..config()
        };
        assert!(format_event_message(&closed(dec!(1)), &quiet).is_none());
    }

    #[test]
    fn test_bot_error_includes_reason() {
        let event = Event::BotStatusChanged {
            from: BotStatus::Active,
            to: BotStatus::Error,
            reason: Some("venue down".into()),
            timestamp: Utc::now(),
        };
        let msg = format_event_message(&event, &config()).unwrap();
        assert!(msg.contains("Bot Error"));
        assert!(msg.contains("venue down"));
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("hello"), "hello");
        assert_eq!(escape_markdown("hello_world"), "hello\\_world");
        assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
        assert_eq!(escape_markdown("1.5"), "1\\.5");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hello...");
        assert_eq!(truncate("日本語テスト", 3), "日本語...");
    }
}
