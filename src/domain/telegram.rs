//! Telegram link credentials forwarded to the ingestion gateway.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ValidationError;

/// Opaque credential bundle plus connection bookkeeping.
///
/// Nothing here is checked beyond being non-empty; the gateway owns the
/// real handshake with the bot API.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelegramLink {
    #[serde(skip_serializing)]
    bot_token: String,
    chat_id: String,
    connected: bool,
    last_sync: Option<DateTime<Utc>>,
}

impl TelegramLink {
    /// Build a connected link, stamping `now` as the last sync time.
    pub fn connect(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let bot_token = bot_token.into();
        let chat_id = chat_id.into();

        if bot_token.trim().is_empty() {
            return Err(ValidationError::new("bot_token", "must not be empty"));
        }
        if chat_id.trim().is_empty() {
            return Err(ValidationError::new("chat_id", "must not be empty"));
        }

        Ok(Self {
            bot_token,
            chat_id,
            connected: true,
            last_sync: Some(now),
        })
    }

    /// Keep the credentials but mark the link down.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    #[must_use]
    pub fn bot_token(&self) -> &str {
        &self.bot_token
    }

    #[must_use]
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_requires_both_credentials() {
        let now = Utc::now();
        assert_eq!(
            TelegramLink::connect("", "42", now).unwrap_err().field,
            "bot_token"
        );
        assert_eq!(
            TelegramLink::connect("token", " ", now).unwrap_err().field,
            "chat_id"
        );
    }

    #[test]
    fn test_connect_and_disconnect() {
        let now = Utc::now();
        let mut link = TelegramLink::connect("token", "42", now).unwrap();
        assert!(link.is_connected());
        assert_eq!(link.last_sync(), Some(now));

        link.disconnect();
        assert!(!link.is_connected());
        assert_eq!(link.chat_id(), "42");
    }

    #[test]
    fn test_token_is_never_serialized() {
        let link = TelegramLink::connect("secret-token", "42", Utc::now()).unwrap();
        let json = serde_json::to_string(&link).unwrap();
        assert!(!json.contains("secret-token"));
    }
}
