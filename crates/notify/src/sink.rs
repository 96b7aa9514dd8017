//! Outbound delivery.

use crate::{
    telegram::{ParseMode, TelegramBot},
    NotifyError,
};
use std::future::Future;

/// Destination for rendered alerts.
pub trait AlertSink: Send + Sync {
    /// Deliver one alert. An `Err` means the alert was not delivered.
    fn send_alert(&self, text: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Reply channel for command acknowledgements.
pub trait ChatReply: Send + Sync {
    fn reply(&self, chat_id: i64, text: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Sends alerts to one configured chat.
#[derive(Debug, Clone)]
pub struct TelegramSink {
    bot: TelegramBot,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(bot: TelegramBot, chat_id: impl Into<String>) -> Self {
        Self {
            bot,
            chat_id: chat_id.into(),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub const fn bot(&self) -> &TelegramBot {
        &self.bot
    }
}

impl AlertSink for TelegramSink {
    async fn send_alert(&self, text: &str) -> Result<(), NotifyError> {
        self.bot
            .send_message(&self.chat_id, text, ParseMode::Markdown)
            .await
            .map(|_| ())
    }
}

impl ChatReply for TelegramBot {
    async fn reply(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        self.send_message(&chat_id.to_string(), text, ParseMode::Markdown)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_api_is_an_error() {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let bot = TelegramBot::new(http, "1:token").with_api_base("http://127.0.0.1:9");
        let sink = TelegramSink::new(bot, "42");

        let err = sink.send_alert("hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::Http(_)));
    }
}
