//! Messaging bot integration.
//!
//! This crate provides:
//! - A minimal Telegram Bot API client
//! - The [`AlertSink`] alerts are delivered through
//! - Bot command parsing
//! - Inbound command channels over long polling or a webhook

pub mod channel;
pub mod command;
pub mod sink;
pub mod telegram;

use thiserror::Error;

pub use channel::{webhook_channel, CommandChannel, LongPollChannel, UpdateSender, WebhookChannel};
pub use command::{Command, IncomingCommand};
pub use sink::{AlertSink, ChatReply, TelegramSink};
pub use telegram::{ParseMode, TelegramBot, Update};

#[derive(Error, Debug)]
pub enum NotifyError {
    /// Transport failure, including timeouts
    #[error("bot API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The bot API answered `ok: false`
    #[error("bot API error: {description} (code {code})")]
    Api { code: i64, description: String },

    /// Non-JSON error response
    #[error("bot API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body is not the expected JSON
    #[error("failed to decode bot API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl NotifyError {
    /// The API refused this message itself (bad entities, too long), so
    /// sending the same text again fails the same way. A missing chat is a
    /// setup problem and stays retryable.
    pub fn is_rejected_message(&self) -> bool {
        match self {
            Self::Api { code, description } => {
                *code == 400 && !description.to_ascii_lowercase().contains("chat not found")
            }
            _ => false,
        }
    }
}
