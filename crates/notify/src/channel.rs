//! Inbound command delivery.
//!
//! Commands arrive either by long-polling `getUpdates` or by Telegram
//! pushing updates to our webhook endpoint. Both are exposed through
//! [`CommandChannel`].

use crate::{
    command::IncomingCommand,
    telegram::{TelegramBot, Update},
};
use std::{collections::VecDeque, future::Future, time::Duration};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Server-side wait per `getUpdates` call.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll.
pub const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

/// A stream of bot commands.
pub trait CommandChannel: Send {
    /// Wait for the next command. `None` once the channel is closed.
    fn next_command(&mut self) -> impl Future<Output = Option<IncomingCommand>> + Send;
}

/// Pulls commands with `getUpdates`.
#[derive(Debug)]
pub struct LongPollChannel {
    bot: TelegramBot,
    offset: Option<i64>,
    poll_timeout_secs: u64,
    pending: VecDeque<IncomingCommand>,
}

impl LongPollChannel {
    pub fn new(bot: TelegramBot) -> Self {
        Self {
            bot,
            offset: None,
            poll_timeout_secs: LONG_POLL_TIMEOUT_SECS,
            pending: VecDeque::new(),
        }
    }

    pub const fn with_poll_timeout(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    /// Queue commands from a batch of updates and move the offset past them.
    fn absorb(&mut self, updates: Vec<Update>) {
        for update in updates {
            self.offset = Some(self.offset.map_or(update.update_id + 1, |o| o.max(update.update_id + 1)));
            if let Some(command) = update.command() {
                self.pending.push_back(command);
            }
        }
    }
}

impl CommandChannel for LongPollChannel {
    async fn next_command(&mut self) -> Option<IncomingCommand> {
        loop {
            if let Some(command) = self.pending.pop_front() {
                return Some(command);
            }

            match self.bot.get_updates(self.offset, self.poll_timeout_secs).await {
                Ok(updates) => {
                    debug!(count = updates.len(), offset = ?self.offset, "Polled updates");
                    self.absorb(updates);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to poll bot updates");
                    tokio::time::sleep(POLL_ERROR_PAUSE).await;
                }
            }
        }
    }
}

/// Producer half handed to the webhook endpoint.
#[derive(Debug, Clone)]
pub struct UpdateSender(mpsc::Sender<Update>);

impl UpdateSender {
    /// Forward an update. Returns `false` if the consumer has gone away.
    pub async fn forward(&self, update: Update) -> bool {
        self.0.send(update).await.is_ok()
    }
}

/// Receives updates pushed to the webhook endpoint.
#[derive(Debug)]
pub struct WebhookChannel {
    rx: mpsc::Receiver<Update>,
}

/// Create a linked webhook sender and channel.
pub fn webhook_channel(capacity: usize) -> (UpdateSender, WebhookChannel) {
    let (tx, rx) = mpsc::channel(capacity);
    (UpdateSender(tx), WebhookChannel { rx })
}

impl CommandChannel for WebhookChannel {
    async fn next_command(&mut self) -> Option<IncomingCommand> {
        while let Some(update) = self.rx.recv().await {
            if let Some(command) = update.command() {
                return Some(command);
            }
            debug!(update_id = update.update_id, "Ignoring non-command update");
        }
        None
    }
}
