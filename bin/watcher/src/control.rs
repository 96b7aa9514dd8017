//! Bot command handling.

use crate::{metrics::Metrics, MonitorState};
use notify::{ChatReply, Command, CommandChannel, IncomingCommand};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const RESUMED_REPLY: &str = "✅ Monitoring resumed.";
pub const PAUSED_REPLY: &str = "⏸️ Monitoring paused.";
pub const ACTIVE_STATUS: &str = "▶️ Monitoring is active.";
pub const PAUSED_STATUS: &str = "⏸️ Monitoring is paused.";

pub const HELP_TEXT: &str = "\
🤖 *Wallet watcher*

/start - resume transfer alerts
/stop - pause transfer alerts
/status - show whether alerts are active
/help - show this message";

/// Applies commands from the configured chat to the shared [`MonitorState`].
#[derive(Debug, Clone)]
pub struct Controller {
    state: Arc<MonitorState>,
    chat_id: String,
    metrics: Metrics,
}

impl Controller {
    pub fn new(state: Arc<MonitorState>, chat_id: impl Into<String>) -> Self {
        let metrics = Metrics::new();
        metrics.set_active(state.is_active());
        Self {
            state,
            chat_id: chat_id.into().trim().to_string(),
            metrics,
        }
    }

    fn is_authorized(&self, chat_id: i64) -> bool {
        chat_id.to_string() == self.chat_id
    }

    /// Apply a command and return the reply, or `None` when the command came
    /// from a chat other than the configured one.
    pub fn handle(&self, incoming: &IncomingCommand) -> Option<&'static str> {
        if !self.is_authorized(incoming.chat_id) {
            debug!(chat_id = incoming.chat_id, command = %incoming.command, "Ignoring command from unknown chat");
            return None;
        }

        let reply = match incoming.command {
            Command::Start => {
                let was_active = self.state.set_active(true);
                info!(was_active, "Monitoring resumed");
                self.metrics.set_active(true);
                RESUMED_REPLY
            }
            Command::Stop => {
                let was_active = self.state.set_active(false);
                info!(was_active, "Monitoring paused");
                self.metrics.set_active(false);
                PAUSED_REPLY
            }
            Command::Status => {
                if self.state.is_active() {
                    ACTIVE_STATUS
                } else {
                    PAUSED_STATUS
                }
            }
            Command::Help => HELP_TEXT,
        };
        Some(reply)
    }
}

/// Consume commands from `channel` until it closes, replying through `replier`.
pub async fn run_commands<C, R>(controller: Controller, mut channel: C, replier: R)
where
    C: CommandChannel,
    R: ChatReply,
{
    info!("Listening for bot commands");

    while let Some(incoming) = channel.next_command().await {
        let Some(reply) = controller.handle(&incoming) else {
            continue;
        };
        if let Err(e) = replier.reply(incoming.chat_id, reply).await {
            warn!(command = %incoming.command, error = %e, "Failed to reply to command");
        }
    }

    info!("Command channel closed");
}
