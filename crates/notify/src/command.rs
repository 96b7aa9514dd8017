//! Bot commands accepted from the chat.

use crate::telegram::Update;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Resume monitoring
    Start,
    /// Pause monitoring
    Stop,
    /// Report whether monitoring is active
    Status,
    Help,
}

impl Command {
    /// Parse the leading `/command` of a message.
    ///
    /// Accepts the `/command@BotName` form and ignores trailing arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let name = token.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "status" => Some(Self::Status),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Stop => "/stop",
            Self::Status => "/status",
            Self::Help => "/help",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognised command together with the chat it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingCommand {
    pub chat_id: i64,
    pub command: Command,
}

impl Update {
    /// Extract a command from this update, if it carries one.
    pub fn command(&self) -> Option<IncomingCommand> {
        let message = self.message()?;
        let command = Command::parse(message.text.as_deref()?)?;
        Some(IncomingCommand {
            chat_id: message.chat.id,
            command,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::{Chat, Message};

    #[test]
    fn test_parse_plain() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/stop"), Some(Command::Stop));
        assert_eq!(Command::parse("/help"), Some(Command::Help));
        assert_eq!(Command::parse("/status"), Some(Command::Status));
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(Command::parse("  /stop@WatcherBot now"), Some(Command::Stop));
        assert_eq!(Command::parse("/START"), Some(Command::Start));
    }

    #[test]
    fn test_parse_rejects() {
        assert_eq!(Command::parse("stop"), None);
        assert_eq!(Command::parse("/unknown"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("hello /stop"), None);
    }

    #[test]
    fn test_update_command() {
        let update = Update {
            update_id: 1,
            message: Some(Message {
                message_id: 5,
                chat: Chat { id: 42 },
                text: Some("/stop".into()),
            }),
            channel_post: None,
        };
        assert_eq!(
            update.command(),
            Some(IncomingCommand {
                chat_id: 42,
                command: Command::Stop
            })
        );

        let no_text = Update {
            update_id: 2,
            message: Some(Message {
                message_id: 6,
                chat: Chat { id: 42 },
                text: None,
            }),
            channel_post: None,
        };
        assert_eq!(no_text.command(), None);
    }
}
