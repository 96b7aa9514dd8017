use clap::Args;
use config::{ConfigError, WatchConfig};
use std::{fmt, path::Path};

/// Credentials supplied through the environment, never the watch file.
#[derive(Clone, Args)]
pub struct Secrets {
    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Chat that receives alerts and may send commands
    #[arg(long, env = "CHAT_ID")]
    pub chat_id: String,

    /// Etherscan API key
    #[arg(long = "etherscan-api-key", env = "ETHERSCAN_API", hide_env_values = true)]
    pub etherscan_api_key: String,

    /// Secret Telegram echoes on webhook deliveries
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("chat_id", &self.chat_id)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<set>"))
            .finish_non_exhaustive()
    }
}

impl Secrets {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::Missing("BOT_TOKEN"));
        }
        if self.chat_id.trim().is_empty() {
            return Err(ConfigError::Missing("CHAT_ID"));
        }
        if self.etherscan_api_key.trim().is_empty() {
            return Err(ConfigError::Missing("ETHERSCAN_API"));
        }
        Ok(())
    }
}

/// Top-level watcher configuration: the validated watch file plus secrets.
#[derive(Debug, Clone)]
pub struct Config {
    pub watch: WatchConfig,
    pub secrets: Secrets,
}

impl Config {
    /// Load the watch file and validate everything before any task starts.
    pub fn load(path: impl AsRef<Path>, secrets: Secrets) -> Result<Self, ConfigError> {
        let watch = WatchConfig::from_file(path)?;
        Self::new(watch, secrets)
    }

    pub fn new(watch: WatchConfig, secrets: Secrets) -> Result<Self, ConfigError> {
        watch.validate()?;
        secrets.validate()?;
        Ok(Self { watch, secrets })
    }

    /// Apply a `PORT` override from the environment or command line.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.watch.port = port;
        }
        self
    }

    /// Webhook secret, ignoring an empty value.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.secrets
            .webhook_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> Secrets {
        Secrets {
            bot_token: "123:abc".into(),
            chat_id: "-100200".into(),
            etherscan_api_key: "KEY".into(),
            webhook_secret: None,
        }
    }

    fn watch() -> WatchConfig {
        WatchConfig::from_toml_str(
            r#"
            [[wallets]]
            name = "Treasury"
            address = "0x857c67C421d3E94daC5aBB0EaA4d34b26722B4fB"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_config() {
        let config = Config::new(watch(), secrets()).unwrap().with_port(Some(8080));
        assert_eq!(config.watch.port, 8080);
        assert_eq!(config.webhook_secret(), None);
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut secrets = secrets();
        secrets.bot_token = "  ".into();
        let err = Config::new(watch(), secrets).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BOT_TOKEN")));
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", secrets());
        assert!(!rendered.contains("123:abc"));
        assert!(!rendered.contains("KEY"));
    }
}
