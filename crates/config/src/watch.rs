//! Watch file schema: which wallets to follow and how to poll them.

use crate::network::{NetworkConfig, NetworkConfigBuilder, NetworkType};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};
use thiserror::Error;
use transfer::{amount::MAX_DECIMALS, AdvancePolicy, NeitherPolicy, WindowPolicy};

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config or wallets file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Wallets JSON syntax or schema error
    #[error("invalid wallets file {path}: {source}")]
    WalletsJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A setting is present but unusable
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// A required setting or secret is absent
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// A wallet to watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedWallet {
    /// Label shown in alerts
    pub name: String,
    pub address: Address,
}

/// A token whose balance is listed in alert summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedToken {
    pub symbol: String,
    /// Token contract address
    pub address: Address,
    pub decimals: u8,
}

/// How bot commands reach the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandTransport {
    /// Pull updates with `getUpdates`.
    #[default]
    LongPoll,
    /// Receive updates on the HTTP server via a registered webhook.
    Webhook,
}

const fn default_poll_interval() -> u64 {
    60
}

const fn default_lookback() -> u64 {
    3600
}

const fn default_fetch_timeout() -> u64 {
    20
}

const fn default_port() -> u16 {
    3000
}

/// Contents of the watch file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Network preset
    #[serde(default)]
    pub network: NetworkType,

    /// Explorer API endpoint override
    #[serde(default)]
    pub explorer_api_url: Option<String>,

    /// Seconds between polling cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Only alert transfers younger than this many seconds; 0 disables
    #[serde(default = "default_lookback")]
    pub lookback_secs: u64,

    /// Upper bound for every outbound HTTP request
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Start cursors at the current head block instead of block 0
    #[serde(default)]
    pub skip_history: bool,

    #[serde(default)]
    pub neither_policy: NeitherPolicy,

    #[serde(default)]
    pub window_policy: WindowPolicy,

    #[serde(default)]
    pub advance_policy: AdvancePolicy,

    /// Append a balance summary to every alert
    #[serde(default)]
    pub include_balances: bool,

    /// JSON-RPC endpoint for balance queries; the explorer is used otherwise
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Port of the liveness (and webhook) HTTP server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Port of the Prometheus exporter, disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,

    #[serde(default)]
    pub command_transport: CommandTransport,

    /// Public URL Telegram should deliver updates to (webhook transport)
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default)]
    pub wallets: Vec<WatchedWallet>,

    /// JSON file with additional wallets: `[{"name": .., "address": ..}]`
    #[serde(default)]
    pub wallets_file: Option<PathBuf>,

    #[serde(default)]
    pub tokens: Vec<TrackedToken>,
}

impl WatchConfig {
    /// Load, merge the wallets file and validate.
    ///
    /// A relative `wallets_file` is resolved against the config file's
    /// directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut config = Self::from_toml_str(&contents)?;
        config.load_wallets_file(base)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without touching the filesystem or validating.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    fn load_wallets_file(&mut self, base: &Path) -> Result<(), ConfigError> {
        let Some(file) = &self.wallets_file else {
            return Ok(());
        };
        let path = if file.is_absolute() {
            file.clone()
        } else {
            base.join(file)
        };
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let wallets: Vec<WatchedWallet> = serde_json::from_str(&contents)
            .map_err(|source| ConfigError::WalletsJson { path, source })?;
        self.wallets.extend(wallets);
        Ok(())
    }

    /// Reject configurations the watcher cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wallets.is_empty() {
            return Err(ConfigError::Missing("wallets"));
        }

        let mut seen = HashSet::new();
        for wallet in &self.wallets {
            if wallet.name.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "wallets",
                    format!("wallet {} has an empty name", wallet.address),
                ));
            }
            if !seen.insert(wallet.address) {
                return Err(ConfigError::invalid(
                    "wallets",
                    format!("duplicate address {}", wallet.address),
                ));
            }
        }

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::invalid("poll_interval_secs", "must be positive"));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::invalid("fetch_timeout_secs", "must be positive"));
        }

        for token in &self.tokens {
            if token.decimals > MAX_DECIMALS {
                return Err(ConfigError::invalid(
                    "tokens",
                    format!("{} has {} decimals", token.symbol, token.decimals),
                ));
            }
            if token.symbol.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "tokens",
                    format!("token {} has an empty symbol", token.address),
                ));
            }
        }

        if self.command_transport == CommandTransport::Webhook {
            match self.webhook_url.as_deref() {
                None | Some("") => return Err(ConfigError::Missing("webhook_url")),
                Some(url) if !url.starts_with("https://") => {
                    return Err(ConfigError::invalid("webhook_url", "must be an https URL"));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Lookback window, `None` when disabled.
    pub const fn lookback(&self) -> Option<u64> {
        match self.lookback_secs {
            0 => None,
            secs => Some(secs),
        }
    }

    /// Network preset with any explorer override applied.
    pub fn network_config(&self) -> NetworkConfig {
        let builder = NetworkConfigBuilder::new(self.network);
        match &self.explorer_api_url {
            Some(url) => builder.api_url(url.clone()).build(),
            None => builder.build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const MINIMAL: &str = r#"
        [[wallets]]
        name = "Treasury"
        address = "0x857c67C421d3E94daC5aBB0EaA4d34b26722B4fB"
    "#;

    #[test]
    fn test_defaults() {
        let config = WatchConfig::from_toml_str(MINIMAL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.network, NetworkType::Mainnet);
        assert_eq!(config.poll_interval_secs, 60);
        assert_eq!(config.lookback(), Some(3600));
        assert_eq!(config.port, 3000);
        assert_eq!(config.neither_policy, NeitherPolicy::Surface);
        assert_eq!(config.window_policy, WindowPolicy::BlockGated);
        assert_eq!(config.advance_policy, AdvancePolicy::AfterDispatch);
        assert_eq!(config.command_transport, CommandTransport::LongPoll);
        assert_eq!(
            config.wallets[0].address,
            address!("857c67c421d3e94dac5abb0eaa4d34b26722b4fb")
        );
    }

    #[test]
    fn test_full_file() {
        let config = WatchConfig::from_toml_str(
            r#"
            network = "sepolia"
            poll_interval_secs = 3600
            lookback_secs = 0
            skip_history = true
            neither_policy = "drop"
            window_policy = "time_gated"
            advance_policy = "on_admit"
            include_balances = true
            command_transport = "webhook"
            webhook_url = "https://bot.example.com/telegram/webhook"

            [[wallets]]
            name = "Hot"
            address = "0x1111111111111111111111111111111111111111"

            [[tokens]]
            symbol = "USDC"
            address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
            decimals = 6
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.network_config().explorer.chain_id, 11155111);
        assert_eq!(config.lookback(), None);
        assert_eq!(config.neither_policy, NeitherPolicy::Drop);
        assert_eq!(config.window_policy, WindowPolicy::TimeGated);
        assert_eq!(config.advance_policy, AdvancePolicy::OnAdmit);
        assert_eq!(config.tokens[0].decimals, 6);
    }

    #[test]
    fn test_no_wallets_rejected() {
        let config = WatchConfig::from_toml_str("").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("wallets"))
        ));
    }

    #[test]
    fn test_duplicate_wallet_rejected() {
        let config = WatchConfig::from_toml_str(
            r#"
            [[wallets]]
            name = "a"
            address = "0x857c67C421d3E94daC5aBB0EaA4d34b26722B4fB"
            [[wallets]]
            name = "b"
            address = "0x857c67c421d3e94dac5abb0eaa4d34b26722b4fb"
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate address"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = WatchConfig::from_toml_str(MINIMAL).unwrap();
        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_webhook_requires_url() {
        let mut config = WatchConfig::from_toml_str(MINIMAL).unwrap();
        config.command_transport = CommandTransport::Webhook;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("webhook_url"))
        ));

        config.webhook_url = Some("http://insecure.example.com".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = WatchConfig::from_toml_str("poll_intervall = 5");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_wallets_file_merged() {
        let dir = std::env::temp_dir().join(format!("watch-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("wallets.json"),
            r#"[{"name": "Legacy", "address": "0x2222222222222222222222222222222222222222"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("watcher.toml"),
            format!("wallets_file = \"wallets.json\"\n{MINIMAL}"),
        )
        .unwrap();

        let config = WatchConfig::from_file(dir.join("watcher.toml")).unwrap();
        assert_eq!(config.wallets.len(), 2);
        assert_eq!(config.wallets[1].name, "Legacy");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
