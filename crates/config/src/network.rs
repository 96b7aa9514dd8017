//! Network presets for the block explorer.
//!
//! Provides the explorer API endpoint, chain id and transaction link prefix
//! for each supported network (mainnet, testnet).

use serde::{Deserialize, Serialize};

/// Network type (mainnet or testnet).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    #[default]
    Mainnet,
    #[serde(alias = "testnet")]
    Sepolia,
}

/// Etherscan v2 multichain endpoint.
pub const ETHERSCAN_V2_API: &str = "https://api.etherscan.io/v2/api";

/// Explorer configuration for one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Chain ID, sent as `chainid` on every API call
    pub chain_id: u64,
    /// API endpoint
    pub api_url: String,
    /// Prefix for transaction links in alerts
    pub tx_url_base: String,
    /// Native currency symbol
    pub native_symbol: String,
}

impl ExplorerConfig {
    /// Ethereum mainnet configuration.
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            api_url: ETHERSCAN_V2_API.to_string(),
            // https://etherscan.io/tx/<hash>
            tx_url_base: "https://etherscan.io/tx/".to_string(),
            native_symbol: "ETH".to_string(),
        }
    }

    /// Ethereum Sepolia testnet configuration.
    pub fn sepolia() -> Self {
        Self {
            chain_id: 11155111,
            api_url: ETHERSCAN_V2_API.to_string(),
            // https://sepolia.etherscan.io/tx/<hash>
            tx_url_base: "https://sepolia.etherscan.io/tx/".to_string(),
            native_symbol: "ETH".to_string(),
        }
    }
}

/// Complete network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network type (mainnet or testnet)
    pub network_type: NetworkType,
    /// Explorer configuration
    pub explorer: ExplorerConfig,
}

impl NetworkConfig {
    /// Create mainnet configuration.
    pub fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            explorer: ExplorerConfig::mainnet(),
        }
    }

    /// Create testnet (Sepolia) configuration.
    pub fn sepolia() -> Self {
        Self {
            network_type: NetworkType::Sepolia,
            explorer: ExplorerConfig::sepolia(),
        }
    }

    /// Create configuration from network type.
    pub fn from_network_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Sepolia => Self::sepolia(),
        }
    }
}

/// Builder for custom network configurations.
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    network_type: NetworkType,
    explorer: ExplorerConfig,
}

impl NetworkConfigBuilder {
    /// Start with the defaults of `network_type`.
    pub fn new(network_type: NetworkType) -> Self {
        let NetworkConfig {
            network_type,
            explorer,
        } = NetworkConfig::from_network_type(network_type);
        Self {
            network_type,
            explorer,
        }
    }

    /// Start with mainnet defaults.
    pub fn mainnet() -> Self {
        Self::new(NetworkType::Mainnet)
    }

    /// Start with testnet defaults.
    pub fn testnet() -> Self {
        Self::new(NetworkType::Sepolia)
    }

    /// Override the explorer API endpoint.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.explorer.api_url = url.into();
        self
    }

    /// Override the transaction link prefix.
    pub fn tx_url_base(mut self, url: impl Into<String>) -> Self {
        self.explorer.tx_url_base = url.into();
        self
    }

    /// Override the chain id.
    pub const fn chain_id(mut self, chain_id: u64) -> Self {
        self.explorer.chain_id = chain_id;
        self
    }

    /// Build the network configuration.
    pub fn build(self) -> NetworkConfig {
        NetworkConfig {
            network_type: self.network_type,
            explorer: self.explorer,
        }
    }
}
