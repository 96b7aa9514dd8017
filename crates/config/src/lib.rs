//! Configuration types for the wallet watcher.
//!
//! This crate provides:
//! - Network presets (mainnet, testnet) for the block explorer
//! - The watch file schema (wallets, tokens, polling policies)
//! - Configuration loading and validation

pub mod network;
pub mod watch;

pub use network::{ExplorerConfig, NetworkConfig, NetworkConfigBuilder, NetworkType};
pub use watch::{CommandTransport, ConfigError, TrackedToken, WatchConfig, WatchedWallet};
