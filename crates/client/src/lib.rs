use alloy_provider::{Provider, ProviderBuilder};
use std::time::Duration;
use thiserror::Error;

/// User agent sent on every outbound HTTP request.
pub const USER_AGENT: &str = concat!("wallet-watcher/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error building the HTTP client
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Convenience function to create an ethereum rpc provider from url.
///
/// The provider owns its transport and can be moved into spawned tasks.
pub fn create_provider(rpc_url: &str) -> Result<impl Provider + Clone, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider)
}

/// Create an HTTP client whose requests give up after `timeout`.
///
/// Every upstream call (explorer, bot API) goes through a client built here
/// so a hung endpoint cannot stall the polling loop.
pub fn create_http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .user_agent(USER_AGENT)
        .build()?;

    Ok(client)
}
