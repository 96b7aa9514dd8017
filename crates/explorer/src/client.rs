use crate::{
    response::{parse_balance, parse_head_block, parse_transfers},
    ExplorerError, TransferSource, END_BLOCK, MAX_RECORDS,
};
use alloy_primitives::{Address, U256};
use balance::{Balance, BalanceQuery, Monitor};
use config::ExplorerConfig;
use tracing::debug;
use transfer::{normalized, TransferKind, TransferRecord};

/// Etherscan-compatible API client.
#[derive(Clone)]
pub struct ExplorerClient {
    http: reqwest::Client,
    config: ExplorerConfig,
    api_key: String,
}

impl std::fmt::Debug for ExplorerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerClient")
            .field("api_url", &self.config.api_url)
            .field("chain_id", &self.config.chain_id)
            .finish_non_exhaustive()
    }
}

impl ExplorerClient {
    /// `http` should carry a request timeout (see `client::create_http_client`).
    pub fn new(http: reqwest::Client, config: ExplorerConfig, api_key: impl Into<String>) -> Self {
        Self {
            http,
            config,
            api_key: api_key.into(),
        }
    }

    pub const fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Issue a GET with the common `chainid`/`apikey` parameters and return
    /// the body of a 2xx response.
    async fn get(&self, params: &[(&str, String)]) -> Result<String, ExplorerError> {
        let chain_id = self.config.chain_id.to_string();
        let mut query: Vec<(&str, &str)> = vec![("chainid", chain_id.as_str())];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        query.push(("apikey", self.api_key.as_str()));

        let response = self
            .http
            .get(&self.config.api_url)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExplorerError::Status {
                status: status.as_u16(),
                body: body.chars().take(256).collect(),
            });
        }
        Ok(body)
    }

    async fn list(
        &self,
        action: &str,
        kind: TransferKind,
        address: Address,
        start_block: u64,
    ) -> Result<Vec<TransferRecord>, ExplorerError> {
        debug!(%action, address = %normalized(&address), start_block, "Listing transfers");

        let body = self
            .get(&[
                ("module", "account".to_string()),
                ("action", action.to_string()),
                ("address", normalized(&address)),
                ("startblock", start_block.to_string()),
                ("endblock", END_BLOCK.to_string()),
                ("page", "1".to_string()),
                ("offset", MAX_RECORDS.to_string()),
                ("sort", "asc".to_string()),
            ])
            .await?;

        parse_transfers(&body, kind)
    }

    /// Native currency transfers (`account/txlist`).
    pub async fn native_transfers(
        &self,
        address: Address,
        start_block: u64,
    ) -> Result<Vec<TransferRecord>, ExplorerError> {
        self.list("txlist", TransferKind::Native, address, start_block)
            .await
    }

    /// ERC20 transfers (`account/tokentx`).
    pub async fn token_transfers(
        &self,
        address: Address,
        start_block: u64,
    ) -> Result<Vec<TransferRecord>, ExplorerError> {
        self.list("tokentx", TransferKind::Token, address, start_block)
            .await
    }

    /// Current head block (`proxy/eth_blockNumber`).
    pub async fn block_number(&self) -> Result<u64, ExplorerError> {
        let body = self
            .get(&[
                ("module", "proxy".to_string()),
                ("action", "eth_blockNumber".to_string()),
            ])
            .await?;
        parse_head_block(&body)
    }

    /// Native balance at the latest block (`account/balance`).
    pub async fn native_balance(&self, address: Address) -> Result<U256, ExplorerError> {
        let body = self
            .get(&[
                ("module", "account".to_string()),
                ("action", "balance".to_string()),
                ("address", normalized(&address)),
                ("tag", "latest".to_string()),
            ])
            .await?;
        parse_balance(&body)
    }

    /// ERC20 balance at the latest block (`account/tokenbalance`).
    pub async fn token_balance(&self, token: Address, holder: Address) -> Result<U256, ExplorerError> {
        let body = self
            .get(&[
                ("module", "account".to_string()),
                ("action", "tokenbalance".to_string()),
                ("contractaddress", normalized(&token)),
                ("address", normalized(&holder)),
                ("tag", "latest".to_string()),
            ])
            .await?;
        parse_balance(&body)
    }
}

impl TransferSource for ExplorerClient {
    async fn transfers(
        &self,
        address: Address,
        kind: TransferKind,
        start_block: u64,
    ) -> Result<Vec<TransferRecord>, ExplorerError> {
        match kind {
            TransferKind::Native => self.native_transfers(address, start_block).await,
            TransferKind::Token => self.token_transfers(address, start_block).await,
        }
    }

    async fn head_block(&self) -> Result<u64, ExplorerError> {
        self.block_number().await
    }
}

impl Monitor for ExplorerClient {
    async fn query_balance(&self, query: BalanceQuery) -> eyre::Result<Balance> {
        match query {
            BalanceQuery::NativeBalance { address } => Ok(Balance {
                holder: address,
                asset: Address::ZERO,
                amount: self.native_balance(address).await?,
            }),
            BalanceQuery::ERC20Balance { token, holder } => Ok(Balance {
                holder,
                asset: token,
                amount: self.token_balance(token, holder).await?,
            }),
        }
    }
}
