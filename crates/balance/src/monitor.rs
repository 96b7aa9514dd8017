use crate::{Balance, BalanceQuery, Monitor};
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use binding::token::IERC20;
use eyre::{Result, WrapErr};
use std::{future::Future, time::Duration};
use tracing::debug;

/// Balance lookups over JSON-RPC, each bounded by a timeout.
pub struct BalanceMonitor<P> {
    provider: P,
    timeout: Duration,
}

impl<P> BalanceMonitor<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    async fn bounded<T>(&self, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .wrap_err_with(|| format!("{what} timed out after {:?}", self.timeout))?
    }

    async fn native_amount(&self, address: Address) -> Result<U256> {
        self.bounded("eth_getBalance", async {
            Ok(self.provider.get_balance(address).await?)
        })
        .await
    }

    async fn token_amount(&self, token: Address, holder: Address) -> Result<U256> {
        let contract = IERC20::new(token, &self.provider);
        self.bounded("balanceOf", async {
            Ok(contract.balanceOf(holder).call().await?)
        })
        .await
        .wrap_err_with(|| format!("balanceOf on token {token}"))
    }
}

impl<P> Monitor for BalanceMonitor<P>
where
    P: Provider + Clone,
{
    async fn query_balance(&self, query: BalanceQuery) -> Result<Balance> {
        let holder = query.holder();
        let (asset, amount) = match query {
            BalanceQuery::ERC20Balance { token, holder } => {
                debug!(%token, %holder, "Querying token balance over RPC");
                (token, self.token_amount(token, holder).await?)
            }
            BalanceQuery::NativeBalance { address } => {
                debug!(%address, "Querying native balance over RPC");
                (Address::ZERO, self.native_amount(address).await?)
            }
        };

        Ok(Balance {
            holder,
            asset,
            amount,
        })
    }
}
