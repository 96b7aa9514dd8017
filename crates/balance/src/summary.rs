//! Balance summary block appended to alerts.

use crate::{BalanceQuery, Monitor};
use alloy_primitives::Address;
use config::TrackedToken;
use std::{fmt::Write, future::Future};
use tracing::warn;
use transfer::{format_amount, render::escape_markdown, NATIVE_DECIMALS};

/// Produces the balance summary for a wallet.
pub trait Report: Send + Sync {
    /// Summary text, or `None` when summaries are disabled.
    fn summarize(&self, holder: Address) -> impl Future<Output = eyre::Result<Option<String>>> + Send;
}

/// Report that never produces a summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBalances;

impl Report for NoBalances {
    async fn summarize(&self, _holder: Address) -> eyre::Result<Option<String>> {
        Ok(None)
    }
}

impl<R> Report for Option<R>
where
    R: Report,
{
    async fn summarize(&self, holder: Address) -> eyre::Result<Option<String>> {
        match self {
            Some(report) => report.summarize(holder).await,
            None => Ok(None),
        }
    }
}

/// Summarises the native balance and each tracked token through a [`Monitor`].
pub struct BalanceReporter<M> {
    monitor: M,
    native_symbol: String,
    tokens: Vec<TrackedToken>,
}

impl<M> BalanceReporter<M>
where
    M: Monitor,
{
    pub fn new(monitor: M, native_symbol: impl Into<String>, tokens: Vec<TrackedToken>) -> Self {
        Self {
            monitor,
            native_symbol: native_symbol.into(),
            tokens,
        }
    }

    /// Render the summary. A failed native query fails the whole summary; a
    /// failed token query is shown as unavailable.
    pub async fn render(&self, holder: Address) -> eyre::Result<String> {
        let native = self
            .monitor
            .query_balance(BalanceQuery::native(holder))
            .await?;

        let mut summary = String::from("💼 Balances:");
        let _ = write!(
            summary,
            "\n• {}: {}",
            escape_markdown(&self.native_symbol),
            format_amount(&native.amount.to_string(), NATIVE_DECIMALS)?
        );

        for token in &self.tokens {
            let query = BalanceQuery::token(token.address, holder);
            let shown = match self.monitor.query_balance(query).await {
                Ok(balance) => format_amount(&balance.amount.to_string(), token.decimals)?,
                Err(e) => {
                    warn!(
                        token = %token.symbol,
                        holder = %holder,
                        error = %e,
                        "Token balance lookup failed"
                    );
                    "unavailable".to_string()
                }
            };
            let _ = write!(summary, "\n• {}: {}", escape_markdown(&token.symbol), shown);
        }

        Ok(summary)
    }
}

impl<M> Report for BalanceReporter<M>
where
    M: Monitor,
{
    async fn summarize(&self, holder: Address) -> eyre::Result<Option<String>> {
        self.render(holder).await.map(Some)
    }
}
