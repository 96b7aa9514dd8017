//! Block explorer client.
//!
//! Talks to Etherscan-compatible APIs (v2 multichain endpoint) to list the
//! native and token transfers of a wallet, read the head block and read
//! balances.

pub mod client;
pub mod response;

use alloy_primitives::Address;
use std::future::Future;
use thiserror::Error;
use transfer::{TransferKind, TransferRecord};

pub use client::ExplorerClient;

/// Upper block bound sent with every listing; the API has no "latest" bound.
pub const END_BLOCK: u64 = 99_999_999;

/// Most rows one listing returns; anything past it is cut off.
pub const MAX_RECORDS: usize = 10_000;

#[derive(Error, Debug)]
pub enum ExplorerError {
    /// Transport failure, including timeouts
    #[error("explorer request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("explorer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// `status = "0"` envelope other than an empty result
    #[error("explorer API error: {message} ({result})")]
    Api { message: String, result: String },

    /// Body is not the expected JSON
    #[error("failed to decode explorer response: {0}")]
    Decode(#[from] serde_json::Error),

    /// JSON is well-formed but `result` is unusable
    #[error("unexpected explorer result: {0}")]
    InvalidResult(String),
}

/// Source of transfer listings for watched wallets.
pub trait TransferSource: Send + Sync {
    /// List transfers of `kind` touching `address` from `start_block`
    /// (inclusive) to the chain head, ascending by block.
    fn transfers(
        &self,
        address: Address,
        kind: TransferKind,
        start_block: u64,
    ) -> impl Future<Output = Result<Vec<TransferRecord>, ExplorerError>> + Send;

    /// Most records one `transfers` call can return. A listing of exactly
    /// this many rows may end partway through its last block.
    fn listing_limit(&self) -> usize {
        MAX_RECORDS
    }

    /// Current head block number.
    fn head_block(&self) -> impl Future<Output = Result<u64, ExplorerError>> + Send;
}
