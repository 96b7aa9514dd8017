//! Transfer records as reported by the block explorer.

use alloy_primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimals of the native currency on every supported network.
pub const NATIVE_DECIMALS: u8 = 18;

/// Which explorer listing a record came from.
///
/// Native and token transfers are fetched separately and keep separate
/// cursor lanes for the same wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Native,
    Token,
}

impl TransferKind {
    pub const ALL: [Self; 2] = [Self::Native, Self::Token];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asset moved by a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Asset {
    /// The chain's native currency (ETH on Ethereum networks).
    Native,
    /// A fungible token contract.
    Token {
        symbol: String,
        decimals: u8,
        contract: Option<Address>,
    },
}

impl Asset {
    /// Symbol to display, given the network's native symbol.
    pub fn symbol<'a>(&'a self, native_symbol: &'a str) -> &'a str {
        match self {
            Self::Native => native_symbol,
            Self::Token { symbol, .. } => symbol,
        }
    }

    pub const fn decimals(&self) -> u8 {
        match self {
            Self::Native => NATIVE_DECIMALS,
            Self::Token { decimals, .. } => *decimals,
        }
    }
}

/// A single transfer touching a watched wallet.
///
/// `from`/`to` are `None` when the explorer left them empty or returned
/// something that is not an address (contract creations have no `to`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub kind: TransferKind,
    pub block_number: u64,
    /// Unix seconds of the including block
    pub timestamp: u64,
    pub tx_hash: TxHash,
    pub from: Option<Address>,
    pub to: Option<Address>,
    /// Raw integer amount in the asset's smallest unit, as a decimal string
    pub raw_amount: String,
    pub asset: Asset,
}

/// Lowercase `0x`-prefixed hex form of an address.
pub fn normalized(address: &Address) -> String {
    format!("{address:#x}")
}
