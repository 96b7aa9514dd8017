//! Balance lookups for watched wallets.
//!
//! This crate provides:
//! - The [`Monitor`] seam balance backends implement
//! - An RPC-backed monitor using the ERC20 binding
//! - The summary block appended to transfer alerts

pub mod monitor;
pub mod summary;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::future::Future;

pub use summary::{BalanceReporter, NoBalances, Report};

/// A wallet's holding of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub holder: Address,
    /// Token contract, zero address for the native currency
    pub asset: Address,
    /// Amount in the asset's smallest unit
    pub amount: U256,
}

impl Balance {
    pub fn is_native(&self) -> bool {
        self.asset == Address::ZERO
    }
}

/// What to look up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceQuery {
    /// `balanceOf(holder)` on a token contract
    ERC20Balance { token: Address, holder: Address },
    /// Native currency balance of an account
    NativeBalance { address: Address },
}

impl BalanceQuery {
    pub const fn native(address: Address) -> Self {
        Self::NativeBalance { address }
    }

    pub const fn token(token: Address, holder: Address) -> Self {
        Self::ERC20Balance { token, holder }
    }

    /// The wallet whose balance is requested.
    pub const fn holder(&self) -> Address {
        match self {
            Self::ERC20Balance { holder, .. } => *holder,
            Self::NativeBalance { address } => *address,
        }
    }
}

/// A balance backend.
pub trait Monitor: Send + Sync {
    fn query_balance(
        &self,
        query: BalanceQuery,
    ) -> impl Future<Output = eyre::Result<Balance>> + Send;
}
