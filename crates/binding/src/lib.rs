//! Contract bindings for external contracts.
//!
//! Only the ERC20 surface is needed: token balances for alert summaries and
//! the `Transfer` event signature. Bindings are generated with alloy's
//! `sol!` macro.

pub mod token;
