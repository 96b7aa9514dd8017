//! ERC20 token contract bindings.

use alloy_sol_types::sol;

sol! {
    /// Read-only ERC20 surface used for balance summaries
    #[sol(rpc)]
    interface IERC20 {
        /// Emitted when tokens are transferred
        event Transfer(
            address indexed from,
            address indexed to,
            uint256 value
        );

        /// Get token balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Get token symbol
        function symbol() external view returns (string memory);

        /// Get token decimals
        function decimals() external view returns (uint8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::{SolCall, SolEvent};

    #[test]
    fn test_balance_of_selector() {
        assert_eq!(IERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_transfer_topic() {
        assert_eq!(
            format!("{:#x}", IERC20::Transfer::SIGNATURE_HASH),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }
}
