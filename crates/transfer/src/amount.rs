//! Fixed-precision rendering of raw token amounts.

use alloy_primitives::U256;
use thiserror::Error;

/// Fractional digits shown in alerts.
pub const DISPLAY_DECIMALS: u8 = 6;

/// Largest decimals value whose power of ten still fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("invalid raw amount: {0:?}")]
    InvalidAmount(String),

    #[error("decimals {0} out of range (max {MAX_DECIMALS})")]
    DecimalsOutOfRange(u8),
}

/// Render `raw / 10^decimals` with exactly six fractional digits.
///
/// Rounds half away from zero. Arithmetic is exact over `U256`, so large
/// 18-decimal balances keep every displayed digit.
pub fn format_amount(raw: &str, decimals: u8) -> Result<String, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::DecimalsOutOfRange(decimals));
    }

    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::InvalidAmount(raw.to_string()));
    }
    let value = U256::from_str_radix(raw, 10)
        .map_err(|_| AmountError::InvalidAmount(raw.to_string()))?;

    // `scaled` is the amount in millionths of a whole unit.
    let scaled = if decimals <= DISPLAY_DECIMALS {
        let factor = pow10(DISPLAY_DECIMALS - decimals);
        value
            .checked_mul(factor)
            .ok_or_else(|| AmountError::InvalidAmount(raw.to_string()))?
    } else {
        let divisor = pow10(decimals - DISPLAY_DECIMALS);
        let (quotient, remainder) = value.div_rem(divisor);
        if remainder >= divisor - remainder {
            quotient + U256::from(1u8)
        } else {
            quotient
        }
    };

    let unit = pow10(DISPLAY_DECIMALS);
    let (whole, fraction) = scaled.div_rem(unit);
    Ok(format!(
        "{whole}.{fraction:0>width$}",
        fraction = fraction.to_string(),
        width = DISPLAY_DECIMALS as usize
    ))
}

fn pow10(exp: u8) -> U256 {
    U256::from(10u8).pow(U256::from(exp))
}
