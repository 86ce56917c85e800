use cosmwasm_std::{Decimal, Uint128};

use crate::error::ContractError;

/// Largest decimals count an incentive token can register with. Matches the
/// precision of [`Decimal`], so normalized amounts are exact.
pub const MAX_TOKEN_DECIMALS: u8 = 18;

/// Converts a raw integer token amount into its decimal-scaled value,
/// `raw / 10^decimals`.
pub fn normalize(raw: Uint128, decimals: u8) -> Result<Decimal, ContractError> {
    if decimals > MAX_TOKEN_DECIMALS {
        return Err(ContractError::InvalidDecimals { decimals });
    }

    Decimal::from_atomics(raw, u32::from(decimals))
        .map_err(|_| ContractError::AmountOutOfRange { amount: raw })
}

/// Inverse of [`normalize`]: scales a decimal value back to a raw integer
/// amount, truncating toward zero.
pub fn denormalize(value: Decimal, decimals: u8) -> Result<Uint128, ContractError> {
    if decimals > MAX_TOKEN_DECIMALS {
        return Err(ContractError::InvalidDecimals { decimals });
    }

    let scale = Uint128::from(10u128.pow(u32::from(decimals)));
    let one = Uint128::from(10u128.pow(Decimal::DECIMAL_PLACES));

    Ok(value.atomics().multiply_ratio(scale, one))
}
