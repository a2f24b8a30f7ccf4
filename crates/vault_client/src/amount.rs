//! Exact decimal parsing for user-entered amounts. Base units are integers
//! end to end; a float round-trip could misstate a monetary amount right
//! before the user signs it.

use crate::error::ClientError;

/// Decimals of the native currency (lamports per SOL), fixed by the chain.
pub const NATIVE_DECIMALS: u8 = 9;

/// Parses a user-entered decimal string into base units at the given scale.
/// Zero, negative, empty, over-precise and malformed inputs are rejected,
/// never clamped.
pub fn parse_ui_amount(input: &str, decimals: u8) -> Result<u64, ClientError> {
    if decimals > 19 {
        return Err(ClientError::InvalidInput(format!(
            "unsupported decimal scale {decimals}"
        )));
    }
    let s = input.trim();
    if s.is_empty() {
        return Err(ClientError::InvalidInput("amount is empty".into()));
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ClientError::InvalidInput(format!("`{s}` is not a number")));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ClientError::InvalidInput(format!("`{s}` is not a number")));
    }
    if frac_part.len() > decimals as usize {
        return Err(ClientError::InvalidInput(format!(
            "`{s}` has more than {decimals} decimal places"
        )));
    }

    let scale = 10u128.pow(decimals as u32);
    let int_units = int_part
        .parse::<u128>()
        .unwrap_or(0)
        .checked_mul(scale)
        .ok_or_else(|| ClientError::InvalidInput(format!("`{s}` is too large")))?;

    let frac_units = if frac_part.is_empty() {
        0
    } else {
        let padded = frac_part.parse::<u128>().unwrap_or(0);
        padded * 10u128.pow((decimals as usize - frac_part.len()) as u32)
    };

    let total = int_units
        .checked_add(frac_units)
        .ok_or_else(|| ClientError::InvalidInput(format!("`{s}` is too large")))?;
    if total == 0 {
        return Err(ClientError::InvalidInput("amount must be positive".into()));
    }
    u64::try_from(total).map_err(|_| ClientError::InvalidInput(format!("`{s}` is too large")))
}

/// Native-currency amounts ("1.5" SOL) to lamports.
pub fn parse_sol_amount(input: &str) -> Result<u64, ClientError> {
    parse_ui_amount(input, NATIVE_DECIMALS)
}
