//! Decimal-string / base-unit conversion.
//!
//! On-chain amounts are 18-decimal base-unit integers (`U256`); everything
//! the user types or reads is a decimal string. Conversion must be lossless
//! for any amount representable in 18 decimal places, and input validation
//! happens here so that a bad amount never reaches the provider.

use ethers::types::U256;
use ethers::utils::{format_units, parse_units, ParseUnits};

use crate::error::{Error, Result};

/// Decimal places of both tokens' base units.
pub const TOKEN_DECIMALS: u32 = 18;

/// Longest integer part (in digits) that still scales into a `U256`.
const MAX_INTEGER_DIGITS: usize = 59;

/// Parse a user-entered decimal string into base units.
///
/// Rejects empty, signed, non-numeric, over-precise, and oversized
/// input before any chain call.
pub fn to_base_units(input: &str) -> Result<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidAmount("amount is empty".into()));
    }
    if trimmed.starts_with('-') || trimmed.starts_with('+') {
        return Err(Error::InvalidAmount(format!(
            "amount must be an unsigned decimal, got {trimmed:?}"
        )));
    }
    // parse_units drops decimals past the exponent and scales the
    // integer part unchecked
    let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if frac_part.len() > TOKEN_DECIMALS as usize {
        return Err(Error::InvalidAmount(format!(
            "more than {TOKEN_DECIMALS} decimal places in {trimmed:?}"
        )));
    }
    if int_part.trim_start_matches('0').len() > MAX_INTEGER_DIGITS {
        return Err(Error::InvalidAmount(format!(
            "amount too large: {trimmed:?}"
        )));
    }
    match parse_units(trimmed, TOKEN_DECIMALS) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(Error::InvalidAmount(format!(
            "amount must be non-negative, got {trimmed:?}"
        ))),
        Err(e) => Err(Error::InvalidAmount(format!("{trimmed:?}: {e}"))),
    }
}

/// Render base units as a decimal string with trailing zeros trimmed.
pub fn from_base_units(amount: U256) -> String {
    let full = match format_units(amount, TOKEN_DECIMALS) {
        Ok(s) => s,
        Err(_) => amount.to_string(),
    };
    let trimmed = full.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Render base units rounded (half-up) to `places` fractional digits, for
/// balance and reserve display.
pub fn display_amount(amount: U256, places: u32) -> String {
    if places >= TOKEN_DECIMALS {
        return from_base_units(amount);
    }
    let drop = U256::exp10((TOKEN_DECIMALS - places) as usize);
    let rounded = match amount.checked_add(drop / 2) {
        Some(v) => v / drop,
        None => amount / drop,
    };
    if places == 0 {
        return rounded.to_string();
    }
    let split = U256::exp10(places as usize);
    let int = rounded / split;
    let frac = rounded % split;
    format!("{}.{:0>width$}", int, frac.to_string(), width = places as usize)
}

/// Lossy conversion for display-only derived quantities (the exchange rate).
pub fn to_f64(amount: U256) -> f64 {
    amount
        .to_string()
        .parse::<f64>()
        .map(|v| v / 1e18)
        .unwrap_or(f64::INFINITY)
}
