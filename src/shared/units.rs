//! Pure conversion between human-readable amounts and on-chain base units.
//!
//! Every amount the contracts expose is an unsigned integer scaled by
//! `10^decimals` (18 for all Agrimarket contracts). Conversions are exact:
//! `rust_decimal::Decimal` on the human side, `U256` on the chain side.
//! No async, no network calls.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::Decimal;

/// Errors that can occur while converting amounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    Negative(String),
    TooPrecise { value: String, decimals: u32 },
    Overflow { context: String },
    InvalidDecimal { input: String, reason: String },
}

impl fmt::Display for UnitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitsError::Negative(v) => write!(f, "Amount must not be negative, got {}", v),
            UnitsError::TooPrecise { value, decimals } => {
                write!(f, "Amount {} has more than {} decimal places", value, decimals)
            }
            UnitsError::Overflow { context } => write!(f, "Overflow: {}", context),
            UnitsError::InvalidDecimal { input, reason } => {
                write!(f, "Invalid amount '{}': {}", input, reason)
            }
        }
    }
}

impl std::error::Error for UnitsError {}

/// Parse a user-typed amount (e.g. `"0.05"`).
pub fn parse_amount(input: &str) -> Result<Decimal, UnitsError> {
    let trimmed = input.trim();
    Decimal::from_str(trimmed).map_err(|e| UnitsError::InvalidDecimal {
        input: trimmed.to_string(),
        reason: e.to_string(),
    })
}

/// Convert a human amount into base units: `amount * 10^decimals`.
///
/// Fails on negative amounts and on amounts with more fractional digits
/// than `decimals` allows.
pub fn to_base_units(amount: Decimal, decimals: u32) -> Result<U256, UnitsError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitsError::Negative(amount.to_string()));
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    let mantissa = U256::from(normalized.mantissa().unsigned_abs());

    if scale > decimals {
        return Err(UnitsError::TooPrecise {
            value: amount.to_string(),
            decimals,
        });
    }

    let multiplier = U256::from(10u8).pow(U256::from(decimals - scale));
    mantissa
        .checked_mul(multiplier)
        .ok_or_else(|| UnitsError::Overflow {
            context: format!("{} * 10^{}", amount, decimals),
        })
}

/// Convert base units into a human amount: `value / 10^decimals`.
///
/// Fails when the value does not fit in a `Decimal` mantissa (96 bits).
pub fn from_base_units(value: U256, decimals: u32) -> Result<Decimal, UnitsError> {
    let raw: u128 = value.try_into().map_err(|_| UnitsError::Overflow {
        context: format!("{} does not fit in u128", value),
    })?;
    let signed = i128::try_from(raw).map_err(|_| UnitsError::Overflow {
        context: format!("{} does not fit in i128", raw),
    })?;
    Decimal::try_from_i128_with_scale(signed, decimals)
        .map(|d| d.normalize())
        .map_err(|e| UnitsError::Overflow {
            context: format!("{} at scale {}: {}", value, decimals, e),
        })
}

/// Exact string rendering of base units, for values of any size.
pub fn format_units(value: U256, decimals: u32) -> String {
    let digits = value.to_string();
    let width = decimals as usize;

    let (int_part, frac_part) = if digits.len() > width {
        let (i, f) = digits.split_at(digits.len() - width);
        (i.to_string(), f.to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = width))
    };

    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part
    } else {
        format!("{}.{}", int_part, frac_part)
    }
}

/// Round a human amount for display with a fixed number of places.
pub fn format_fixed(amount: Decimal, places: u32) -> String {
    format!("{:.*}", places as usize, amount.round_dp(places))
}
