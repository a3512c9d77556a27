//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Rich domain types converted from contract structs
//! - `convert.rs`: `TryFrom` conversions from the `sol!` structs
//! - `form.rs`: User-input forms with validation
//! - `state.rs`: App-owned view models with action/loading state
//! - `client.rs`: Sub-client issuing contract reads and writes

pub mod escrow;
pub mod order;
pub mod product;
pub mod token;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::SdkError;
use crate::network::TOKEN_DECIMALS;
use crate::shared::{from_base_units, UnitsError};

// ─── Conversion errors ───────────────────────────────────────────────────────

/// A contract value that does not fit the domain representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Amount {
        field: &'static str,
        source: UnitsError,
    },
    Quantity {
        field: &'static str,
        value: String,
    },
    Timestamp {
        field: &'static str,
        value: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Amount { field, source } => write!(f, "{}: {}", field, source),
            ValidationError::Quantity { field, value } => {
                write!(f, "{}: quantity {} does not fit in u64", field, value)
            }
            ValidationError::Timestamp { field, value } => {
                write!(f, "{}: {} is not a valid unix timestamp", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ValidationError::Amount { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ValidationError> for SdkError {
    fn from(err: ValidationError) -> Self {
        SdkError::Validation(err.to_string())
    }
}

/// Convert each wire struct on its own. Entries that do not fit are logged
/// and dropped so one bad listing cannot hide the rest.
pub(crate) fn convert_valid<W, T>(kind: &'static str, wire: Vec<W>) -> Vec<T>
where
    T: TryFrom<W, Error = ValidationError>,
{
    wire.into_iter()
        .filter_map(|entry| match T::try_from(entry) {
            Ok(converted) => Some(converted),
            Err(error) => {
                tracing::warn!(kind, %error, "skipping entry that does not convert");
                None
            }
        })
        .collect()
}

/// 18-decimal token amount.
pub(crate) fn amount(field: &'static str, value: U256) -> Result<Decimal, ValidationError> {
    from_base_units(value, TOKEN_DECIMALS).map_err(|source| ValidationError::Amount { field, source })
}

/// Whole-unit count.
pub(crate) fn quantity(field: &'static str, value: U256) -> Result<u64, ValidationError> {
    u64::try_from(value).map_err(|_| ValidationError::Quantity {
        field,
        value: value.to_string(),
    })
}

/// Unix seconds. Zero means "unset".
pub(crate) fn timestamp(
    field: &'static str,
    value: U256,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    if value.is_zero() {
        return Ok(None);
    }
    let invalid = || ValidationError::Timestamp {
        field,
        value: value.to_string(),
    };
    let secs = i64::try_from(value).map_err(|_| invalid())?;
    DateTime::from_timestamp(secs, 0).map(Some).ok_or_else(invalid)
}

// ─── Form errors ─────────────────────────────────────────────────────────────

/// A user-input problem, carrying the message shown next to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError(String);

impl FormError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FormError {}

impl From<FormError> for SdkError {
    fn from(err: FormError) -> Self {
        SdkError::Validation(err.0)
    }
}

/// Trimmed, non-empty text input.
pub(crate) fn non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
