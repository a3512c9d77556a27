//! Shared newtypes and utilities used across all domain modules.
//!
//! The id newtypes are serialization-transparent: they serialize as the same
//! decimal string the contracts' `uint256` ids render to, so they can be used
//! directly in view state and logs.

pub mod units;

pub use units::{
    format_fixed, format_units, from_base_units, parse_amount, to_base_units, UnitsError,
};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

macro_rules! uint_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(U256);

        impl $name {
            pub fn new(value: U256) -> Self {
                Self(value)
            }

            pub fn as_u256(&self) -> U256 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<U256> for $name {
            fn from(value: U256) -> Self {
                Self(value)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(U256::from(value))
            }
        }

        impl From<$name> for U256 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(format!("{} is required", stringify!($name)));
                }
                U256::from_str_radix(trimmed, 10)
                    .map(Self)
                    .map_err(|e| format!("invalid {} '{}': {}", stringify!($name), trimmed, e))
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.0.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

uint_id!(
    /// Marketplace product id.
    ProductId
);

uint_id!(
    /// Marketplace order id. Escrows are keyed by the order they guard.
    OrderId
);

/// Abbreviate an address for display: `0x7dd9...706D`.
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
