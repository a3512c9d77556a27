//! Utility token domain: balances and minting.

pub mod client;
pub mod form;
pub mod state;

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::network::TOKEN_DECIMALS;
use crate::shared::{format_fixed, format_units, from_base_units};

pub use client::Token;
pub use form::MintForm;
pub use state::TokenView;

/// Token balance of one account, kept in base units so any size is exact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenBalance {
    pub owner: Address,
    pub raw: U256,
}

impl TokenBalance {
    pub fn new(owner: Address, raw: U256) -> Self {
        Self { owner, raw }
    }

    /// Whole-token amount, when it fits a `Decimal`.
    pub fn amount(&self) -> Option<Decimal> {
        from_base_units(self.raw, TOKEN_DECIMALS).ok()
    }

    /// Rounded for display, e.g. `"12.50"`.
    pub fn to_fixed(&self, places: u32) -> String {
        match self.amount() {
            Some(amount) => format_fixed(amount, places),
            None => format_units(self.raw, TOKEN_DECIMALS),
        }
    }
}

impl std::fmt::Display for TokenBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_units(self.raw, TOKEN_DECIMALS))
    }
}
