//! Mint form.

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::domain::FormError;
use crate::network::TOKEN_DECIMALS;
use crate::shared::{parse_amount, to_base_units};

/// Raw input of the mint form, in whole tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MintForm {
    pub amount: String,
}

impl MintForm {
    /// Validated amount in base units.
    pub fn validate(&self) -> Result<U256, FormError> {
        let invalid = || FormError::new("Please enter a valid amount to mint");
        let amount = parse_amount(&self.amount)
            .ok()
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(invalid)?;
        to_base_units(amount, TOKEN_DECIMALS).map_err(|_| invalid())
    }
}
