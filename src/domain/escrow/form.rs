//! Escrow forms: opening an escrow and order-id inputs.

use alloy_primitives::Address;
use rust_decimal::Decimal;

use crate::contracts::IEscrow;
use crate::domain::{non_empty, FormError};
use crate::network::TOKEN_DECIMALS;
use crate::shared::{parse_amount, to_base_units, OrderId};

/// Parse an order-id input; `missing` is the message for an empty field.
pub fn parse_order_id(input: &str, missing: &str) -> Result<OrderId, FormError> {
    let Some(trimmed) = non_empty(input) else {
        return Err(FormError::new(missing));
    };
    trimmed
        .parse()
        .map_err(|_| FormError::new("Order ID must be a whole number."))
}

/// Raw input of the "create escrow" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscrowForm {
    pub seller: String,
    pub buyer: String,
    /// In tokens.
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowRequest {
    pub seller: Address,
    pub buyer: Address,
    pub amount: Decimal,
}

impl EscrowForm {
    pub fn validate(&self) -> Result<EscrowRequest, FormError> {
        let (Some(seller), Some(buyer), Some(amount)) = (
            non_empty(&self.seller),
            non_empty(&self.buyer),
            non_empty(&self.amount),
        ) else {
            return Err(FormError::new("Seller, buyer, and amount are required."));
        };

        let seller: Address = seller
            .parse()
            .map_err(|_| FormError::new("Seller must be a valid address."))?;
        let buyer: Address = buyer
            .parse()
            .map_err(|_| FormError::new("Buyer must be a valid address."))?;
        let amount = parse_amount(amount)
            .ok()
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(|| FormError::new("Amount must be greater than zero."))?;
        to_base_units(amount, TOKEN_DECIMALS).map_err(|e| FormError::new(e.to_string()))?;

        Ok(EscrowRequest {
            seller,
            buyer,
            amount,
        })
    }
}

impl EscrowRequest {
    pub(crate) fn to_call(&self) -> Result<IEscrow::createEscrowCall, FormError> {
        Ok(IEscrow::createEscrowCall {
            seller: self.seller,
            buyer: self.buyer,
            amount: to_base_units(self.amount, TOKEN_DECIMALS)
                .map_err(|e| FormError::new(e.to_string()))?,
        })
    }
}
