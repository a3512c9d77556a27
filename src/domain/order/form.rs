//! Buy form shown when a buyer opens a listing.

use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::contracts::IMarketplace;
use crate::domain::product::Product;
use crate::domain::{non_empty, FormError};
use crate::network::TOKEN_DECIMALS;
use crate::shared::{format_units, parse_amount, to_base_units, ProductId};

/// Raw input of the buy form: units wanted and the offered unit price.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderForm {
    pub amount: String,
    pub price: String,
}

/// A validated order, ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub product_id: ProductId,
    pub amount: u64,
    pub price: Decimal,
}

impl OrderForm {
    /// Empty amount, price prefilled with the listing's unit price.
    pub fn for_product(product: &Product) -> Self {
        let price = to_base_units(product.price, TOKEN_DECIMALS)
            .map(|units| format_units(units, TOKEN_DECIMALS))
            .unwrap_or_else(|_| product.price.to_string());
        Self {
            amount: String::new(),
            price,
        }
    }

    pub fn validate(&self, product: &Product) -> Result<OrderRequest, FormError> {
        let (Some(amount), Some(price)) = (non_empty(&self.amount), non_empty(&self.price)) else {
            return Err(FormError::new("All fields are required."));
        };

        let amount = parse_amount(amount).map_err(|_| FormError::new("Amount and price must be > 0."))?;
        let price = parse_amount(price).map_err(|_| FormError::new("Amount and price must be > 0."))?;
        if amount <= Decimal::ZERO || price <= Decimal::ZERO {
            return Err(FormError::new("Amount and price must be > 0."));
        }
        if amount > Decimal::from(product.quantity) {
            return Err(FormError::new("Amount exceeds available product quantity."));
        }
        if !amount.fract().is_zero() {
            return Err(FormError::new("Amount must be a whole number of units."));
        }
        let amount = amount
            .to_u64()
            .ok_or_else(|| FormError::new("Amount exceeds available product quantity."))?;
        to_base_units(price, TOKEN_DECIMALS).map_err(|e| FormError::new(e.to_string()))?;

        Ok(OrderRequest {
            product_id: product.id,
            amount,
            price,
        })
    }

    /// Whether the buy button should be enabled.
    pub fn is_valid(&self, product: &Product) -> bool {
        self.validate(product).is_ok()
    }
}

impl OrderRequest {
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.amount)
    }

    pub(crate) fn to_call(&self) -> Result<IMarketplace::createOrderCall, FormError> {
        Ok(IMarketplace::createOrderCall {
            productId: self.product_id.as_u256(),
            amount: U256::from(self.amount),
            price: to_base_units(self.price, TOKEN_DECIMALS)
                .map_err(|e| FormError::new(e.to_string()))?,
        })
    }
}
