//! Order domain: purchases placed against a listing.

pub mod client;
mod convert;
pub mod form;
pub mod state;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::{OrderId, ProductId};

pub use client::Orders;
pub use form::{OrderForm, OrderRequest};
pub use state::BuyerOrdersView;

// ─── OrderStatus ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// A completed order wins over a cancelled flag; the contract never sets both.
    pub fn from_flags(is_completed: bool, is_cancelled: bool) -> Self {
        if is_completed {
            OrderStatus::Completed
        } else if is_cancelled {
            OrderStatus::Cancelled
        } else {
            OrderStatus::Open
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "Pending",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Order ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub product_id: ProductId,
    pub farmer: Address,
    pub buyer: Address,
    /// Units ordered.
    pub amount: u64,
    /// Price per unit, in tokens.
    pub price: Decimal,
    pub escrow_id: U256,
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.amount)
    }

    /// Only open orders can be completed or cancelled.
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    pub fn is_placed_by(&self, buyer: Address) -> bool {
        self.buyer == buyer
    }
}
