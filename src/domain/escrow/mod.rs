//! Escrow domain: funds locked per order, released or refunded on-chain.

pub mod client;
mod convert;
pub mod form;
pub mod state;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::OrderId;

pub use client::EscrowClient;
pub use form::{parse_order_id, EscrowForm, EscrowRequest};
pub use state::{EscrowLookupView, EscrowView};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EscrowStatus {
    /// Funds locked, awaiting release or refund.
    Held,
    Released,
    Refunded,
}

impl EscrowStatus {
    pub fn from_flags(is_released: bool, is_refunded: bool) -> Self {
        if is_released {
            EscrowStatus::Released
        } else if is_refunded {
            EscrowStatus::Refunded
        } else {
            EscrowStatus::Held
        }
    }
}

/// Escrow of one order, with its dispute flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Escrow {
    pub order_id: OrderId,
    pub buyer: Address,
    pub seller: Address,
    pub amount: Decimal,
    pub status: EscrowStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub disputed: bool,
}

impl Escrow {
    pub fn is_held(&self) -> bool {
        self.status == EscrowStatus::Held
    }

    /// `"Disputed"` or `"No Dispute"`.
    pub fn dispute_label(&self) -> &'static str {
        if self.disputed {
            "Disputed"
        } else {
            "No Dispute"
        }
    }

    pub fn involves(&self, account: Address) -> bool {
        self.buyer == account || self.seller == account
    }
}
