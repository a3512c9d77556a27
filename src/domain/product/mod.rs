//! Product domain: marketplace listings.

pub mod client;
mod convert;
pub mod form;
pub mod state;

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::shared::ProductId;

pub use client::Products;
pub use form::{NewProduct, NewProductForm, ProductUpdate, ProductUpdateForm};
pub use state::{MarketplaceLoading, MarketplaceView, ProductCreateView};

/// Categories offered by the listing form.
pub const CATEGORIES: [&str; 6] = ["Vegetables", "Fruits", "Grains", "Dairy", "Meat", "Other"];

/// Units offered by the listing form.
pub const UNITS: [&str; 5] = ["kg", "lb", "unit", "dozen", "bushel"];

// ─── Product ─────────────────────────────────────────────────────────────────

/// A marketplace listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub farmer: Address,
    pub name: String,
    pub description: String,
    pub category: String,
    pub unit: String,
    /// Price per unit, in tokens.
    pub price: Decimal,
    /// Units still available.
    pub quantity: u64,
    pub image_hash: String,
    pub location: String,
    pub harvest_date: Option<DateTime<Utc>>,
    pub is_organic: bool,
    pub is_active: bool,
}

impl Product {
    /// Whether `account` listed this product. Address equality is byte-wise,
    /// so checksummed and lowercase renderings compare equal.
    pub fn is_owned_by(&self, account: Address) -> bool {
        self.farmer == account
    }

    /// Cost of `amount` units at the listed price.
    pub fn cost_of(&self, amount: u64) -> Decimal {
        self.price * Decimal::from(amount)
    }

    pub fn is_available(&self) -> bool {
        self.is_active && self.quantity > 0
    }
}
