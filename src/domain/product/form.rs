//! Listing forms: create a product, edit a product.

use alloy_primitives::U256;
use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use super::Product;
use crate::contracts::IMarketplace;
use crate::domain::{non_empty, FormError};
use crate::network::TOKEN_DECIMALS;
use crate::shared::{format_units, parse_amount, to_base_units, ProductId};

const HARVEST_DATE_FORMAT: &str = "%Y-%m-%d";

fn price_field(input: &str) -> Result<Decimal, FormError> {
    parse_amount(input).map_err(|_| FormError::new("Please enter a valid price per unit"))
}

fn price_units(price: Decimal) -> Result<U256, FormError> {
    to_base_units(price, TOKEN_DECIMALS).map_err(|e| FormError::new(e.to_string()))
}

// ─── New product ─────────────────────────────────────────────────────────────

/// Raw input of the "add product" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProductForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub unit: String,
    pub price_per_unit: String,
    pub initial_quantity: String,
    pub image_hash: String,
    pub location: String,
    /// `YYYY-MM-DD`.
    pub harvest_date: String,
    pub is_organic: bool,
}

impl Default for NewProductForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: super::CATEGORIES[0].to_string(),
            unit: super::UNITS[0].to_string(),
            price_per_unit: String::new(),
            initial_quantity: String::new(),
            image_hash: String::new(),
            location: String::new(),
            harvest_date: String::new(),
            is_organic: false,
        }
    }
}

/// A validated listing, ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub unit: String,
    pub price: Decimal,
    pub quantity: u64,
    pub image_hash: String,
    pub location: String,
    pub harvest_date: NaiveDate,
    pub is_organic: bool,
}

impl NewProductForm {
    pub fn validate(&self) -> Result<NewProduct, FormError> {
        self.validate_on(Utc::now().date_naive())
    }

    /// Validate with `today` as the earliest acceptable harvest date.
    pub fn validate_on(&self, today: NaiveDate) -> Result<NewProduct, FormError> {
        let required = [
            ("name", &self.name),
            ("description", &self.description),
            ("price per unit", &self.price_per_unit),
            ("initial quantity", &self.initial_quantity),
            ("location", &self.location),
            ("harvest date", &self.harvest_date),
        ];
        for (label, value) in required {
            if non_empty(value).is_none() {
                return Err(FormError::new(format!("Please fill in the {}", label)));
            }
        }

        let price = price_field(&self.price_per_unit)?;
        let quantity: u64 = self
            .initial_quantity
            .trim()
            .parse()
            .map_err(|_| FormError::new("Please enter a valid initial quantity"))?;
        if price <= Decimal::ZERO || quantity == 0 {
            return Err(FormError::new("Price and quantity must be greater than zero"));
        }
        price_units(price)?;

        let harvest_date = NaiveDate::parse_from_str(self.harvest_date.trim(), HARVEST_DATE_FORMAT)
            .ok()
            .filter(|date| *date >= today)
            .ok_or_else(|| {
                FormError::new("Harvest date must be a valid date and not in the past.")
            })?;

        Ok(NewProduct {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.clone(),
            unit: self.unit.clone(),
            price,
            quantity,
            image_hash: self.image_hash.trim().to_string(),
            location: self.location.trim().to_string(),
            harvest_date,
            is_organic: self.is_organic,
        })
    }
}

impl NewProduct {
    /// Harvest date as unix seconds at midnight UTC.
    pub fn harvest_timestamp(&self) -> i64 {
        self.harvest_date.and_time(NaiveTime::MIN).and_utc().timestamp()
    }

    pub(crate) fn to_call(&self) -> Result<IMarketplace::createProductCall, FormError> {
        Ok(IMarketplace::createProductCall {
            name: self.name.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            unit: self.unit.clone(),
            pricePerUnit: price_units(self.price)?,
            quantity: U256::from(self.quantity),
            imageHash: self.image_hash.clone(),
            location: self.location.clone(),
            harvestDate: U256::from(self.harvest_timestamp().max(0) as u64),
            isOrganic: self.is_organic,
        })
    }
}

// ─── Product update ──────────────────────────────────────────────────────────

/// Raw input of the "edit product" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductUpdateForm {
    pub name: String,
    pub description: String,
    pub price_per_unit: String,
    pub available_quantity: String,
}

/// A validated product edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub quantity: u64,
}

impl ProductUpdateForm {
    /// Prefill from the current listing.
    pub fn from_product(product: &Product) -> Self {
        let price = to_base_units(product.price, TOKEN_DECIMALS)
            .map(|units| format_units(units, TOKEN_DECIMALS))
            .unwrap_or_else(|_| product.price.to_string());
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price_per_unit: price,
            available_quantity: product.quantity.to_string(),
        }
    }

    pub fn validate(&self) -> Result<ProductUpdate, FormError> {
        let all_present = [
            &self.name,
            &self.description,
            &self.price_per_unit,
            &self.available_quantity,
        ]
        .iter()
        .all(|field| non_empty(field).is_some());
        if !all_present {
            return Err(FormError::new("All fields are required for update."));
        }

        let price = price_field(&self.price_per_unit)?;
        price_units(price)?;
        let quantity: u64 = self
            .available_quantity
            .trim()
            .parse()
            .map_err(|_| FormError::new("Please enter a valid quantity"))?;

        Ok(ProductUpdate {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price,
            quantity,
        })
    }
}

impl ProductUpdate {
    pub(crate) fn to_call(&self, id: ProductId) -> Result<IMarketplace::updateProductCall, FormError> {
        Ok(IMarketplace::updateProductCall {
            productId: id.as_u256(),
            name: self.name.clone(),
            description: self.description.clone(),
            price: price_units(self.price)?,
            quantity: U256::from(self.quantity),
        })
    }
}
