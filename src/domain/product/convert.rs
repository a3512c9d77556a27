//! Conversion: `IMarketplace::Product` → `Product`.

use super::Product;
use crate::contracts::IMarketplace;
use crate::domain::{amount, quantity, timestamp, ValidationError};
use crate::shared::ProductId;

impl TryFrom<IMarketplace::Product> for Product {
    type Error = ValidationError;

    fn try_from(source: IMarketplace::Product) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId::new(source.id),
            farmer: source.farmer,
            name: source.name,
            description: source.description,
            category: source.category,
            unit: source.unit,
            price: amount("price", source.price)?,
            quantity: quantity("quantity", source.quantity)?,
            image_hash: source.imageHash,
            location: source.location,
            harvest_date: timestamp("harvestDate", source.harvestDate)?,
            is_organic: source.isOrganic,
            is_active: source.isActive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{wire_product, FARMER};
    use alloy_primitives::U256;
    use rust_decimal::Decimal;

    #[test]
    fn test_product_conversion() {
        let product = Product::try_from(wire_product(3, 75)).unwrap();
        assert_eq!(product.id, ProductId::from(3u64));
        assert_eq!(product.price, Decimal::new(12, 2));
        assert_eq!(product.quantity, 75);
        assert_eq!(product.harvest_date.unwrap().timestamp(), 1_767_225_600);
        assert!(product.is_owned_by(FARMER));
        assert_eq!(product.cost_of(10), Decimal::new(12, 1));
    }

    #[test]
    fn test_product_conversion_rejects_huge_quantity() {
        let mut wire = wire_product(1, 0);
        wire.quantity = U256::MAX;
        assert!(matches!(
            Product::try_from(wire),
            Err(ValidationError::Quantity { field: "quantity", .. })
        ));
    }
}
