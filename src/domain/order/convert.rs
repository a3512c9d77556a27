//! Conversion: `IMarketplace::Order` → `Order`.

use super::{Order, OrderStatus};
use crate::contracts::IMarketplace;
use crate::domain::{amount, quantity, timestamp, ValidationError};
use crate::shared::{OrderId, ProductId};

impl TryFrom<IMarketplace::Order> for Order {
    type Error = ValidationError;

    fn try_from(source: IMarketplace::Order) -> Result<Self, Self::Error> {
        Ok(Order {
            id: OrderId::new(source.id),
            product_id: ProductId::new(source.productId),
            farmer: source.farmer,
            buyer: source.buyer,
            amount: quantity("amount", source.amount)?,
            price: amount("price", source.price)?,
            escrow_id: source.escrowId,
            status: OrderStatus::from_flags(source.isCompleted, source.isCancelled),
            created_at: timestamp("createdAt", source.createdAt)?,
            expires_at: timestamp("expiryTime", source.expiryTime)?,
        })
    }
}
