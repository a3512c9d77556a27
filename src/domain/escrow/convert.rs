//! Conversion: `IEscrow::EscrowDetails` + dispute flag → `Escrow`.

use super::{Escrow, EscrowStatus};
use crate::contracts::IEscrow;
use crate::domain::{amount, timestamp, ValidationError};
use crate::shared::OrderId;

impl TryFrom<(IEscrow::EscrowDetails, bool)> for Escrow {
    type Error = ValidationError;

    fn try_from((details, disputed): (IEscrow::EscrowDetails, bool)) -> Result<Self, Self::Error> {
        Ok(Escrow {
            order_id: OrderId::new(details.orderId),
            buyer: details.buyer,
            seller: details.seller,
            amount: amount("amount", details.amount)?,
            status: EscrowStatus::from_flags(details.isReleased, details.isRefunded),
            created_at: timestamp("createdAt", details.createdAt)?,
            disputed,
        })
    }
}
