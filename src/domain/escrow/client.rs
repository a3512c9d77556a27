//! Escrow sub-client: lookups, lifecycle writes and disputes.

use crate::client::AgrimarketClient;
use crate::contracts::IEscrow;
use crate::domain::escrow::{Escrow, EscrowRequest};
use crate::error::SdkError;
use crate::gateway::ContractHandle;
use crate::invalidate::Invalidation;
use crate::session::PendingTransaction;
use crate::shared::OrderId;

/// Sub-client for the escrow contract.
pub struct EscrowClient<'a> {
    pub(crate) client: &'a AgrimarketClient,
}

impl<'a> EscrowClient<'a> {
    fn reader(&self) -> ContractHandle<crate::contracts::Escrow> {
        self.client.gateway.escrow(self.client.reader())
    }

    fn writer(&self) -> Result<ContractHandle<crate::contracts::Escrow>, SdkError> {
        Ok(self.client.gateway.escrow(self.client.writer()?))
    }

    fn changed(&self, pending: PendingTransaction, order_id: Option<OrderId>) -> PendingTransaction {
        pending.invalidates(
            self.client.invalidation_bus(),
            Invalidation::EscrowChanged { order_id },
        )
    }

    // ── Reads ────────────────────────────────────────────────────────────

    /// Escrow of an order together with its dispute flag.
    pub async fn details(&self, order_id: OrderId) -> Result<Escrow, SdkError> {
        let escrow = self.reader();
        let details = escrow
            .call(IEscrow::getEscrowDetailsCall {
                orderId: order_id.as_u256(),
            })
            .await?;
        let disputed = escrow
            .call(IEscrow::isDisputedCall {
                orderId: order_id.as_u256(),
            })
            .await?;
        Ok(Escrow::try_from((details, disputed))?)
    }

    pub async fn is_disputed(&self, order_id: OrderId) -> Result<bool, SdkError> {
        self.reader()
            .call(IEscrow::isDisputedCall {
                orderId: order_id.as_u256(),
            })
            .await
    }

    /// Whether the escrow of an order can be refunded right now.
    pub async fn can_refund(&self, order_id: OrderId) -> Result<bool, SdkError> {
        self.reader()
            .call(IEscrow::canRefundCall {
                orderId: order_id.as_u256(),
            })
            .await
    }

    // ── Writes ───────────────────────────────────────────────────────────

    pub async fn create(&self, request: &EscrowRequest) -> Result<PendingTransaction, SdkError> {
        let escrow = self.writer()?;
        let call = request.to_call()?;
        tracing::info!(seller = %request.seller, buyer = %request.buyer, amount = %request.amount, "creating escrow");
        let pending = escrow.send(call).await?;
        Ok(self.changed(pending, None))
    }

    /// Release the escrowed funds to the seller.
    pub async fn complete(&self, order_id: OrderId) -> Result<PendingTransaction, SdkError> {
        let pending = self
            .writer()?
            .send(IEscrow::completeEscrowCall {
                orderId: order_id.as_u256(),
            })
            .await?;
        Ok(self.changed(pending, Some(order_id)))
    }

    /// Return the escrowed funds to the buyer.
    pub async fn refund(&self, order_id: OrderId) -> Result<PendingTransaction, SdkError> {
        let pending = self
            .writer()?
            .send(IEscrow::refundEscrowCall {
                orderId: order_id.as_u256(),
            })
            .await?;
        Ok(self.changed(pending, Some(order_id)))
    }

    pub async fn raise_dispute(&self, order_id: OrderId) -> Result<PendingTransaction, SdkError> {
        let pending = self
            .writer()?
            .send(IEscrow::raiseDisputeCall {
                orderId: order_id.as_u256(),
            })
            .await?;
        Ok(self.changed(pending, Some(order_id)))
    }

    /// Settle a dispute: `release_to_seller` pays the seller, otherwise the
    /// buyer is refunded.
    pub async fn resolve_dispute(
        &self,
        order_id: OrderId,
        release_to_seller: bool,
    ) -> Result<PendingTransaction, SdkError> {
        let pending = self
            .writer()?
            .send(IEscrow::resolveDisputeCall {
                orderId: order_id.as_u256(),
                releaseToSeller: release_to_seller,
            })
            .await?;
        Ok(self.changed(pending, Some(order_id)))
    }
}
