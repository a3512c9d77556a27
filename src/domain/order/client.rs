//! Orders sub-client: place, list, complete and cancel orders.

use alloy_primitives::Address;

use crate::client::AgrimarketClient;
use crate::contracts::IMarketplace;
use crate::domain::convert_valid;
use crate::domain::order::{Order, OrderRequest};
use crate::error::{SdkError, TxError};
use crate::invalidate::Invalidation;
use crate::session::PendingTransaction;
use crate::shared::{OrderId, ProductId};

/// Sub-client for marketplace orders.
pub struct Orders<'a> {
    pub(crate) client: &'a AgrimarketClient,
}

impl<'a> Orders<'a> {
    /// Place an order for a listing from the connected account.
    pub async fn place(&self, request: &OrderRequest) -> Result<PendingTransaction, SdkError> {
        let executor = self.client.writer()?;
        let call = request.to_call()?;
        tracing::info!(
            product = %request.product_id,
            amount = request.amount,
            "placing order"
        );
        let pending = self.client.gateway.marketplace(executor).send(call).await?;
        Ok(pending.invalidates(self.client.invalidation_bus(), Invalidation::OrdersChanged))
    }

    /// Every order placed against a listing.
    pub async fn for_product(&self, product_id: ProductId) -> Result<Vec<Order>, SdkError> {
        let wire = self
            .client
            .gateway
            .marketplace(self.client.reader())
            .call(IMarketplace::getOrdersForProductCall {
                productId: product_id.as_u256(),
            })
            .await?;
        Ok(convert_valid("order", wire))
    }

    /// Orders placed by `buyer`.
    ///
    /// The marketplace has no per-buyer index: this walks the active
    /// listings and filters their orders. Orders on deactivated listings are
    /// not found.
    pub async fn for_buyer(&self, buyer: Address) -> Result<Vec<Order>, SdkError> {
        let products = self.client.products().active().await?;
        let mut orders = Vec::new();
        for product in &products {
            let placed = self.for_product(product.id).await?;
            orders.extend(placed.into_iter().filter(|o| o.is_placed_by(buyer)));
        }
        tracing::debug!(
            buyer = %buyer,
            products = products.len(),
            orders = orders.len(),
            "scanned orders"
        );
        Ok(orders)
    }

    /// Orders of the connected account.
    pub async fn mine(&self) -> Result<Vec<Order>, SdkError> {
        let account = self.client.session.account().ok_or(TxError::WalletRequired)?;
        self.for_buyer(account).await
    }

    pub async fn complete(&self, order_id: OrderId) -> Result<PendingTransaction, SdkError> {
        let executor = self.client.writer()?;
        let pending = self
            .client
            .gateway
            .marketplace(executor)
            .send(IMarketplace::completeOrderCall {
                orderId: order_id.as_u256(),
            })
            .await?;
        Ok(pending.invalidates(self.client.invalidation_bus(), Invalidation::OrdersChanged))
    }

    pub async fn cancel(&self, order_id: OrderId) -> Result<PendingTransaction, SdkError> {
        let executor = self.client.writer()?;
        let pending = self
            .client
            .gateway
            .marketplace(executor)
            .send(IMarketplace::cancelOrderCall {
                orderId: order_id.as_u256(),
            })
            .await?;
        Ok(pending.invalidates(self.client.invalidation_bus(), Invalidation::OrdersChanged))
    }
}
