//! Products sub-client: listings reads and farmer writes.

use alloy_primitives::Address;

use crate::client::AgrimarketClient;
use crate::contracts::IMarketplace;
use crate::domain::convert_valid;
use crate::domain::product::{NewProduct, Product, ProductUpdate};
use crate::error::SdkError;
use crate::invalidate::Invalidation;
use crate::session::PendingTransaction;
use crate::shared::ProductId;

/// Sub-client for marketplace listings.
pub struct Products<'a> {
    pub(crate) client: &'a AgrimarketClient,
}

impl<'a> Products<'a> {
    /// Every active listing. Works without a wallet.
    ///
    /// Zeroed slots (id 0) and inactive entries in the returned array are
    /// skipped.
    pub async fn active(&self) -> Result<Vec<Product>, SdkError> {
        let marketplace = self.client.gateway.marketplace(self.client.reader());
        let mut wire = marketplace
            .call(IMarketplace::getActiveProductsCall {})
            .await?;
        let total = wire.len();
        wire.retain(|p| p.isActive && !p.id.is_zero());
        if wire.len() != total {
            tracing::debug!(skipped = total - wire.len(), "skipping placeholder listings");
        }
        Ok(convert_valid("product", wire))
    }

    /// Active listings published by `farmer`.
    pub async fn owned_by(&self, farmer: Address) -> Result<Vec<Product>, SdkError> {
        let mut products = self.active().await?;
        products.retain(|p| p.is_owned_by(farmer));
        Ok(products)
    }

    /// Publish a new listing from the connected account.
    pub async fn create(&self, product: &NewProduct) -> Result<PendingTransaction, SdkError> {
        let executor = self.client.writer()?;
        let call = product.to_call()?;
        tracing::info!(name = %product.name, quantity = product.quantity, "creating product");
        let pending = self.client.gateway.marketplace(executor).send(call).await?;
        Ok(pending.invalidates(self.client.invalidation_bus(), Invalidation::ProductsChanged))
    }

    /// Edit name, description, price and quantity of a listing.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<PendingTransaction, SdkError> {
        let executor = self.client.writer()?;
        let call = update.to_call(id)?;
        let pending = self.client.gateway.marketplace(executor).send(call).await?;
        Ok(pending.invalidates(self.client.invalidation_bus(), Invalidation::ProductsChanged))
    }

    /// Withdraw a listing from the marketplace.
    pub async fn deactivate(&self, id: ProductId) -> Result<PendingTransaction, SdkError> {
        let executor = self.client.writer()?;
        let pending = self
            .client
            .gateway
            .marketplace(executor)
            .send(IMarketplace::deactivateProductCall {
                productId: id.as_u256(),
            })
            .await?;
        Ok(pending.invalidates(self.client.invalidation_bus(), Invalidation::ProductsChanged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::testing::{client_with, sent_calldata, wire_product, FakeChain, BUYER, FARMER};
    use crate::error::TxError;
    use crate::transport::memory::MemoryWallet;
    use alloy_primitives::U256;
    use alloy_sol_types::SolCall;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_active_reads_without_wallet_session() {
        let wallet = MemoryWallet::new(vec![BUYER]);
        FakeChain::new()
            .with_products(vec![wire_product(1, 10), wire_product(2, 5)])
            .install(&wallet);
        let client = client_with(&wallet);

        let products = client.products().active().await.unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[1].id, ProductId::from(2u64));
        assert!(!client.session().is_connected());
    }

    #[tokio::test]
    async fn test_active_skips_placeholder_slots() {
        let wallet = MemoryWallet::new(vec![BUYER]);
        let mut retired = wire_product(3, 5);
        retired.isActive = false;
        FakeChain::new()
            .with_products(vec![wire_product(1, 10), wire_product(0, 0), retired])
            .install(&wallet);
        let client = client_with(&wallet);

        let products = client.products().active().await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, ProductId::from(1u64));
    }

    #[tokio::test]
    async fn test_active_keeps_listings_next_to_an_oversized_one() {
        let wallet = MemoryWallet::new(vec![BUYER]);
        let mut oversized = wire_product(2, 0);
        oversized.quantity = U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64));
        FakeChain::new()
            .with_products(vec![wire_product(1, 10), oversized])
            .install(&wallet);
        let client = client_with(&wallet);

        let products = client.products().active().await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, ProductId::from(1u64));
    }

    #[tokio::test]
    async fn test_owned_by_filters_on_farmer() {
        let wallet = MemoryWallet::new(vec![BUYER]);
        let mut other = wire_product(2, 5);
        other.farmer = BUYER;
        FakeChain::new()
            .with_products(vec![wire_product(1, 10), other])
            .install(&wallet);
        let client = client_with(&wallet);

        let mine = client.products().owned_by(FARMER).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, ProductId::from(1u64));
    }

    #[tokio::test]
    async fn test_deactivate_while_disconnected_sends_nothing() {
        let wallet = MemoryWallet::new(vec![FARMER]);
        let client = client_with(&wallet);

        let err = client
            .products()
            .deactivate(ProductId::from(1u64))
            .await
            .unwrap_err();

        assert!(matches!(err, SdkError::Tx(TxError::WalletRequired)));
        assert!(wallet.requests().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_deactivate_publishes_products_changed() {
        let wallet = MemoryWallet::new(vec![FARMER]);
        let client = client_with(&wallet);
        client.session().connect().await.unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        client.invalidation_bus().subscribe(move |reason| {
            if *reason == Invalidation::ProductsChanged {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let pending = client
            .products()
            .deactivate(ProductId::from(4u64))
            .await
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        pending.confirm().await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let data = sent_calldata(&wallet).pop().unwrap();
        let call = IMarketplace::deactivateProductCall::abi_decode(&data).unwrap();
        assert_eq!(call.productId, ProductId::from(4u64).as_u256());
    }
}
