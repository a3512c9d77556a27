//! Buyer orders view: app-owned, SDK-provided update logic.

use std::collections::HashMap;

use alloy_primitives::TxHash;

use crate::action::{ActionError, ActionState, Submitted};
use crate::client::AgrimarketClient;
use crate::error::SdkError;
use crate::invalidate::Invalidation;
use crate::session::{PendingTransaction, TransactionReceipt};
use crate::shared::OrderId;

use super::Order;

/// Orders placed by the connected account, with per-order action state.
///
/// The app owns instances of this type and calls its async methods; results
/// that arrive after the session changed are dropped and the view is marked
/// stale instead.
#[derive(Debug, Default)]
pub struct BuyerOrdersView {
    orders: Vec<Order>,
    loading: bool,
    actions: HashMap<OrderId, ActionState>,
    in_flight: HashMap<TxHash, (OrderId, &'static str)>,
    error: Option<String>,
    stale: bool,
}

impl BuyerOrdersView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn action(&self, order_id: OrderId) -> Option<&ActionState> {
        self.actions.get(&order_id)
    }

    /// Whether the complete/cancel buttons of an order should be disabled.
    pub fn is_pending(&self, order_id: OrderId) -> bool {
        self.actions.get(&order_id).is_some_and(ActionState::is_busy)
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn apply_invalidation(&mut self, reason: &Invalidation) {
        if reason.affects_account() || reason.affects_products() {
            self.mark_stale();
        }
    }

    /// Reload the connected buyer's orders. Without a session the list is
    /// cleared and nothing is fetched.
    pub async fn refresh(&mut self, client: &AgrimarketClient) {
        let Some(account) = client.session().account() else {
            self.orders.clear();
            self.stale = false;
            return;
        };
        let generation = client.session().generation();
        self.loading = true;
        self.error = None;

        let result = client.orders().for_buyer(account).await;
        self.loading = false;

        if !client.session().is_current(generation) {
            self.mark_stale();
            return;
        }
        match result {
            Ok(orders) => {
                self.orders = orders;
                self.stale = false;
            }
            Err(e) => {
                self.error = Some(ActionError::from(e).describe("Failed to fetch orders"));
            }
        }
    }

    pub async fn complete(
        &mut self,
        client: &AgrimarketClient,
        order_id: OrderId,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_complete(client, order_id).await?;
        self.finish(client, submitted).await
    }

    pub async fn cancel(
        &mut self,
        client: &AgrimarketClient,
        order_id: OrderId,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_cancel(client, order_id).await?;
        self.finish(client, submitted).await
    }

    pub async fn begin_complete(
        &mut self,
        client: &AgrimarketClient,
        order_id: OrderId,
    ) -> Result<Submitted, ActionError> {
        self.begin(client, order_id, "Complete order failed", |client| async move {
            client.orders().complete(order_id).await
        })
        .await
    }

    pub async fn begin_cancel(
        &mut self,
        client: &AgrimarketClient,
        order_id: OrderId,
    ) -> Result<Submitted, ActionError> {
        self.begin(client, order_id, "Cancel order failed", |client| async move {
            client.orders().cancel(order_id).await
        })
        .await
    }

    /// Wait for a submitted complete or cancel, then reload the list.
    pub async fn finish(
        &mut self,
        client: &AgrimarketClient,
        submitted: Submitted,
    ) -> Result<TransactionReceipt, ActionError> {
        let (pending, generation) = submitted.into_parts();
        let Some((order_id, context)) = self.in_flight.remove(&pending.tx_hash()) else {
            return pending.confirm().await.map_err(ActionError::from);
        };
        let result = self.actions.entry(order_id).or_default().confirm(pending).await;

        if !client.session().is_current(generation) {
            self.mark_stale();
            return result;
        }
        match &result {
            Ok(_) => self.refresh(client).await,
            Err(e) => self.error = Some(e.describe(context)),
        }
        result
    }

    async fn begin<'c, F, Fut>(
        &mut self,
        client: &'c AgrimarketClient,
        order_id: OrderId,
        context: &'static str,
        submit: F,
    ) -> Result<Submitted, ActionError>
    where
        F: FnOnce(&'c AgrimarketClient) -> Fut,
        Fut: std::future::Future<Output = Result<PendingTransaction, SdkError>>,
    {
        self.error = None;
        let action = self.actions.entry(order_id).or_default();
        if !client.session().is_connected() {
            let err = action.fail(ActionError::WalletRequired);
            self.error = Some(err.user_message());
            return Err(err);
        }

        let generation = client.session().generation();
        match action.submit(submit(client)).await {
            Ok(pending) => {
                self.in_flight.insert(pending.tx_hash(), (order_id, context));
                Ok(Submitted::new(pending, generation))
            }
            Err(e) => {
                self.error = Some(e.describe(context));
                Err(e)
            }
        }
    }
}
