//! Invalidation bus: explicit "this data is stale" notifications.
//!
//! Session transitions and confirmed writes publish an [`Invalidation`];
//! views subscribe and mark themselves stale, then re-fetch on demand.

use std::sync::Arc;

use alloy_primitives::Address;
use parking_lot::Mutex;

use crate::shared::OrderId;
use crate::transport::MaybeSendSync;

/// What became stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Connection established, cleared or restored.
    SessionChanged,
    /// The active account changed; `None` means no account is authorized.
    AccountChanged { account: Option<Address> },
    /// The wallet switched chains. The session has been reset; hosts should
    /// call `restore()` and re-fetch everything.
    ChainChanged { chain_id: String },
    ProductsChanged,
    OrdersChanged,
    /// `None` when a new escrow was opened and its order id is not known yet.
    EscrowChanged { order_id: Option<OrderId> },
    TokenBalanceChanged,
}

impl Invalidation {
    /// Whether product listings derived from contract state should be refetched.
    pub fn affects_products(&self) -> bool {
        matches!(
            self,
            Invalidation::ProductsChanged
                | Invalidation::OrdersChanged
                | Invalidation::ChainChanged { .. }
        )
    }

    /// Whether per-account data (orders, balances) should be refetched.
    pub fn affects_account(&self) -> bool {
        matches!(
            self,
            Invalidation::SessionChanged
                | Invalidation::AccountChanged { .. }
                | Invalidation::ChainChanged { .. }
        )
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub type InvalidationHandler = Arc<dyn Fn(&Invalidation) + Send + Sync>;
#[cfg(target_arch = "wasm32")]
pub type InvalidationHandler = Arc<dyn Fn(&Invalidation)>;

/// Handle returned by [`InvalidationBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    handlers: Vec<(SubscriberId, InvalidationHandler)>,
}

/// Subscriber list shared by the client, the session manager and pending
/// transactions. Cloning shares the same list.
#[derive(Clone, Default)]
pub struct InvalidationBus {
    inner: Arc<Mutex<Subscribers>>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&Invalidation) + MaybeSendSync + 'static,
    {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = SubscriberId(inner.next_id);
        let handler: InvalidationHandler = Arc::new(handler);
        inner.handlers.push((id, handler));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.handlers.len();
        inner.handlers.retain(|(sid, _)| *sid != id);
        inner.handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().handlers.len()
    }

    /// Deliver `reason` to every subscriber, in subscription order.
    pub fn invalidate(&self, reason: Invalidation) {
        // Snapshot so handlers can subscribe/unsubscribe while being called.
        let handlers: Vec<InvalidationHandler> = self
            .inner
            .lock()
            .handlers
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        tracing::debug!(?reason, subscribers = handlers.len(), "Invalidation");
        for handler in handlers {
            handler(&reason);
        }
    }
}

impl std::fmt::Debug for InvalidationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
