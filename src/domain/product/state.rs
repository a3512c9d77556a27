//! Product view models: the marketplace listing page and the create form.

use alloy_primitives::TxHash;
use chrono::{NaiveDate, Utc};

use crate::action::{ActionError, ActionState, Submitted};
use crate::client::AgrimarketClient;
use crate::domain::order::OrderForm;
use crate::invalidate::Invalidation;
use crate::session::TransactionReceipt;
use crate::shared::ProductId;

use super::{NewProductForm, Product, ProductUpdateForm};

const LOAD_FAILED: &str = "Failed to load products.";
const ORDER_REVERTED: &str =
    "Order creation failed due to contract revert. Please check your inputs.";
const CREATE_REVERTED: &str =
    "Product creation failed due to contract revert. Please check your inputs.";

/// An order awaiting confirmation and the quantity to restore if it fails.
#[derive(Debug, Clone, Copy)]
struct OrderInFlight {
    tx_hash: TxHash,
    product_id: ProductId,
    quantity_before: u64,
}

/// Independent loading flags of the marketplace page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarketplaceLoading {
    pub fetching: bool,
    pub ordering: bool,
    pub updating: bool,
    pub deactivating: bool,
}

impl MarketplaceLoading {
    pub fn any(&self) -> bool {
        self.fetching || self.ordering || self.updating || self.deactivating
    }
}

// ─── MarketplaceView ─────────────────────────────────────────────────────────

/// Active listings, the buy form and the farmer's edit form.
///
/// Placing an order decrements the listed quantity immediately; the change
/// is rolled back if the transaction fails and kept (with the view marked
/// stale) when it confirms.
#[derive(Debug, Default)]
pub struct MarketplaceView {
    products: Vec<Product>,
    selected: Option<ProductId>,
    pub order_form: OrderForm,
    editing: Option<ProductId>,
    pub update_form: ProductUpdateForm,
    loading: MarketplaceLoading,
    order_action: ActionState,
    order_in_flight: Option<OrderInFlight>,
    update_action: ActionState,
    deactivate_action: ActionState,
    error: Option<String>,
    stale: bool,
}

impl MarketplaceView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn loading(&self) -> MarketplaceLoading {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn order_action(&self) -> &ActionState {
        &self.order_action
    }

    pub fn update_action(&self) -> &ActionState {
        &self.update_action
    }

    pub fn deactivate_action(&self) -> &ActionState {
        &self.deactivate_action
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn apply_invalidation(&mut self, reason: &Invalidation) {
        if reason.affects_products() || reason.affects_account() {
            self.mark_stale();
        }
    }

    // ── Fetch ────────────────────────────────────────────────────────────

    /// Reload the active listings. Works without a wallet.
    pub async fn refresh(&mut self, client: &AgrimarketClient) {
        let generation = client.session().generation();
        self.loading.fetching = true;
        self.error = None;

        let result = client.products().active().await;
        self.loading.fetching = false;

        if !client.session().is_current(generation) {
            self.mark_stale();
            return;
        }
        match result {
            Ok(products) => {
                self.products = products;
                self.stale = false;
                if self.selected.is_some_and(|id| self.product(id).is_none()) {
                    self.close_order();
                }
                if self.editing.is_some_and(|id| self.product(id).is_none()) {
                    self.close_edit();
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load products");
                self.error = Some(LOAD_FAILED.to_string());
                self.products.clear();
            }
        }
    }

    // ── Buy form ─────────────────────────────────────────────────────────

    pub fn selected_product(&self) -> Option<&Product> {
        self.selected.and_then(|id| self.product(id))
    }

    /// Open the buy form for a listing, prefilled with its unit price.
    pub fn open_order(&mut self, id: ProductId) {
        if let Some(product) = self.product(id) {
            self.order_form = OrderForm::for_product(product);
            self.selected = Some(id);
            self.order_action.reset();
            self.error = None;
        }
    }

    pub fn close_order(&mut self) {
        self.selected = None;
        self.order_form = OrderForm::default();
        self.error = None;
    }

    /// Whether the buy button should be enabled.
    pub fn can_place_order(&self) -> bool {
        !self.loading.ordering
            && self
                .selected_product()
                .is_some_and(|product| self.order_form.is_valid(product))
    }

    /// Place the order for the selected listing and wait for it to confirm.
    pub async fn place_order(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_order(client).await?;
        self.finish_order(client, submitted).await
    }

    /// Validate and submit the order, decrementing the listed quantity right
    /// away. `order_action` stays `AwaitingConfirmation` until
    /// [`Self::finish_order`].
    pub async fn begin_order(&mut self, client: &AgrimarketClient) -> Result<Submitted, ActionError> {
        self.error = None;
        let Some(product) = self.selected_product().cloned() else {
            let err = self.order_action.fail(ActionError::Invalid("No product selected.".into()));
            return Err(self.record(err));
        };
        if !client.session().is_connected() {
            let err = self.order_action.fail(ActionError::WalletRequired);
            return Err(self.record(err));
        }
        let request = match self.order_form.validate(&product) {
            Ok(request) => request,
            Err(e) => {
                let err = self.order_action.fail(e);
                return Err(self.record(err));
            }
        };

        let generation = client.session().generation();
        self.loading.ordering = true;
        self.set_quantity(product.id, product.quantity.saturating_sub(request.amount));

        match self.order_action.submit(client.orders().place(&request)).await {
            Ok(pending) => {
                self.order_in_flight = Some(OrderInFlight {
                    tx_hash: pending.tx_hash(),
                    product_id: product.id,
                    quantity_before: product.quantity,
                });
                Ok(Submitted::new(pending, generation))
            }
            Err(e) => {
                self.loading.ordering = false;
                self.set_quantity(product.id, product.quantity);
                self.error = Some(order_failure(&e));
                Err(e)
            }
        }
    }

    /// Wait for a submitted order. The decrement is kept when it confirms and
    /// rolled back when it fails. If the session changed in the meantime the
    /// view is only marked stale.
    pub async fn finish_order(
        &mut self,
        client: &AgrimarketClient,
        submitted: Submitted,
    ) -> Result<TransactionReceipt, ActionError> {
        let (pending, generation) = submitted.into_parts();
        let tx_hash = pending.tx_hash();
        let in_flight = self.order_in_flight.take().filter(|o| o.tx_hash == tx_hash);
        let result = self.order_action.confirm(pending).await;
        self.loading.ordering = false;

        if !client.session().is_current(generation) {
            tracing::debug!(%tx_hash, "session changed while the order was confirming");
            self.mark_stale();
            return result;
        }
        match &result {
            Ok(_) => {
                self.close_order();
                self.mark_stale();
            }
            Err(e) => {
                if let Some(order) = in_flight {
                    self.set_quantity(order.product_id, order.quantity_before);
                }
                self.error = Some(order_failure(e));
            }
        }
        result
    }

    // ── Edit form ────────────────────────────────────────────────────────

    pub fn editing_product(&self) -> Option<&Product> {
        self.editing.and_then(|id| self.product(id))
    }

    /// Open the edit form, prefilled from the listing.
    pub fn open_edit(&mut self, id: ProductId) {
        if let Some(product) = self.product(id) {
            self.update_form = ProductUpdateForm::from_product(product);
            self.editing = Some(id);
            self.update_action.reset();
            self.error = None;
        }
    }

    pub fn close_edit(&mut self) {
        self.editing = None;
        self.update_form = ProductUpdateForm::default();
        self.error = None;
    }

    pub async fn update_product(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_update(client).await?;
        self.finish_update(client, submitted).await
    }

    pub async fn begin_update(&mut self, client: &AgrimarketClient) -> Result<Submitted, ActionError> {
        self.error = None;
        let Some(id) = self.editing else {
            let err = self.update_action.fail(ActionError::Invalid("No product selected.".into()));
            return Err(self.record(err));
        };
        if !client.session().is_connected() {
            let err = self.update_action.fail(ActionError::WalletRequired);
            return Err(self.record(err));
        }
        let update = match self.update_form.validate() {
            Ok(update) => update,
            Err(e) => {
                let err = self.update_action.fail(e);
                return Err(self.record(err));
            }
        };

        let generation = client.session().generation();
        self.loading.updating = true;
        match self.update_action.submit(client.products().update(id, &update)).await {
            Ok(pending) => Ok(Submitted::new(pending, generation)),
            Err(e) => {
                self.loading.updating = false;
                self.error = Some(e.describe("Update failed"));
                Err(e)
            }
        }
    }

    /// Wait for a submitted update, then close the form and reload.
    pub async fn finish_update(
        &mut self,
        client: &AgrimarketClient,
        submitted: Submitted,
    ) -> Result<TransactionReceipt, ActionError> {
        let (pending, generation) = submitted.into_parts();
        let result = self.update_action.confirm(pending).await;
        self.loading.updating = false;

        if !client.session().is_current(generation) {
            self.mark_stale();
            return result;
        }
        match &result {
            Ok(_) => {
                self.close_edit();
                self.refresh(client).await;
            }
            Err(e) => self.error = Some(e.describe("Update failed")),
        }
        result
    }

    pub async fn deactivate_product(
        &mut self,
        client: &AgrimarketClient,
        id: ProductId,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_deactivate(client, id).await?;
        self.finish_deactivate(client, submitted).await
    }

    pub async fn begin_deactivate(
        &mut self,
        client: &AgrimarketClient,
        id: ProductId,
    ) -> Result<Submitted, ActionError> {
        self.error = None;
        if !client.session().is_connected() {
            let err = self.deactivate_action.fail(ActionError::WalletRequired);
            return Err(self.record(err));
        }

        let generation = client.session().generation();
        self.loading.deactivating = true;
        match self.deactivate_action.submit(client.products().deactivate(id)).await {
            Ok(pending) => Ok(Submitted::new(pending, generation)),
            Err(e) => {
                self.loading.deactivating = false;
                self.error = Some(e.describe("Deactivate failed"));
                Err(e)
            }
        }
    }

    pub async fn finish_deactivate(
        &mut self,
        client: &AgrimarketClient,
        submitted: Submitted,
    ) -> Result<TransactionReceipt, ActionError> {
        let (pending, generation) = submitted.into_parts();
        let result = self.deactivate_action.confirm(pending).await;
        self.loading.deactivating = false;

        if !client.session().is_current(generation) {
            self.mark_stale();
            return result;
        }
        match &result {
            Ok(_) => self.refresh(client).await,
            Err(e) => self.error = Some(e.describe("Deactivate failed")),
        }
        result
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn record(&mut self, err: ActionError) -> ActionError {
        self.error = Some(err.user_message());
        err
    }

    fn set_quantity(&mut self, id: ProductId, quantity: u64) {
        if let Some(product) = self.products.iter_mut().find(|p| p.id == id) {
            product.quantity = quantity;
        }
    }
}

fn order_failure(err: &ActionError) -> String {
    if err.is_revert() {
        ORDER_REVERTED.to_string()
    } else {
        err.describe("Order creation failed")
    }
}

// ─── ProductCreateView ───────────────────────────────────────────────────────

/// The farmer's "add product" form.
#[derive(Debug, Default)]
pub struct ProductCreateView {
    pub form: NewProductForm,
    action: ActionState,
    error: Option<String>,
    success: Option<String>,
}

impl ProductCreateView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(&self) -> &ActionState {
        &self.action
    }

    pub fn is_submitting(&self) -> bool {
        self.action.is_busy()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub async fn submit(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<TransactionReceipt, ActionError> {
        self.submit_on(client, Utc::now().date_naive()).await
    }

    /// Submit with `today` as the earliest acceptable harvest date.
    pub async fn submit_on(
        &mut self,
        client: &AgrimarketClient,
        today: NaiveDate,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_on(client, today).await?;
        self.finish(client, submitted).await
    }

    /// Validate the form and submit the listing without waiting for it.
    pub async fn begin_on(
        &mut self,
        client: &AgrimarketClient,
        today: NaiveDate,
    ) -> Result<Submitted, ActionError> {
        self.error = None;
        self.success = None;

        if !client.session().is_connected() {
            self.error = Some("Please connect your wallet first".to_string());
            return Err(self.action.fail(ActionError::WalletRequired));
        }
        let product = match self.form.validate_on(today) {
            Ok(product) => product,
            Err(e) => {
                self.error = Some(e.message().to_string());
                return Err(self.action.fail(e));
            }
        };

        let generation = client.session().generation();
        match self.action.submit(client.products().create(&product)).await {
            Ok(pending) => Ok(Submitted::new(pending, generation)),
            Err(e) => {
                self.error = Some(e.describe("Product creation failed"));
                Err(e)
            }
        }
    }

    /// Wait for a submitted listing. Messages are dropped when the session
    /// changed in the meantime.
    pub async fn finish(
        &mut self,
        client: &AgrimarketClient,
        submitted: Submitted,
    ) -> Result<TransactionReceipt, ActionError> {
        let (pending, generation) = submitted.into_parts();
        let result = self.action.confirm(pending).await;

        if !client.session().is_current(generation) {
            tracing::debug!("session changed while the listing was confirming");
            return result;
        }
        match &result {
            Ok(_) => {
                self.success = Some("Product created successfully!".to_string());
                self.form = NewProductForm::default();
            }
            Err(e) if e.is_revert() => self.error = Some(CREATE_REVERTED.to_string()),
            Err(e) => self.error = Some(e.describe("Product creation failed")),
        }
        result
    }
}
