//! Escrow view models: the lookup panel and the management panel.

use std::future::Future;

use alloy_primitives::TxHash;

use crate::action::{ActionError, ActionState, Submitted};
use crate::client::AgrimarketClient;
use crate::error::SdkError;
use crate::invalidate::Invalidation;
use crate::session::{PendingTransaction, TransactionReceipt};
use crate::shared::OrderId;

use super::{parse_order_id, Escrow, EscrowForm};

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// Search an escrow by order id. Reads only; works without a wallet.
#[derive(Debug, Default)]
pub struct EscrowLookupView {
    pub order_id: String,
    escrow: Option<Escrow>,
    loading: bool,
    error: Option<String>,
    stale: bool,
}

impl EscrowLookupView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn escrow(&self) -> Option<&Escrow> {
        self.escrow.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn apply_invalidation(&mut self, reason: &Invalidation) {
        let shown = self.escrow.as_ref().map(|e| e.order_id);
        let affected = match reason {
            Invalidation::EscrowChanged { order_id } => order_id.is_none() || *order_id == shown,
            Invalidation::ChainChanged { .. } => true,
            _ => false,
        };
        if affected && shown.is_some() {
            self.mark_stale();
        }
    }

    pub async fn search(&mut self, client: &AgrimarketClient) {
        self.error = None;
        let order_id = match parse_order_id(&self.order_id, "Please enter an order ID") {
            Ok(id) => id,
            Err(e) => {
                self.error = Some(e.message().to_string());
                return;
            }
        };

        let generation = client.session().generation();
        self.loading = true;
        let result = client.escrow().details(order_id).await;
        self.loading = false;

        if !client.session().is_current(generation) {
            self.mark_stale();
            return;
        }
        match result {
            Ok(escrow) => {
                self.escrow = Some(escrow);
                self.stale = false;
            }
            Err(e) => {
                self.escrow = None;
                self.error = Some(ActionError::from(e).describe("Failed to fetch escrow"));
            }
        }
    }
}

// ─── Management ──────────────────────────────────────────────────────────────

/// Which input a write clears once it confirms.
#[derive(Debug, Clone, Copy)]
enum Input {
    CreateForm,
    OrderId,
    DisputeOrderId,
    ResolveOrderId,
}

#[derive(Debug)]
struct EscrowWrite {
    context: &'static str,
    success: String,
    consumes: Input,
}

/// Create, complete, refund and dispute escrows; check refund eligibility.
///
/// One action runs at a time. Each write reports a success message naming
/// the order, and clears the input it consumed.
#[derive(Debug)]
pub struct EscrowView {
    pub create_form: EscrowForm,
    /// Shared by complete and refund.
    pub order_id: String,
    pub dispute_order_id: String,
    pub resolve_order_id: String,
    /// `true` releases to the seller, `false` refunds the buyer.
    pub resolve_approve: bool,
    pub can_refund_order_id: String,
    can_refund: Option<bool>,
    checking: bool,
    action: ActionState,
    in_flight: Option<(TxHash, EscrowWrite)>,
    error: Option<String>,
    success: Option<String>,
}

impl Default for EscrowView {
    fn default() -> Self {
        Self {
            create_form: EscrowForm::default(),
            order_id: String::new(),
            dispute_order_id: String::new(),
            resolve_order_id: String::new(),
            resolve_approve: true,
            can_refund_order_id: String::new(),
            can_refund: None,
            checking: false,
            action: ActionState::default(),
            in_flight: None,
            error: None,
            success: None,
        }
    }
}

impl EscrowView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(&self) -> &ActionState {
        &self.action
    }

    pub fn is_loading(&self) -> bool {
        self.checking || self.action.is_busy()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// Result of the last refund check: `"Yes"` or `"No"`.
    pub fn can_refund_label(&self) -> Option<&'static str> {
        self.can_refund.map(|yes| if yes { "Yes" } else { "No" })
    }

    pub async fn create_escrow(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_create_escrow(client).await?;
        self.finish(client, submitted).await
    }

    pub async fn complete_escrow(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_complete_escrow(client).await?;
        self.finish(client, submitted).await
    }

    pub async fn refund_escrow(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_refund_escrow(client).await?;
        self.finish(client, submitted).await
    }

    pub async fn raise_dispute(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_raise_dispute(client).await?;
        self.finish(client, submitted).await
    }

    pub async fn resolve_dispute(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_resolve_dispute(client).await?;
        self.finish(client, submitted).await
    }

    pub async fn begin_create_escrow(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<Submitted, ActionError> {
        self.check_session(client)?;
        let request = self.create_form.validate().map_err(|e| self.reject(e))?;
        let write = EscrowWrite {
            context: "Create escrow failed",
            success: "Escrow created successfully.".to_string(),
            consumes: Input::CreateForm,
        };
        self.send(client, write, client.escrow().create(&request)).await
    }

    pub async fn begin_complete_escrow(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<Submitted, ActionError> {
        self.check_session(client)?;
        let order_id = parse_order_id(&self.order_id, "Order ID is required.")
            .map_err(|e| self.reject(e))?;
        let write = EscrowWrite {
            context: "Complete escrow failed",
            success: format!("Escrow order {} completed.", order_id),
            consumes: Input::OrderId,
        };
        self.send(client, write, client.escrow().complete(order_id)).await
    }

    pub async fn begin_refund_escrow(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<Submitted, ActionError> {
        self.check_session(client)?;
        let order_id = parse_order_id(&self.order_id, "Order ID is required.")
            .map_err(|e| self.reject(e))?;
        let write = EscrowWrite {
            context: "Refund escrow failed",
            success: format!("Escrow order {} refunded.", order_id),
            consumes: Input::OrderId,
        };
        self.send(client, write, client.escrow().refund(order_id)).await
    }

    pub async fn begin_raise_dispute(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<Submitted, ActionError> {
        self.check_session(client)?;
        let order_id = parse_order_id(&self.dispute_order_id, "Order ID is required to raise dispute.")
            .map_err(|e| self.reject(e))?;
        let write = EscrowWrite {
            context: "Raise dispute failed",
            success: format!("Dispute raised for order {}.", order_id),
            consumes: Input::DisputeOrderId,
        };
        self.send(client, write, client.escrow().raise_dispute(order_id)).await
    }

    pub async fn begin_resolve_dispute(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<Submitted, ActionError> {
        self.check_session(client)?;
        let order_id =
            parse_order_id(&self.resolve_order_id, "Order ID is required to resolve dispute.")
                .map_err(|e| self.reject(e))?;
        let approve = self.resolve_approve;
        let write = EscrowWrite {
            context: "Resolve dispute failed",
            success: format!(
                "Dispute for order {} resolved with approval: {}",
                order_id, approve
            ),
            consumes: Input::ResolveOrderId,
        };
        self.send(client, write, client.escrow().resolve_dispute(order_id, approve))
            .await
    }

    /// Wait for the submitted write, then show its success message and clear
    /// the input it consumed. Nothing is shown if the session changed in the
    /// meantime.
    pub async fn finish(
        &mut self,
        client: &AgrimarketClient,
        submitted: Submitted,
    ) -> Result<TransactionReceipt, ActionError> {
        let (pending, generation) = submitted.into_parts();
        let tx_hash = pending.tx_hash();
        let write = self.in_flight.take().filter(|(tx, _)| *tx == tx_hash);
        let result = self.action.confirm(pending).await;

        if !client.session().is_current(generation) {
            tracing::debug!(%tx_hash, "session changed while the escrow write was confirming");
            return result;
        }
        let Some((_, write)) = write else {
            return result;
        };
        match &result {
            Ok(_) => {
                self.success = Some(write.success);
                self.clear(write.consumes);
            }
            Err(e) => self.error = Some(e.describe(write.context)),
        }
        result
    }

    /// Read-only refund eligibility check.
    pub async fn check_can_refund(&mut self, client: &AgrimarketClient) {
        self.error = None;
        self.success = None;
        let order_id: OrderId = match parse_order_id(
            &self.can_refund_order_id,
            "Order ID is required to check refund eligibility.",
        ) {
            Ok(id) => id,
            Err(e) => {
                self.error = Some(e.message().to_string());
                return;
            }
        };

        let generation = client.session().generation();
        self.checking = true;
        let result = client.escrow().can_refund(order_id).await;
        self.checking = false;
        if !client.session().is_current(generation) {
            return;
        }
        match result {
            Ok(yes) => self.can_refund = Some(yes),
            Err(e) => {
                self.can_refund = None;
                self.error = Some(ActionError::from(e).describe("Can refund check failed"));
            }
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn check_session(&mut self, client: &AgrimarketClient) -> Result<(), ActionError> {
        self.error = None;
        self.success = None;
        if client.session().is_connected() {
            Ok(())
        } else {
            Err(self.reject(ActionError::WalletRequired))
        }
    }

    fn reject(&mut self, err: impl Into<ActionError>) -> ActionError {
        let err = self.action.fail(err);
        self.error = Some(err.user_message());
        err
    }

    async fn send<F>(
        &mut self,
        client: &AgrimarketClient,
        write: EscrowWrite,
        submit: F,
    ) -> Result<Submitted, ActionError>
    where
        F: Future<Output = Result<PendingTransaction, SdkError>>,
    {
        let generation = client.session().generation();
        match self.action.submit(submit).await {
            Ok(pending) => {
                let tx_hash = pending.tx_hash();
                self.in_flight = Some((tx_hash, write));
                Ok(Submitted::new(pending, generation))
            }
            Err(e) => {
                self.error = Some(e.describe(write.context));
                Err(e)
            }
        }
    }

    fn clear(&mut self, input: Input) {
        match input {
            Input::CreateForm => self.create_form = EscrowForm::default(),
            Input::OrderId => self.order_id.clear(),
            Input::DisputeOrderId => self.dispute_order_id.clear(),
            Input::ResolveOrderId => self.resolve_order_id.clear(),
        }
    }
}
