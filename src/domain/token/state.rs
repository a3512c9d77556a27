//! Token view: balance card and mint form.

use crate::action::{ActionError, ActionState, Submitted};
use crate::client::AgrimarketClient;
use crate::invalidate::Invalidation;
use crate::session::TransactionReceipt;

use super::{MintForm, TokenBalance};

#[derive(Debug, Default)]
pub struct TokenView {
    pub mint_form: MintForm,
    balance: Option<TokenBalance>,
    loading: bool,
    action: ActionState,
    error: Option<String>,
    minted: bool,
    stale: bool,
}

impl TokenView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self) -> Option<&TokenBalance> {
        self.balance.as_ref()
    }

    /// Balance with two decimals; `"0.00"` before the first load.
    pub fn balance_label(&self) -> String {
        self.balance
            .map(|b| b.to_fixed(2))
            .unwrap_or_else(|| "0.00".to_string())
    }

    pub fn is_loading(&self) -> bool {
        self.loading || self.action.is_busy()
    }

    pub fn action(&self) -> &ActionState {
        &self.action
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The last mint confirmed.
    pub fn minted(&self) -> bool {
        self.minted
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn apply_invalidation(&mut self, reason: &Invalidation) {
        if reason.affects_account() || *reason == Invalidation::TokenBalanceChanged {
            self.mark_stale();
        }
    }

    /// Reload the connected account's balance. Without a session the balance
    /// is cleared and nothing is fetched.
    pub async fn refresh(&mut self, client: &AgrimarketClient) {
        let Some(account) = client.session().account() else {
            self.balance = None;
            self.stale = false;
            return;
        };
        let generation = client.session().generation();
        self.loading = true;
        self.error = None;

        let result = client.token().balance_of(account).await;
        self.loading = false;

        if !client.session().is_current(generation) {
            self.mark_stale();
            return;
        }
        match result {
            Ok(balance) => {
                self.balance = Some(balance);
                self.stale = false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch token balance");
                self.error = Some("Failed to fetch token balance".to_string());
            }
        }
    }

    pub async fn mint(
        &mut self,
        client: &AgrimarketClient,
    ) -> Result<TransactionReceipt, ActionError> {
        let submitted = self.begin_mint(client).await?;
        self.finish_mint(client, submitted).await
    }

    pub async fn begin_mint(&mut self, client: &AgrimarketClient) -> Result<Submitted, ActionError> {
        self.error = None;
        self.minted = false;
        if !client.session().is_connected() {
            self.error = Some("Please connect your wallet first".to_string());
            return Err(self.action.fail(ActionError::WalletRequired));
        }
        let amount = match self.mint_form.validate() {
            Ok(amount) => amount,
            Err(e) => {
                self.error = Some(e.message().to_string());
                return Err(self.action.fail(e));
            }
        };

        let generation = client.session().generation();
        match self.action.submit(client.token().mint(amount)).await {
            Ok(pending) => Ok(Submitted::new(pending, generation)),
            Err(e) => {
                self.error = Some(e.describe("Minting failed"));
                Err(e)
            }
        }
    }

    /// Wait for a submitted mint, then reload the balance. If the session
    /// changed in the meantime the view is only marked stale.
    pub async fn finish_mint(
        &mut self,
        client: &AgrimarketClient,
        submitted: Submitted,
    ) -> Result<TransactionReceipt, ActionError> {
        let (pending, generation) = submitted.into_parts();
        let result = self.action.confirm(pending).await;

        if !client.session().is_current(generation) {
            self.mark_stale();
            return result;
        }
        match &result {
            Ok(_) => {
                self.minted = true;
                self.refresh(client).await;
                self.mint_form = MintForm::default();
            }
            Err(e) => self.error = Some(e.describe("Minting failed")),
        }
        result
    }
}
