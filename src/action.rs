//! Per-action progress and errors for the view models.
//!
//! Every write goes `Idle → Submitting → AwaitingConfirmation(tx) →
//! Confirmed(tx) | Failed(err)`. Errors are scoped to the action that
//! produced them and never touch the session.
//!
//! View writes come in two phases: `begin_*` returns a [`Submitted`] once the
//! wallet accepted the transaction, and `finish_*` waits for the receipt.
//! Between the two the view reports `AwaitingConfirmation`.

use std::future::Future;

use alloy_primitives::TxHash;

use crate::domain::FormError;
use crate::error::{SdkError, TxError};
use crate::session::{PendingTransaction, TransactionReceipt};

/// `ConfirmationFailure::Reverted` renders with this prefix.
const REVERTED_PREFIX: &str = "reverted";

/// Why an action failed, with the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    WalletRequired,
    Invalid(String),
    SubmissionFailed(String),
    ConfirmationFailed(String),
    ReadFailed(String),
}

impl ActionError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// `"{context}: {detail}"` for remote failures. Wallet and validation
    /// messages are returned as they are.
    pub fn describe(&self, context: &str) -> String {
        match self {
            ActionError::WalletRequired | ActionError::Invalid(_) => self.to_string(),
            ActionError::SubmissionFailed(detail)
            | ActionError::ConfirmationFailed(detail)
            | ActionError::ReadFailed(detail) => format!("{}: {}", context, detail),
        }
    }

    /// The reverted-transaction case, which views often word differently.
    pub fn is_revert(&self) -> bool {
        matches!(self, ActionError::ConfirmationFailed(msg) if msg.starts_with(REVERTED_PREFIX))
    }
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::WalletRequired => write!(f, "Please connect your wallet."),
            ActionError::Invalid(msg) => write!(f, "{}", msg),
            ActionError::SubmissionFailed(msg) => {
                write!(f, "Transaction was not submitted: {}", msg)
            }
            ActionError::ConfirmationFailed(msg) => {
                write!(f, "Transaction did not confirm: {}", msg)
            }
            ActionError::ReadFailed(msg) => write!(f, "Failed to load data: {}", msg),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<TxError> for ActionError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::WalletRequired => ActionError::WalletRequired,
            TxError::SubmissionFailed(msg) => ActionError::SubmissionFailed(msg),
            TxError::ConfirmationFailed { reason, .. } => {
                ActionError::ConfirmationFailed(reason.to_string())
            }
        }
    }
}

impl From<SdkError> for ActionError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::Tx(tx) => tx.into(),
            SdkError::Validation(msg) => ActionError::Invalid(msg),
            other => ActionError::ReadFailed(other.to_string()),
        }
    }
}

impl From<FormError> for ActionError {
    fn from(err: FormError) -> Self {
        ActionError::Invalid(err.message().to_string())
    }
}

/// A transaction the wallet accepted, tagged with the session generation
/// it was issued under. Hand it back to the view that returned it.
#[derive(Debug)]
#[must_use = "a submitted write is only applied by its view's finish step"]
pub struct Submitted {
    pending: PendingTransaction,
    generation: u64,
}

impl Submitted {
    pub(crate) fn new(pending: PendingTransaction, generation: u64) -> Self {
        Self {
            pending,
            generation,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.pending.tx_hash()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn into_parts(self) -> (PendingTransaction, u64) {
        (self.pending, self.generation)
    }
}

/// Progress of one write action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ActionState {
    #[default]
    Idle,
    Submitting,
    AwaitingConfirmation(TxHash),
    Confirmed(TxHash),
    Failed(ActionError),
}

impl ActionState {
    /// Submitting or awaiting confirmation.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ActionState::Submitting | ActionState::AwaitingConfirmation(_)
        )
    }

    pub fn error(&self) -> Option<&ActionError> {
        match self {
            ActionState::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            ActionState::AwaitingConfirmation(tx) | ActionState::Confirmed(tx) => Some(*tx),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        *self = ActionState::Idle;
    }

    /// Record a failure that happened before anything was submitted.
    pub fn fail(&mut self, err: impl Into<ActionError>) -> ActionError {
        let err = err.into();
        *self = ActionState::Failed(err.clone());
        err
    }

    /// `Submitting`, then `AwaitingConfirmation(tx)` once the wallet accepts.
    pub async fn submit<F, E>(&mut self, submit: F) -> Result<PendingTransaction, ActionError>
    where
        F: Future<Output = Result<PendingTransaction, E>>,
        E: Into<ActionError>,
    {
        *self = ActionState::Submitting;
        match submit.await {
            Ok(pending) => {
                *self = ActionState::AwaitingConfirmation(pending.tx_hash());
                Ok(pending)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Wait for the receipt of a submitted transaction.
    pub async fn confirm(
        &mut self,
        pending: PendingTransaction,
    ) -> Result<TransactionReceipt, ActionError> {
        match pending.confirm().await {
            Ok(receipt) => {
                *self = ActionState::Confirmed(receipt.transaction_hash);
                Ok(receipt)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Both phases back to back.
    pub async fn execute<F, E>(&mut self, submit: F) -> Result<TransactionReceipt, ActionError>
    where
        F: Future<Output = Result<PendingTransaction, E>>,
        E: Into<ActionError>,
    {
        let pending = self.submit(submit).await?;
        self.confirm(pending).await
    }
}
