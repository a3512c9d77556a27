//! Provider and signer handles, and the two-phase transaction protocol.
//!
//! A [`Provider`] performs reads. A [`Signer`] is an account plus the wallet
//! holding it and submits transactions. Submitting yields a
//! [`PendingTransaction`]; [`PendingTransaction::confirm`] polls for the
//! receipt.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash, U64};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ConfirmationFailure, RpcError, TxError};
use crate::invalidate::{Invalidation, InvalidationBus};
use crate::transport::{decode_result, methods, RpcTransport, WalletTransport};

// ─── Provider ────────────────────────────────────────────────────────────────

/// Read handle: either the connected wallet or the fallback JSON-RPC node.
#[derive(Clone)]
pub enum Provider {
    Wallet(Arc<dyn WalletTransport>),
    Rpc(Arc<dyn RpcTransport>),
}

impl Provider {
    pub fn is_wallet(&self) -> bool {
        matches!(self, Provider::Wallet(_))
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match self {
            Provider::Wallet(wallet) => wallet.request(method, params).await,
            Provider::Rpc(rpc) => rpc.request(method, params).await,
        }
    }

    /// `eth_call` against the latest block.
    pub async fn call(
        &self,
        from: Option<Address>,
        to: Address,
        data: Bytes,
    ) -> Result<Bytes, RpcError> {
        let mut tx = json!({ "to": to, "data": data });
        if let Some(from) = from {
            tx["from"] = json!(from);
        }
        let result = self.request(methods::CALL, json!([tx, "latest"])).await?;
        decode_result(methods::CALL, result)
    }

    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let result = self.request(methods::CHAIN_ID, json!([])).await?;
        let id: U64 = decode_result(methods::CHAIN_ID, result)?;
        Ok(id.to::<u64>())
    }

    /// `None` while the transaction is still pending.
    pub async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        let result = self
            .request(methods::GET_TRANSACTION_RECEIPT, json!([tx_hash]))
            .await?;
        decode_result(methods::GET_TRANSACTION_RECEIPT, result)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Wallet(_) => f.write_str("Provider::Wallet"),
            Provider::Rpc(_) => f.write_str("Provider::Rpc"),
        }
    }
}

// ─── Signer ──────────────────────────────────────────────────────────────────

/// Signing handle: the active account and the wallet that holds it.
#[derive(Clone)]
pub struct Signer {
    account: Address,
    wallet: Arc<dyn WalletTransport>,
}

impl Signer {
    pub(crate) fn new(account: Address, wallet: Arc<dyn WalletTransport>) -> Self {
        Self { account, wallet }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn provider(&self) -> Provider {
        Provider::Wallet(self.wallet.clone())
    }

    /// Submit a transaction through the wallet. Returns once the wallet hands
    /// back a hash; nothing is known about inclusion yet.
    pub async fn send_transaction(
        &self,
        to: Address,
        data: Bytes,
        confirmation: ConfirmationConfig,
    ) -> Result<PendingTransaction, TxError> {
        let tx = json!({ "from": self.account, "to": to, "data": data });
        let result = self
            .wallet
            .request(methods::SEND_TRANSACTION, json!([tx]))
            .await
            .map_err(|e| TxError::SubmissionFailed(e.message()))?;
        let tx_hash: TxHash = decode_result(methods::SEND_TRANSACTION, result)
            .map_err(|e| TxError::SubmissionFailed(e.to_string()))?;

        tracing::info!(%tx_hash, from = %self.account, %to, "Transaction submitted");

        Ok(PendingTransaction {
            tx_hash,
            provider: self.provider(),
            config: confirmation,
            on_confirm: None,
        })
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

// ─── Confirmation ────────────────────────────────────────────────────────────

/// Receipt polling settings.
///
/// The timeout is expressed in polls rather than wall-clock time so the same
/// code runs on `wasm32`, where `std::time::Instant` is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationConfig {
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_polls: 90,
        }
    }
}

/// Subset of `eth_getTransactionReceipt` the SDK needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// `0x1` success, `0x0` reverted. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<U64>,
}

impl TransactionReceipt {
    /// Status `0x1`, or no status field on a mined receipt.
    pub fn succeeded(&self) -> bool {
        match self.status {
            Some(status) => status == U64::from(1),
            None => self.block_number.is_some(),
        }
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number.map(|n| n.to::<u64>())
    }
}

/// A submitted transaction awaiting inclusion.
pub struct PendingTransaction {
    tx_hash: TxHash,
    provider: Provider,
    config: ConfirmationConfig,
    on_confirm: Option<(InvalidationBus, Invalidation)>,
}

impl PendingTransaction {
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Publish `reason` on `bus` once the transaction confirms.
    pub fn invalidates(mut self, bus: &InvalidationBus, reason: Invalidation) -> Self {
        self.on_confirm = Some((bus.clone(), reason));
        self
    }

    /// Poll for the receipt until it shows up or `max_polls` is exhausted.
    ///
    /// A failed lookup counts as "not yet": the transaction is already
    /// submitted, so only a revert or an exhausted budget fails it. At least
    /// one poll is always made.
    pub async fn confirm(self) -> Result<TransactionReceipt, TxError> {
        let tx_hash = self.tx_hash;
        let fail = |reason| TxError::ConfirmationFailed { tx_hash, reason };
        let polls = self.config.max_polls.max(1);
        let mut last_error = None;

        for poll in 0..polls {
            if poll > 0 {
                futures_timer::Delay::new(self.config.poll_interval).await;
            }

            let receipt = match self.provider.transaction_receipt(tx_hash).await {
                Ok(receipt) => {
                    last_error = None;
                    receipt
                }
                Err(e) => {
                    tracing::warn!(%tx_hash, poll, error = %e, "Receipt lookup failed");
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            match receipt {
                None => {
                    tracing::debug!(%tx_hash, poll, "Receipt not available yet");
                }
                Some(receipt) if receipt.succeeded() => {
                    tracing::info!(%tx_hash, block = ?receipt.block_number(), "Transaction confirmed");
                    if let Some((bus, reason)) = self.on_confirm {
                        bus.invalidate(reason);
                    }
                    return Ok(receipt);
                }
                Some(receipt) => {
                    tracing::warn!(%tx_hash, "Transaction reverted");
                    return Err(fail(ConfirmationFailure::Reverted {
                        block_number: receipt.block_number(),
                    }));
                }
            }
        }

        Err(fail(match last_error {
            Some(error) => ConfirmationFailure::Receipt(error),
            None => ConfirmationFailure::TimedOut { polls },
        }))
    }
}

impl std::fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("tx_hash", &self.tx_hash)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
