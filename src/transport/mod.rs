//! Transport layer: the JSON-RPC request seam and the wallet capability.
//!
//! Two traits:
//! - [`RpcTransport`]: `request(method, params)`. Any JSON-RPC endpoint.
//! - [`WalletTransport`]: an `RpcTransport` that can also hold accounts and
//!   push events (`accountsChanged`, `chainChanged`). Listener registration
//!   returns an explicit [`ListenerId`] that is passed back verbatim to
//!   deregister exactly what was added.
//!
//! Implementations:
//! - `http` feature → [`http::HttpRpc`], read-only JSON-RPC over `reqwest`
//! - `wasm` feature → [`injected::InjectedWallet`], EIP-1193 `window.ethereum`
//! - always → [`memory::MemoryWallet`], a scripted in-process wallet

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub mod retry;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod injected;

pub mod memory;

use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RpcError;

/// JSON-RPC method names used by the SDK.
pub mod methods {
    pub const REQUEST_PERMISSIONS: &str = "wallet_requestPermissions";
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const CALL: &str = "eth_call";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const GET_TRANSACTION_RECEIPT: &str = "eth_getTransactionReceipt";
}

// ─── Send/Sync bounds ────────────────────────────────────────────────────────

/// `Send + Sync` on native targets, nothing on `wasm32` where JS handles are
/// single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSendSync {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSendSync for T {}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Events pushed by a wallet outside of any request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// Ordered list of authorized accounts. Empty means none are authorized.
    AccountsChanged(Vec<Address>),
    /// New chain id, as reported by the wallet (hex string).
    ChainChanged(String),
}

/// Callback invoked for every wallet event.
#[cfg(not(target_arch = "wasm32"))]
pub type WalletEventHandler = Arc<dyn Fn(WalletEvent) + Send + Sync>;
#[cfg(target_arch = "wasm32")]
pub type WalletEventHandler = Arc<dyn Fn(WalletEvent)>;

/// Identity of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

// ─── Traits ──────────────────────────────────────────────────────────────────

/// A JSON-RPC endpoint.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait RpcTransport: MaybeSendSync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// A wallet: an RPC endpoint that owns accounts and emits events.
pub trait WalletTransport: RpcTransport {
    /// Register a handler for `accountsChanged` and `chainChanged`.
    fn add_listener(&self, handler: WalletEventHandler) -> ListenerId;

    /// Remove a handler. Returns `false` if the id was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// Decode a JSON-RPC `result` into a typed value.
pub(crate) fn decode_result<T: DeserializeOwned>(method: &str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value)
        .map_err(|e| RpcError::InvalidResponse(format!("{}: {}", method, e)))
}

/// Parse an `accountsChanged` payload or an account-list result.
pub fn parse_accounts(value: Value) -> Result<Vec<Address>, RpcError> {
    decode_result(methods::ACCOUNTS, value)
}
