//! In-process scripted wallet: `MemoryWallet`.
//!
//! Plays both roles a browser wallet plays: account holder (permissions,
//! `eth_accounts`, events) and JSON-RPC node (`eth_call`, transactions,
//! receipts). Used by the test suite and handy for demos and for hosts that
//! want to drive the SDK without a real wallet.
//!
//! Behavior is scripted through methods (`set_accounts`, `reject_next`,
//! `revert_next_transaction`, `on_method`, ...) and every request is recorded
//! so callers can assert what reached the "remote" side.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use alloy_primitives::{Address, TxHash, B256};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::error::RpcError;
use crate::transport::{
    methods, ListenerId, RpcTransport, WalletEvent, WalletEventHandler, WalletTransport,
};

/// Custom responder for a method.
#[cfg(not(target_arch = "wasm32"))]
pub type MethodHandler = Arc<dyn Fn(&Value) -> Result<Value, RpcError> + Send + Sync>;
#[cfg(target_arch = "wasm32")]
pub type MethodHandler = Arc<dyn Fn(&Value) -> Result<Value, RpcError>>;

/// How a submitted transaction ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxFate {
    Success,
    Revert,
}

#[derive(Debug, Clone)]
struct MinedTx {
    fate: TxFate,
    /// Receipt lookups that still return `null` before the receipt appears.
    pending_polls: u32,
    block_number: u64,
}

#[derive(Default)]
struct State {
    /// Returned by `eth_accounts` (already authorized, no prompt).
    authorized: Vec<Address>,
    /// Granted by `eth_requestAccounts` after approval.
    accounts: Vec<Address>,
    chain_id: String,
    /// Errors returned, in order, by the next requests of a method.
    scripted_errors: HashMap<String, VecDeque<RpcError>>,
    handlers: HashMap<String, MethodHandler>,
    listeners: Vec<(ListenerId, WalletEventHandler)>,
    next_listener: u64,
    requests: Vec<(String, Value)>,
    transactions: HashMap<TxHash, MinedTx>,
    next_fate: VecDeque<TxFate>,
    receipt_delay: u32,
    tx_count: u64,
}

/// A scripted wallet + node living in memory.
#[derive(Clone, Default)]
pub struct MemoryWallet {
    state: Arc<Mutex<State>>,
}

impl MemoryWallet {
    /// A wallet that will grant `accounts` when asked, with nothing
    /// pre-authorized.
    pub fn new(accounts: Vec<Address>) -> Self {
        let wallet = Self::default();
        {
            let mut state = wallet.state.lock();
            state.accounts = accounts;
            state.chain_id = format!("0x{:x}", crate::network::DEFAULT_CHAIN_ID);
        }
        wallet
    }

    /// A wallet whose `accounts` are already authorized for this site, so the
    /// silent `eth_accounts` probe finds them.
    pub fn authorized(accounts: Vec<Address>) -> Self {
        let wallet = Self::new(accounts.clone());
        wallet.state.lock().authorized = accounts;
        wallet
    }

    // ── Scripting ────────────────────────────────────────────────────────

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().accounts = accounts;
    }

    /// Make the next request of `method` fail with `error`.
    pub fn fail_next(&self, method: &str, error: RpcError) {
        self.state
            .lock()
            .scripted_errors
            .entry(method.to_string())
            .or_default()
            .push_back(error);
    }

    /// Make the next request of `method` fail as if the user dismissed the prompt.
    pub fn reject_next(&self, method: &str) {
        self.fail_next(method, RpcError::user_rejected("User rejected the request."));
    }

    /// Answer `method` with a custom responder (typically `eth_call`).
    pub fn on_method(
        &self,
        method: &str,
        handler: impl Fn(&Value) -> Result<Value, RpcError> + Send + Sync + 'static,
    ) {
        self.state
            .lock()
            .handlers
            .insert(method.to_string(), Arc::new(handler));
    }

    /// The next submitted transaction is mined with status 0.
    pub fn revert_next_transaction(&self) {
        self.state.lock().next_fate.push_back(TxFate::Revert);
    }

    /// Receipts only appear after `polls` lookups returned `null`.
    pub fn delay_receipts(&self, polls: u32) {
        self.state.lock().receipt_delay = polls;
    }

    // ── Events ───────────────────────────────────────────────────────────

    pub fn emit(&self, event: WalletEvent) {
        if let WalletEvent::ChainChanged(chain) = &event {
            self.state.lock().chain_id = chain.clone();
        }
        // Handlers run without the lock held: they may call back into the wallet.
        let handlers: Vec<WalletEventHandler> = self
            .state
            .lock()
            .listeners
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(event.clone());
        }
    }

    pub fn emit_accounts_changed(&self, accounts: Vec<Address>) {
        {
            let mut state = self.state.lock();
            state.authorized = accounts.clone();
        }
        self.emit(WalletEvent::AccountsChanged(accounts));
    }

    pub fn emit_chain_changed(&self, chain_id: &str) {
        self.emit(WalletEvent::ChainChanged(chain_id.to_string()));
    }

    // ── Inspection ───────────────────────────────────────────────────────

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.state.lock().requests.clone()
    }

    pub fn request_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }

    // ── Built-in methods ─────────────────────────────────────────────────

    fn respond(&self, method: &str, params: &Value) -> Result<Value, RpcError> {
        let mut state = self.state.lock();
        state.requests.push((method.to_string(), params.clone()));

        if let Some(err) = state
            .scripted_errors
            .get_mut(method)
            .and_then(|queue| queue.pop_front())
        {
            return Err(err);
        }

        if let Some(handler) = state.handlers.get(method).cloned() {
            drop(state);
            return handler(params);
        }

        match method {
            methods::REQUEST_PERMISSIONS => Ok(json!([{ "parentCapability": "eth_accounts" }])),
            methods::REQUEST_ACCOUNTS => {
                state.authorized = state.accounts.clone();
                Ok(json!(state.accounts))
            }
            methods::ACCOUNTS => Ok(json!(state.authorized)),
            methods::CHAIN_ID => Ok(json!(state.chain_id)),
            methods::SEND_TRANSACTION => {
                state.tx_count += 1;
                let hash = B256::left_padding_from(&state.tx_count.to_be_bytes());
                let fate = state.next_fate.pop_front().unwrap_or(TxFate::Success);
                let mined = MinedTx {
                    fate,
                    pending_polls: state.receipt_delay,
                    block_number: 100 + state.tx_count,
                };
                state.transactions.insert(hash, mined);
                Ok(json!(hash))
            }
            methods::GET_TRANSACTION_RECEIPT => {
                let hash: TxHash = params
                    .get(0)
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| RpcError::InvalidResponse(e.to_string()))?
                    .ok_or_else(|| RpcError::InvalidResponse("missing tx hash".to_string()))?;
                match state.transactions.get_mut(&hash) {
                    None => Ok(Value::Null),
                    Some(tx) if tx.pending_polls > 0 => {
                        tx.pending_polls -= 1;
                        Ok(Value::Null)
                    }
                    Some(tx) => {
                        let status = match tx.fate {
                            TxFate::Success => "0x1",
                            TxFate::Revert => "0x0",
                        };
                        Ok(json!({
                            "transactionHash": hash,
                            "blockNumber": format!("0x{:x}", tx.block_number),
                            "status": status,
                        }))
                    }
                }
            }
            other => Err(RpcError::Response {
                code: -32601,
                message: format!("method {} not supported", other),
                data: None,
            }),
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl RpcTransport for MemoryWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.respond(method, &params)
    }
}

impl WalletTransport for MemoryWallet {
    fn add_listener(&self, handler: WalletEventHandler) -> ListenerId {
        let mut state = self.state.lock();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.push((id, handler));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut state = self.state.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(lid, _)| *lid != id);
        state.listeners.len() != before
    }
}
