//! Browser wallet: EIP-1193 `window.ethereum` via `js-sys`.
//!
//! Values cross the JS boundary as JSON (`JSON.stringify` / `JSON.parse`),
//! which is lossless for every payload the JSON-RPC surface uses.
//!
//! Listeners are stored per [`ListenerId`] together with the JS functions
//! handed to `ethereum.on`, so `removeListener` receives the exact same
//! function objects that were registered.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;
use js_sys::{Function, Object, Promise, Reflect, JSON};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::{RpcError, WalletError};
use crate::transport::{
    parse_accounts, ListenerId, RpcTransport, WalletEvent, WalletEventHandler, WalletTransport,
};

const ACCOUNTS_CHANGED: &str = "accountsChanged";
const CHAIN_CHANGED: &str = "chainChanged";

struct Registration {
    on_accounts: Closure<dyn FnMut(JsValue)>,
    on_chain: Closure<dyn FnMut(JsValue)>,
}

/// The injected EIP-1193 provider of the current page.
pub struct InjectedWallet {
    ethereum: JsValue,
    registrations: RefCell<HashMap<ListenerId, Registration>>,
    next_id: Cell<u64>,
}

impl InjectedWallet {
    /// Look up `window.ethereum`.
    pub fn detect() -> Result<Self, WalletError> {
        let window = web_sys::window().ok_or(WalletError::Unavailable)?;
        let ethereum = Reflect::get(&window, &JsValue::from_str("ethereum"))
            .map_err(|_| WalletError::Unavailable)?;
        if ethereum.is_undefined() || ethereum.is_null() {
            return Err(WalletError::Unavailable);
        }
        Ok(Self::from_js(ethereum))
    }

    /// Wrap an arbitrary EIP-1193 object.
    pub fn from_js(ethereum: JsValue) -> Self {
        Self {
            ethereum,
            registrations: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    fn method(&self, name: &str) -> Result<Function, RpcError> {
        Reflect::get(&self.ethereum, &JsValue::from_str(name))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| RpcError::InvalidResponse(format!("ethereum.{} is not a function", name)))
    }

    fn subscribe(&self, event: &str, callback: &Closure<dyn FnMut(JsValue)>) {
        match self.method("on") {
            Ok(on) => {
                if let Err(e) = on.call2(
                    &self.ethereum,
                    &JsValue::from_str(event),
                    callback.as_ref().unchecked_ref(),
                ) {
                    tracing::error!("ethereum.on('{}') failed: {}", event, js_error_message(&e));
                }
            }
            Err(e) => tracing::error!("{}", e),
        }
    }

    fn unsubscribe(&self, event: &str, callback: &Closure<dyn FnMut(JsValue)>) {
        match self.method("removeListener") {
            Ok(remove) => {
                if let Err(e) = remove.call2(
                    &self.ethereum,
                    &JsValue::from_str(event),
                    callback.as_ref().unchecked_ref(),
                ) {
                    tracing::error!(
                        "ethereum.removeListener('{}') failed: {}",
                        event,
                        js_error_message(&e)
                    );
                }
            }
            Err(e) => tracing::error!("{}", e),
        }
    }
}

#[async_trait(?Send)]
impl RpcTransport for InjectedWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let request = self.method("request")?;

        let args = Object::new();
        let set = |key: &str, value: &JsValue| {
            Reflect::set(&args, &JsValue::from_str(key), value)
                .map_err(|e| RpcError::InvalidResponse(js_error_message(&e)))
        };
        set("method", &JsValue::from_str(method))?;
        if !params.is_null() {
            set("params", &to_js(&params)?)?;
        }

        tracing::debug!(method, "EIP-1193 request");
        let promise: Promise = request
            .call1(&self.ethereum, &args)
            .map_err(rpc_error_from_js)?
            .dyn_into()
            .map_err(|_| RpcError::InvalidResponse("request() did not return a promise".into()))?;

        let result = JsFuture::from(promise).await.map_err(rpc_error_from_js)?;
        from_js(&result)
    }
}

impl WalletTransport for InjectedWallet {
    fn add_listener(&self, handler: WalletEventHandler) -> ListenerId {
        let id = ListenerId(self.next_id.get() + 1);
        self.next_id.set(id.0);

        let accounts_handler = handler.clone();
        let on_accounts = Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
            match from_js(&payload).and_then(parse_accounts) {
                Ok(accounts) => accounts_handler(WalletEvent::AccountsChanged(accounts)),
                Err(e) => tracing::warn!("Ignoring malformed accountsChanged payload: {}", e),
            }
        });
        let on_chain = Closure::<dyn FnMut(JsValue)>::new(move |payload: JsValue| {
            match payload.as_string() {
                Some(chain_id) => handler(WalletEvent::ChainChanged(chain_id)),
                None => tracing::warn!("Ignoring malformed chainChanged payload"),
            }
        });

        self.subscribe(ACCOUNTS_CHANGED, &on_accounts);
        self.subscribe(CHAIN_CHANGED, &on_chain);
        self.registrations.borrow_mut().insert(
            id,
            Registration {
                on_accounts,
                on_chain,
            },
        );
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let Some(registration) = self.registrations.borrow_mut().remove(&id) else {
            return false;
        };
        self.unsubscribe(ACCOUNTS_CHANGED, &registration.on_accounts);
        self.unsubscribe(CHAIN_CHANGED, &registration.on_chain);
        true
    }
}

impl Drop for InjectedWallet {
    fn drop(&mut self) {
        let ids: Vec<ListenerId> = self.registrations.borrow().keys().copied().collect();
        for id in ids {
            self.remove_listener(id);
        }
    }
}

fn to_js(value: &Value) -> Result<JsValue, RpcError> {
    let text = serde_json::to_string(value).map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
    JSON::parse(&text).map_err(|e| RpcError::InvalidResponse(js_error_message(&e)))
}

fn from_js(value: &JsValue) -> Result<Value, RpcError> {
    if value.is_undefined() || value.is_null() {
        return Ok(Value::Null);
    }
    let text = JSON::stringify(value)
        .map_err(|e| RpcError::InvalidResponse(js_error_message(&e)))?
        .as_string()
        .unwrap_or_default();
    serde_json::from_str(&text).map_err(|e| RpcError::InvalidResponse(e.to_string()))
}

/// EIP-1193 errors are plain objects `{ code, message, data? }`.
fn rpc_error_from_js(err: JsValue) -> RpcError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64());
    match code {
        Some(code) => RpcError::Response {
            code: code as i64,
            message: js_error_message(&err),
            data: Reflect::get(&err, &JsValue::from_str("data"))
                .ok()
                .and_then(|d| from_js(&d).ok())
                .filter(|d| !d.is_null()),
        },
        None => RpcError::InvalidResponse(js_error_message(&err)),
    }
}

fn js_error_message(err: &JsValue) -> String {
    if let Some(message) = Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
    {
        if !message.is_empty() {
            return message;
        }
    }
    if let Some(s) = err.as_string() {
        return s;
    }
    JSON::stringify(err)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_else(|| "Unknown JS error".to_string())
}
