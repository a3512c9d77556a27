//! Read-only JSON-RPC transport over HTTP: `HttpRpc`.
//!
//! Used as the fallback provider so listings stay browsable without a wallet.
//! It holds no accounts: `eth_sendTransaction` is rejected by any public node,
//! and the session layer never routes writes here.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HttpError, RpcError};
use crate::transport::retry::{RetryConfig, RetryPolicy};
use crate::transport::RpcTransport;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// JSON-RPC 2.0 client for a single HTTP endpoint.
#[derive(Clone)]
pub struct HttpRpc {
    url: String,
    client: Client,
    next_id: Arc<AtomicU64>,
    retry: RetryConfig,
}

impl HttpRpc {
    pub fn new(url: &str) -> Result<Self, HttpError> {
        Self::with_retry(url, RetryConfig::idempotent())
    }

    pub fn with_retry(url: &str, retry: RetryConfig) -> Result<Self, HttpError> {
        #[allow(unused_mut)]
        let mut builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder
                .timeout(Duration::from_secs(30))
                .pool_max_idle_per_host(10);
        }

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client: builder.build()?,
            next_id: Arc::new(AtomicU64::new(1)),
            retry,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request_with_retry(
        &self,
        method: &str,
        params: &Value,
        policy: &RetryPolicy,
    ) -> Result<Value, RpcError> {
        let Some(config) = policy.resolve(&self.retry) else {
            return self.do_request(method, params).await;
        };

        let mut attempt = 0;
        loop {
            let err = match self.do_request(method, params).await {
                Ok(value) => return Ok(value),
                Err(e) if !config.is_retryable(&e) => return Err(e),
                Err(e) => e,
            };
            if attempt >= config.max_retries {
                return Err(HttpError::MaxRetriesExceeded {
                    attempts: attempt + 1,
                    last_error: err.to_string(),
                }
                .into());
            }

            let delay = config.delay_after(attempt, &err);
            tracing::debug!(
                method,
                url = %self.url,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying JSON-RPC request"
            );
            futures_timer::Delay::new(delay).await;
            attempt += 1;
        }
    }

    async fn do_request(&self, method: &str, params: &Value) -> Result<Value, RpcError> {
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(HttpError::from)?;
        let status = resp.status();

        if !status.is_success() {
            let retry_after_ms = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1_000));
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), body_text, retry_after_ms).into());
        }

        let parsed: JsonRpcResponse = resp.json().await.map_err(HttpError::from)?;
        into_result(parsed)
    }
}

/// Non-2xx responses. Public nodes answer throttling with 429 and usually a
/// `Retry-After` in seconds.
fn status_error(status: u16, body: String, retry_after_ms: Option<u64>) -> HttpError {
    match status {
        429 => HttpError::RateLimited { retry_after_ms },
        401 | 403 => HttpError::Unauthorized,
        404 => HttpError::NotFound(body),
        400..=499 => HttpError::BadRequest(body),
        _ => HttpError::ServerError { status, body },
    }
}

fn into_result(resp: JsonRpcResponse) -> Result<Value, RpcError> {
    match (resp.result, resp.error) {
        (_, Some(err)) => Err(RpcError::Response {
            code: err.code,
            message: err.message,
            data: err.data,
        }),
        (Some(result), None) => Ok(result),
        // `null` results (e.g. a pending receipt) deserialize as `None`.
        (None, None) => Ok(Value::Null),
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl RpcTransport for HttpRpc {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        tracing::debug!(method, url = %self.url, "JSON-RPC request");
        self.request_with_retry(method, &params, &RetryPolicy::for_method(method))
            .await
    }
}
