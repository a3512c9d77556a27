//! Retry rules for JSON-RPC over HTTP.
//!
//! Only reads are retried. A failure is retryable when it is a transport
//! failure, one of the configured HTTP statuses, or one of the JSON-RPC
//! error codes nodes use for throttling.

use std::time::Duration;

use rand::Rng;

use crate::error::{HttpError, RpcError};
use crate::transport::methods;

/// Retry policy for a single JSON-RPC request.
#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Single attempt. Used for anything that may change chain state.
    #[default]
    None,
    /// The transport's configured [`RetryConfig`].
    Idempotent,
    Custom(RetryConfig),
}

impl RetryPolicy {
    /// Reads are safe to repeat; transaction submission is not.
    pub fn for_method(method: &str) -> Self {
        match method {
            methods::CALL
            | methods::CHAIN_ID
            | methods::GET_TRANSACTION_RECEIPT
            | methods::ACCOUNTS
            | "eth_blockNumber"
            | "eth_getBalance"
            | "eth_getCode" => RetryPolicy::Idempotent,
            _ => RetryPolicy::None,
        }
    }

    /// The config to retry with, or `None` for a single attempt.
    pub fn resolve<'a>(&'a self, transport_default: &'a RetryConfig) -> Option<&'a RetryConfig> {
        match self {
            RetryPolicy::None => None,
            RetryPolicy::Idempotent => Some(transport_default),
            RetryPolicy::Custom(config) => Some(config),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Delay multiplier per attempt.
    pub multiplier: u32,
    /// Spread each delay by ±25%.
    pub jitter: bool,
    pub retry_statuses: Vec<u16>,
    /// JSON-RPC error codes treated as throttling (`-32005` is "limit exceeded").
    pub retry_codes: Vec<i64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::idempotent()
    }
}

impl RetryConfig {
    pub fn idempotent() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
            multiplier: 2,
            jitter: true,
            retry_statuses: vec![429, 502, 503, 504],
            retry_codes: vec![-32005],
        }
    }

    /// Whether `err` is worth another attempt.
    pub fn is_retryable(&self, err: &RpcError) -> bool {
        match err {
            RpcError::Http(HttpError::Timeout)
            | RpcError::Http(HttpError::Request(_))
            | RpcError::Http(HttpError::RateLimited { .. }) => true,
            RpcError::Http(HttpError::ServerError { status, .. }) => {
                self.retry_statuses.contains(status)
            }
            RpcError::Response { code, .. } => self.retry_codes.contains(code),
            _ => false,
        }
    }

    /// Exponential delay before retry number `attempt + 1`, capped at `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        let delay = self.initial_delay.saturating_mul(factor).min(self.max_delay);
        if self.jitter {
            delay.mul_f64(rand::thread_rng().gen_range(0.75..=1.25))
        } else {
            delay
        }
    }

    /// Delay after `err`: the server's `Retry-After` hint when it is longer
    /// than the backoff.
    pub fn delay_after(&self, attempt: u32, err: &RpcError) -> Duration {
        let backoff = self.backoff(attempt);
        match err {
            RpcError::Http(HttpError::RateLimited {
                retry_after_ms: Some(ms),
            }) => backoff.max(Duration::from_millis(*ms)),
            _ => backoff,
        }
    }
}
