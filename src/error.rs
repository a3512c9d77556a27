//! Unified SDK error types.

use alloy_primitives::TxHash;
use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Transaction error: {0}")]
    Tx(#[from] TxError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<HttpError> for SdkError {
    fn from(err: HttpError) -> Self {
        SdkError::Rpc(RpcError::Http(err))
    }
}

/// Session-level wallet errors.
///
/// These are the only errors recorded into the session's `connection_error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("No wallet is available in this environment")]
    Unavailable,

    #[error("Request rejected by user: {0}")]
    UserRejected(String),

    #[error("Wallet request failed: {0}")]
    RequestFailed(String),
}

impl From<RpcError> for WalletError {
    fn from(err: RpcError) -> Self {
        if err.is_user_rejection() {
            WalletError::UserRejected(err.message())
        } else {
            WalletError::RequestFailed(err.to_string())
        }
    }
}

/// Per-action transaction errors. Never stored in the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("A connected wallet is required")]
    WalletRequired,

    #[error("Transaction was not submitted: {0}")]
    SubmissionFailed(String),

    #[error("Transaction {tx_hash} failed to confirm: {reason}")]
    ConfirmationFailed {
        tx_hash: TxHash,
        reason: ConfirmationFailure,
    },
}

/// Why a submitted transaction did not confirm.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationFailure {
    #[error("reverted in block {block_number:?}")]
    Reverted { block_number: Option<u64> },

    #[error("no receipt after {polls} polls")]
    TimedOut { polls: u32 },

    #[error("receipt lookup failed: {0}")]
    Receipt(String),
}

/// JSON-RPC errors, either returned by the remote end or raised by the transport.
#[derive(Error, Debug, Clone)]
pub enum RpcError {
    #[error("JSON-RPC error {code}: {message}")]
    Response {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RpcError {
    /// EIP-1193 code for "the user rejected the request".
    pub const USER_REJECTED: i64 = 4001;

    pub fn user_rejected(message: impl Into<String>) -> Self {
        RpcError::Response {
            code: Self::USER_REJECTED,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, RpcError::Response { code, .. } if *code == Self::USER_REJECTED)
    }

    /// The bare message, without the code prefix.
    pub fn message(&self) -> String {
        match self {
            RpcError::Response { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// HTTP-layer errors.
#[derive(Error, Debug, Clone)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Request(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_maps_to_user_rejected() {
        let err: WalletError = RpcError::user_rejected("User denied account access").into();
        assert_eq!(
            err,
            WalletError::UserRejected("User denied account access".to_string())
        );
    }

    #[test]
    fn test_other_rpc_errors_map_to_request_failed() {
        let err: WalletError = RpcError::Response {
            code: -32002,
            message: "Request already pending".to_string(),
            data: None,
        }
        .into();
        assert!(matches!(err, WalletError::RequestFailed(msg) if msg.contains("-32002")));
    }

    #[test]
    fn test_http_error_lifts_into_sdk_error() {
        let err: SdkError = HttpError::Timeout.into();
        assert!(matches!(err, SdkError::Rpc(RpcError::Http(HttpError::Timeout))));
    }
}
