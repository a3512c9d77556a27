//! Wallet session: connection state and its lifecycle manager.
//!
//! [`Session`] is the snapshot type; the only code that mutates it lives in
//! this module, which keeps `signer ⇒ account ⇒ provider` true at all times.
//! [`SessionManager`] drives the transitions.

pub mod manager;
pub mod signer;

pub use manager::SessionManager;
pub use signer::{ConfirmationConfig, PendingTransaction, Provider, Signer, TransactionReceipt};

use std::sync::Arc;

use alloy_primitives::Address;

use crate::error::WalletError;
use crate::transport::WalletTransport;

/// Derived connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected(Address),
    Error(WalletError),
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected(_))
    }
}

/// Process-wide connection state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    provider: Option<Provider>,
    signer: Option<Signer>,
    account: Option<Address>,
    connection_error: Option<WalletError>,
    connecting: bool,
    generation: u64,
}

impl Session {
    pub fn provider(&self) -> Option<&Provider> {
        self.provider.as_ref()
    }

    pub fn signer(&self) -> Option<&Signer> {
        self.signer.as_ref()
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn connection_error(&self) -> Option<&WalletError> {
        self.connection_error.as_ref()
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// Bumped on every connection-relevant change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> SessionState {
        if self.connecting {
            SessionState::Connecting
        } else if let Some(account) = self.account {
            SessionState::Connected(account)
        } else if let Some(err) = &self.connection_error {
            SessionState::Error(err.clone())
        } else {
            SessionState::Disconnected
        }
    }

    // ── Transitions (module-private) ─────────────────────────────────────

    fn begin_connect(&mut self) {
        self.connecting = true;
        self.connection_error = None;
        self.generation += 1;
    }

    fn establish(&mut self, wallet: Arc<dyn WalletTransport>, account: Address) {
        self.provider = Some(Provider::Wallet(wallet.clone()));
        self.signer = Some(Signer::new(account, wallet));
        self.account = Some(account);
        self.connection_error = None;
        self.connecting = false;
        self.generation += 1;
    }

    fn fail(&mut self, err: WalletError) {
        self.connecting = false;
        self.connection_error = Some(err);
        self.generation += 1;
    }

    fn clear(&mut self) {
        self.provider = None;
        self.signer = None;
        self.account = None;
        self.connection_error = None;
        self.connecting = false;
        self.generation += 1;
    }
}
