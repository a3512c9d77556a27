//! `SessionManager`: connect, disconnect, restore and wallet events.
//!
//! State lives behind a synchronous `parking_lot::RwLock` that is never held
//! across an `.await`, so wallet callbacks (which are synchronous) can apply
//! transitions directly. `connect` and `restore` are serialized by an async
//! mutex; `disconnect` is not, and supersedes any attempt in flight by
//! bumping the session generation.

use std::sync::{Arc, Weak};

use alloy_primitives::Address;
use parking_lot::{Mutex, RwLock};
use serde_json::json;

use crate::error::{RpcError, WalletError};
use crate::invalidate::{Invalidation, InvalidationBus};
use crate::session::signer::{ConfirmationConfig, Provider, Signer};
use crate::session::{Session, SessionState};
use crate::transport::{
    methods, parse_accounts, ListenerId, RpcTransport, WalletEvent, WalletEventHandler,
    WalletTransport,
};

/// JSON-RPC "method not found"; some wallets do not implement permissions.
const METHOD_NOT_FOUND: i64 = -32601;

struct Shared {
    wallet: Option<Arc<dyn WalletTransport>>,
    fallback: Arc<dyn RpcTransport>,
    session: RwLock<Session>,
    connect_lock: async_lock::Mutex<()>,
    listener: Mutex<Option<ListenerId>>,
    bus: InvalidationBus,
    confirmation: ConfirmationConfig,
}

/// Owns the wallet connection. Cloning shares the same session.
#[derive(Clone)]
pub struct SessionManager {
    shared: Arc<Shared>,
}

impl SessionManager {
    /// `wallet` is the injected capability (absent when the environment has
    /// none); `fallback` serves reads while no wallet session exists.
    pub fn new(
        wallet: Option<Arc<dyn WalletTransport>>,
        fallback: Arc<dyn RpcTransport>,
        bus: InvalidationBus,
        confirmation: ConfirmationConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                wallet,
                fallback,
                session: RwLock::new(Session::default()),
                connect_lock: async_lock::Mutex::new(()),
                listener: Mutex::new(None),
                bus,
                confirmation,
            }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.shared.session.read().clone()
    }

    pub fn state(&self) -> SessionState {
        self.shared.session.read().state()
    }

    pub fn account(&self) -> Option<Address> {
        self.shared.session.read().account()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.session.read().is_connected()
    }

    pub fn generation(&self) -> u64 {
        self.shared.session.read().generation()
    }

    /// Whether nothing connection-relevant happened since `generation` was read.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    pub fn has_wallet(&self) -> bool {
        self.shared.wallet.is_some()
    }

    pub fn signing_handle(&self) -> Option<Signer> {
        self.shared.session.read().signer().cloned()
    }

    /// The session provider when one exists, else the fallback node.
    pub fn read_only_handle(&self) -> Provider {
        self.shared
            .session
            .read()
            .provider()
            .cloned()
            .unwrap_or_else(|| Provider::Rpc(self.shared.fallback.clone()))
    }

    pub fn invalidation_bus(&self) -> &InvalidationBus {
        &self.shared.bus
    }

    pub fn confirmation(&self) -> ConfirmationConfig {
        self.shared.confirmation
    }

    pub fn listener_registered(&self) -> bool {
        self.shared.listener.lock().is_some()
    }

    // ── Transitions ──────────────────────────────────────────────────────

    /// Ask the wallet for permission and connect the first granted account.
    ///
    /// Returns the current account without prompting if already connected.
    pub async fn connect(&self) -> Result<Address, WalletError> {
        let _guard = self.shared.connect_lock.lock().await;

        if let Some(account) = self.account() {
            return Ok(account);
        }

        let Some(wallet) = self.shared.wallet.clone() else {
            tracing::warn!("connect: no wallet available");
            self.shared.session.write().fail(WalletError::Unavailable);
            self.shared.bus.invalidate(Invalidation::SessionChanged);
            return Err(WalletError::Unavailable);
        };

        let generation = {
            let mut session = self.shared.session.write();
            session.begin_connect();
            session.generation()
        };
        tracing::info!("Connecting wallet");

        let result = request_accounts(wallet.as_ref()).await;

        {
            let mut session = self.shared.session.write();
            if session.generation() != generation {
                // Something else (disconnect, a wallet event) moved the session on.
                return match session.account() {
                    Some(account) => Ok(account),
                    None => {
                        tracing::info!("Connection attempt superseded");
                        Err(WalletError::RequestFailed(
                            "connection attempt superseded".to_string(),
                        ))
                    }
                };
            }

            match &result {
                Ok(account) => session.establish(wallet.clone(), *account),
                Err(err) => session.fail(err.clone()),
            }
        }

        match result {
            Ok(account) => {
                self.ensure_listener(&wallet);
                tracing::info!(%account, "Wallet connected");
                self.shared.bus.invalidate(Invalidation::SessionChanged);
                self.shared.bus.invalidate(Invalidation::AccountChanged {
                    account: Some(account),
                });
                Ok(account)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Wallet connection failed");
                self.shared.bus.invalidate(Invalidation::SessionChanged);
                Err(err)
            }
        }
    }

    /// Clear the session and deregister the wallet listener. Always safe.
    pub fn disconnect(&self) {
        let changed = {
            let mut session = self.shared.session.write();
            let changed = session.account().is_some()
                || session.is_connecting()
                || session.connection_error().is_some();
            session.clear();
            changed
        };
        self.remove_listener();

        if changed {
            tracing::info!("Wallet disconnected");
            self.shared.bus.invalidate(Invalidation::SessionChanged);
            self.shared
                .bus
                .invalidate(Invalidation::AccountChanged { account: None });
        }
    }

    /// Silent startup probe: if the wallet already authorized this site,
    /// connect without prompting. Failures are logged and returned, never
    /// recorded into the session.
    pub async fn restore(&self) -> Result<Option<Address>, WalletError> {
        let Some(wallet) = self.shared.wallet.clone() else {
            return Ok(None);
        };
        let _guard = self.shared.connect_lock.lock().await;

        if let Some(account) = self.account() {
            return Ok(Some(account));
        }

        let generation = self.generation();
        let accounts = match wallet.request(methods::ACCOUNTS, json!([])).await {
            Ok(value) => parse_accounts(value),
            Err(e) => Err(e),
        };
        let accounts = match accounts {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!(error = %e, "Session restore probe failed");
                return Err(e.into());
            }
        };

        let Some(&account) = accounts.first() else {
            tracing::debug!("No previously authorized account");
            return Ok(None);
        };

        {
            let mut session = self.shared.session.write();
            if session.generation() != generation {
                return Ok(session.account());
            }
            session.establish(wallet.clone(), account);
        }
        self.ensure_listener(&wallet);
        tracing::info!(%account, "Wallet session restored");
        self.shared.bus.invalidate(Invalidation::SessionChanged);
        self.shared.bus.invalidate(Invalidation::AccountChanged {
            account: Some(account),
        });
        Ok(Some(account))
    }

    /// Apply a wallet event. Called by the registered listener; hosts that
    /// pump events themselves may call it directly.
    pub fn handle_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => self.on_accounts_changed(accounts),
            WalletEvent::ChainChanged(chain_id) => self.on_chain_changed(chain_id),
        }
    }

    fn on_accounts_changed(&self, accounts: Vec<Address>) {
        match accounts.first().copied() {
            Some(first) => {
                let Some(wallet) = self.shared.wallet.clone() else {
                    tracing::warn!("accountsChanged received without a wallet");
                    return;
                };
                {
                    let mut session = self.shared.session.write();
                    if session.account() == Some(first) {
                        return;
                    }
                    session.establish(wallet, first);
                }
                tracing::info!(account = %first, "Active account changed");
                self.shared.bus.invalidate(Invalidation::SessionChanged);
                self.shared.bus.invalidate(Invalidation::AccountChanged {
                    account: Some(first),
                });
            }
            None => {
                {
                    let mut session = self.shared.session.write();
                    if session.account().is_none() && session.provider().is_none() {
                        return;
                    }
                    session.clear();
                }
                // The listener stays: a later non-empty notification reconnects.
                tracing::info!("Wallet reported no authorized accounts");
                self.shared.bus.invalidate(Invalidation::SessionChanged);
                self.shared
                    .bus
                    .invalidate(Invalidation::AccountChanged { account: None });
            }
        }
    }

    fn on_chain_changed(&self, chain_id: String) {
        self.shared.session.write().clear();
        self.remove_listener();
        tracing::info!(%chain_id, "Chain changed, session reset");
        self.shared.bus.invalidate(Invalidation::SessionChanged);
        self.shared
            .bus
            .invalidate(Invalidation::ChainChanged { chain_id });
    }

    // ── Listener bookkeeping ─────────────────────────────────────────────

    /// Register the session's wallet listener unless one is already active.
    fn ensure_listener(&self, wallet: &Arc<dyn WalletTransport>) {
        let mut slot = self.shared.listener.lock();
        if slot.is_some() {
            return;
        }
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let handler: WalletEventHandler = Arc::new(move |event| {
            if let Some(shared) = weak.upgrade() {
                SessionManager { shared }.handle_event(event);
            }
        });
        let id = wallet.add_listener(handler);
        tracing::debug!(listener = id.0, "Wallet listener registered");
        *slot = Some(id);
    }

    fn remove_listener(&self) {
        let Some(id) = self.shared.listener.lock().take() else {
            return;
        };
        if let Some(wallet) = &self.shared.wallet {
            if !wallet.remove_listener(id) {
                tracing::warn!(listener = id.0, "Wallet listener was already gone");
            }
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let (Some(wallet), Some(id)) = (&self.wallet, self.listener.get_mut().take()) {
            wallet.remove_listener(id);
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &*self.shared.session.read())
            .field("has_wallet", &self.has_wallet())
            .finish()
    }
}

/// `wallet_requestPermissions` then `eth_requestAccounts`; first account wins.
async fn request_accounts(wallet: &dyn WalletTransport) -> Result<Address, WalletError> {
    match wallet
        .request(
            methods::REQUEST_PERMISSIONS,
            json!([{ "eth_accounts": {} }]),
        )
        .await
    {
        Ok(_) => {}
        Err(RpcError::Response { code, .. }) if code == METHOD_NOT_FOUND => {
            tracing::debug!("Wallet does not support wallet_requestPermissions");
        }
        Err(e) => return Err(e.into()),
    }

    let value = wallet.request(methods::REQUEST_ACCOUNTS, json!([])).await?;
    let accounts = parse_accounts(value)?;
    accounts
        .first()
        .copied()
        .ok_or_else(|| WalletError::RequestFailed("wallet returned no accounts".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryWallet;
    use alloy_primitives::address;

    const AAA: Address = address!("0000000000000000000000000000000000000aaa");
    const BBB: Address = address!("0000000000000000000000000000000000000bbb");
    const CCC: Address = address!("0000000000000000000000000000000000000ccc");

    fn manager(wallet: &MemoryWallet) -> SessionManager {
        SessionManager::new(
            Some(Arc::new(wallet.clone())),
            Arc::new(MemoryWallet::default()),
            InvalidationBus::new(),
            ConfirmationConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_connect_takes_first_account_and_derives_signer() {
        let wallet = MemoryWallet::new(vec![BBB, CCC]);
        let session = manager(&wallet);

        assert_eq!(session.connect().await.unwrap(), BBB);
        assert_eq!(session.state(), SessionState::Connected(BBB));
        assert_eq!(session.signing_handle().map(|s| s.account()), Some(BBB));
        assert!(session.read_only_handle().is_wallet());
        assert_eq!(wallet.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let wallet = MemoryWallet::new(vec![AAA]);
        let session = manager(&wallet);
        session.connect().await.unwrap();
        session.connect().await.unwrap();
        assert_eq!(wallet.request_count(methods::REQUEST_ACCOUNTS), 1);
        assert_eq!(wallet.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_without_wallet_is_unavailable() {
        let session = SessionManager::new(
            None,
            Arc::new(MemoryWallet::default()),
            InvalidationBus::new(),
            ConfirmationConfig::default(),
        );
        assert_eq!(session.connect().await, Err(WalletError::Unavailable));
        assert_eq!(session.state(), SessionState::Error(WalletError::Unavailable));
        assert!(!session.read_only_handle().is_wallet());
    }

    #[tokio::test]
    async fn test_rejection_is_recorded() {
        let wallet = MemoryWallet::new(vec![AAA]);
        wallet.reject_next(methods::REQUEST_PERMISSIONS);
        let session = manager(&wallet);
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, WalletError::UserRejected(_)));
        assert_eq!(session.session().connection_error(), Some(&err));
        assert!(session.signing_handle().is_none());
        assert_eq!(wallet.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_grant_is_request_failed() {
        let wallet = MemoryWallet::new(vec![]);
        let session = manager(&wallet);
        assert!(matches!(
            session.connect().await,
            Err(WalletError::RequestFailed(_))
        ));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_missing_permissions_method_is_tolerated() {
        let wallet = MemoryWallet::new(vec![AAA]);
        wallet.fail_next(
            methods::REQUEST_PERMISSIONS,
            RpcError::Response {
                code: METHOD_NOT_FOUND,
                message: "not supported".into(),
                data: None,
            },
        );
        let session = manager(&wallet);
        assert_eq!(session.connect().await.unwrap(), AAA);
    }

    #[tokio::test]
    async fn test_accounts_changed_sequence() {
        let wallet = MemoryWallet::new(vec![AAA]);
        let session = manager(&wallet);
        session.connect().await.unwrap();

        wallet.emit_accounts_changed(vec![AAA]);
        assert_eq!(session.state(), SessionState::Connected(AAA));

        wallet.emit_accounts_changed(vec![BBB, CCC]);
        assert_eq!(session.state(), SessionState::Connected(BBB));
        assert_eq!(session.signing_handle().map(|s| s.account()), Some(BBB));

        wallet.emit_accounts_changed(vec![]);
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.signing_handle().is_none());
        assert_eq!(wallet.listener_count(), 1);

        wallet.emit_accounts_changed(vec![CCC]);
        assert_eq!(session.account(), Some(CCC));
    }

    #[tokio::test]
    async fn test_same_account_notification_keeps_generation() {
        let wallet = MemoryWallet::new(vec![AAA]);
        let session = manager(&wallet);
        session.connect().await.unwrap();
        let generation = session.generation();
        wallet.emit_accounts_changed(vec![AAA, BBB]);
        assert!(session.is_current(generation));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent_and_removes_listener() {
        let wallet = MemoryWallet::new(vec![AAA]);
        let session = manager(&wallet);
        session.connect().await.unwrap();

        session.disconnect();
        let after_first = session.session();
        session.disconnect();
        let after_second = session.session();

        assert_eq!(after_first.state(), after_second.state());
        assert!(after_second.provider().is_none());
        assert_eq!(wallet.listener_count(), 0);
        assert!(!session.listener_registered());
    }

    #[tokio::test]
    async fn test_chain_change_resets_and_removes_listener() {
        let wallet = MemoryWallet::new(vec![AAA]);
        let session = manager(&wallet);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        session
            .invalidation_bus()
            .subscribe(move |r| sink.lock().push(r.clone()));

        session.connect().await.unwrap();
        wallet.emit_chain_changed("0x1");

        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(wallet.listener_count(), 0);
        assert!(seen.lock().contains(&Invalidation::ChainChanged {
            chain_id: "0x1".into()
        }));
    }

    #[tokio::test]
    async fn test_restore_uses_authorized_accounts_silently() {
        let wallet = MemoryWallet::authorized(vec![AAA]);
        let session = manager(&wallet);
        assert_eq!(session.restore().await.unwrap(), Some(AAA));
        assert_eq!(wallet.request_count(methods::REQUEST_ACCOUNTS), 0);
        assert_eq!(wallet.request_count(methods::REQUEST_PERMISSIONS), 0);
        assert_eq!(wallet.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_restore_failure_is_not_recorded() {
        let wallet = MemoryWallet::authorized(vec![AAA]);
        wallet.fail_next(
            methods::ACCOUNTS,
            RpcError::Response {
                code: -32603,
                message: "internal".into(),
                data: None,
            },
        );
        let session = manager(&wallet);
        assert!(session.restore().await.is_err());
        assert!(session.session().connection_error().is_none());
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_restore_with_nothing_authorized() {
        let wallet = MemoryWallet::new(vec![AAA]);
        let session = manager(&wallet);
        assert_eq!(session.restore().await.unwrap(), None);
        assert_eq!(wallet.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_manager_releases_listener() {
        let wallet = MemoryWallet::new(vec![AAA]);
        {
            let session = manager(&wallet);
            session.connect().await.unwrap();
            assert_eq!(wallet.listener_count(), 1);
        }
        assert_eq!(wallet.listener_count(), 0);
    }
}
