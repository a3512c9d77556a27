//! High-level client: `AgrimarketClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, the session and gateway, and the
//! accessor methods.

use std::sync::Arc;

use crate::contracts::ContractAddresses;
use crate::domain::escrow::client::EscrowClient;
use crate::domain::order::client::Orders;
use crate::domain::product::client::Products;
use crate::domain::token::client::Token;
use crate::error::{SdkError, TxError};
use crate::gateway::{ContractGateway, Executor};
use crate::invalidate::InvalidationBus;
use crate::session::{ConfirmationConfig, SessionManager};
use crate::transport::{RpcTransport, WalletTransport};

#[cfg(feature = "http")]
use crate::transport::retry::RetryConfig;

// Re-export sub-client types for convenience.
pub use crate::domain::escrow::client::EscrowClient as EscrowSubClient;
pub use crate::domain::order::client::Orders as OrdersClient;
pub use crate::domain::product::client::Products as ProductsClient;
pub use crate::domain::token::client::Token as TokenClient;

/// The primary entry point for the Agrimarket SDK.
///
/// Provides nested sub-client accessors for each domain:
/// `client.products()`, `client.orders()`, etc. Cloning shares the session.
#[derive(Clone)]
pub struct AgrimarketClient {
    pub(crate) session: SessionManager,
    pub(crate) gateway: ContractGateway,
}

impl AgrimarketClient {
    pub fn builder() -> AgrimarketClientBuilder {
        AgrimarketClientBuilder::default()
    }

    /// Assemble a client from parts already built by the host.
    pub fn from_parts(session: SessionManager, gateway: ContractGateway) -> Self {
        Self { session, gateway }
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn products(&self) -> Products<'_> {
        Products { client: self }
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders { client: self }
    }

    pub fn escrow(&self) -> EscrowClient<'_> {
        EscrowClient { client: self }
    }

    pub fn token(&self) -> Token<'_> {
        Token { client: self }
    }

    // ── Shared state ─────────────────────────────────────────────────────

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn gateway(&self) -> &ContractGateway {
        &self.gateway
    }

    pub fn invalidation_bus(&self) -> &InvalidationBus {
        self.session.invalidation_bus()
    }

    /// Executor for reads. Never fails: without a wallet session it reads
    /// through the fallback transport.
    pub(crate) fn reader(&self) -> Executor {
        Executor::ReadOnly(self.session.read_only_handle())
    }

    /// Executor for writes, or [`TxError::WalletRequired`] while disconnected.
    pub(crate) fn writer(&self) -> Result<Executor, TxError> {
        self.session
            .signing_handle()
            .map(Executor::Signing)
            .ok_or(TxError::WalletRequired)
    }
}

impl std::fmt::Debug for AgrimarketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgrimarketClient")
            .field("session", &self.session)
            .field("gateway", &self.gateway)
            .finish()
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct AgrimarketClientBuilder {
    rpc_url: String,
    wallet: Option<Arc<dyn WalletTransport>>,
    read_transport: Option<Arc<dyn RpcTransport>>,
    addresses: ContractAddresses,
    confirmation: ConfirmationConfig,
    bus: InvalidationBus,
    #[cfg(feature = "http")]
    retry: RetryConfig,
}

impl Default for AgrimarketClientBuilder {
    fn default() -> Self {
        Self {
            rpc_url: crate::network::DEFAULT_RPC_URL.to_string(),
            wallet: None,
            read_transport: None,
            addresses: ContractAddresses::default(),
            confirmation: ConfirmationConfig::default(),
            bus: InvalidationBus::new(),
            #[cfg(feature = "http")]
            retry: RetryConfig::idempotent(),
        }
    }
}

impl AgrimarketClientBuilder {
    /// JSON-RPC endpoint used for reads while no wallet is connected.
    pub fn rpc_url(mut self, url: &str) -> Self {
        self.rpc_url = url.to_string();
        self
    }

    /// The wallet capability. Without one, `connect` fails with
    /// `WalletError::Unavailable` and the client is read-only.
    pub fn wallet(mut self, wallet: Arc<dyn WalletTransport>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Replace the HTTP fallback with a custom read transport.
    pub fn read_transport(mut self, transport: Arc<dyn RpcTransport>) -> Self {
        self.read_transport = Some(transport);
        self
    }

    pub fn addresses(mut self, addresses: ContractAddresses) -> Self {
        self.addresses = addresses;
        self
    }

    pub fn confirmation(mut self, confirmation: ConfirmationConfig) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// Share an existing bus, e.g. one the host already subscribed to.
    pub fn invalidation_bus(mut self, bus: InvalidationBus) -> Self {
        self.bus = bus;
        self
    }

    /// Retry policy of the HTTP fallback transport.
    #[cfg(feature = "http")]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Detect the injected browser wallet (`window.ethereum`) and use it.
    /// Leaves the builder read-only when none is present.
    #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
    pub fn injected_wallet(mut self) -> Self {
        match crate::transport::injected::InjectedWallet::detect() {
            Ok(wallet) => self.wallet = Some(Arc::new(wallet)),
            Err(e) => tracing::warn!(error = %e, "no injected wallet detected"),
        }
        self
    }

    pub fn build(self) -> Result<AgrimarketClient, SdkError> {
        let fallback = match self.read_transport {
            Some(transport) => transport,
            None => self.default_read_transport()?,
        };
        let session = SessionManager::new(self.wallet, fallback, self.bus, self.confirmation);
        Ok(AgrimarketClient {
            session,
            gateway: ContractGateway::new(self.addresses, self.confirmation),
        })
    }

    #[cfg(feature = "http")]
    fn default_read_transport(&self) -> Result<Arc<dyn RpcTransport>, SdkError> {
        let http = crate::transport::http::HttpRpc::with_retry(&self.rpc_url, self.retry.clone())?;
        Ok(Arc::new(http))
    }

    #[cfg(not(feature = "http"))]
    fn default_read_transport(&self) -> Result<Arc<dyn RpcTransport>, SdkError> {
        Err(SdkError::Other(format!(
            "no read transport configured for {} (enable the `http` feature or call `read_transport`)",
            self.rpc_url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryWallet;
    use alloy_primitives::{address, Address};

    const ALICE: Address = address!("00000000000000000000000000000000000000aa");

    #[test]
    fn test_builder_defaults_to_network_addresses() {
        let client = AgrimarketClient::builder()
            .read_transport(Arc::new(MemoryWallet::default()))
            .build()
            .unwrap();
        assert_eq!(
            client.gateway().addresses().marketplace,
            crate::network::MARKETPLACE_ADDRESS
        );
        assert!(!client.session().has_wallet());
    }

    #[test]
    fn test_writer_requires_connected_session() {
        let wallet = MemoryWallet::new(vec![ALICE]);
        let client = AgrimarketClient::builder()
            .wallet(Arc::new(wallet.clone()))
            .read_transport(Arc::new(wallet))
            .build()
            .unwrap();

        assert_eq!(client.writer().unwrap_err(), TxError::WalletRequired);
        assert!(!client.reader().can_sign());

        tokio_test::block_on(client.session().connect()).unwrap();
        let writer = client.writer().unwrap();
        assert_eq!(writer.account(), Some(ALICE));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_build_with_http_fallback() {
        let client = AgrimarketClient::builder()
            .rpc_url("http://localhost:8545")
            .build();
        assert!(client.is_ok());
    }
}
