//! # Agrimarket SDK
//!
//! Rust SDK for the Agrimarket farm marketplace: wallet sessions, a contract
//! gateway for the marketplace, escrow and utility-token contracts, and the
//! view models a front end drives. Supports native and WASM targets.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core**: Shared ids and units, errors, network constants, `sol!` bindings
//! 2. **Transport**: `RpcTransport` / `WalletTransport` seams: HTTP, injected EIP-1193, in-memory
//! 3. **Session**: `SessionManager` owning the connection lifecycle and generation counter
//! 4. **Gateway**: Contract handles bound to a signer or a read-only provider
//! 5. **High-Level Client**: `AgrimarketClient` with sub-clients, invalidation bus and view models
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agrimarket_sdk::prelude::*;
//!
//! let client = AgrimarketClient::builder()
//!     .rpc_url(DEFAULT_RPC_URL)
//!     .injected_wallet()
//!     .build()?;
//!
//! client.session().restore().await?;
//! let products = client.products().active().await?;
//!
//! let mut market = MarketplaceView::new();
//! market.refresh(&client).await;
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes and unit conversions.
pub mod shared;

/// Unified SDK error types.
pub mod error;

/// Network and deployment constants.
pub mod network;

/// `sol!` bindings and deployed addresses for the three contracts.
pub mod contracts;

// ── Layer 2: Transport ───────────────────────────────────────────────────────

/// JSON-RPC transports and wallet providers.
pub mod transport;

// ── Layer 3: Session ─────────────────────────────────────────────────────────

/// Wallet session lifecycle, signer and provider handles.
pub mod session;

// ── Layer 4: Gateway ─────────────────────────────────────────────────────────

/// Contract handles bound to the current executor.
pub mod gateway;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// Cache-invalidation notifications published after confirmed writes.
pub mod invalidate;

/// Per-action progress and error state for view models.
pub mod action;

/// Domain modules (vertical slices): types, conversions, forms, state.
pub mod domain;

/// `AgrimarketClient`: the primary entry point.
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{OrderId, ProductId};

    // Domain types: product
    pub use crate::domain::product::{
        MarketplaceView, NewProduct, NewProductForm, Product, ProductCreateView, ProductUpdate,
        ProductUpdateForm,
    };

    // Domain types: order
    pub use crate::domain::order::{BuyerOrdersView, Order, OrderForm, OrderRequest, OrderStatus};

    // Domain types: escrow
    pub use crate::domain::escrow::{
        Escrow, EscrowForm, EscrowLookupView, EscrowRequest, EscrowStatus, EscrowView,
    };

    // Domain types: token
    pub use crate::domain::token::{MintForm, TokenBalance, TokenView};

    // Errors
    pub use crate::action::{ActionError, ActionState, Submitted};
    pub use crate::domain::{FormError, ValidationError};
    pub use crate::error::{RpcError, SdkError, TxError, WalletError};

    // Network
    pub use crate::contracts::ContractAddresses;
    pub use crate::network::{DEFAULT_CHAIN_ID, DEFAULT_RPC_URL};

    // Session + gateway
    pub use crate::gateway::{ContractGateway, Executor};
    pub use crate::invalidate::{Invalidation, InvalidationBus};
    pub use crate::session::{
        ConfirmationConfig, PendingTransaction, Session, SessionManager, SessionState,
        TransactionReceipt,
    };

    // Transports
    pub use crate::transport::memory::MemoryWallet;
    pub use crate::transport::{RpcTransport, WalletEvent, WalletTransport};
    #[cfg(feature = "http")]
    pub use crate::transport::http::HttpRpc;
    #[cfg(feature = "http")]
    pub use crate::transport::retry::{RetryConfig, RetryPolicy};

    // Client + sub-clients
    pub use crate::client::{
        AgrimarketClient, AgrimarketClientBuilder, EscrowSubClient, OrdersClient, ProductsClient,
        TokenClient,
    };
}
