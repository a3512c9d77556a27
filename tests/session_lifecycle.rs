//! Integration tests for the wallet session lifecycle.
//!
//! Drive `SessionManager` through `AgrimarketClient` against an in-memory
//! wallet: prompt connect, silent restore, wallet events, disconnect.
//!
//! Run with:
//! ```bash
//! cargo test -p agrimarket-sdk --test session_lifecycle
//! ```

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address};
use parking_lot::Mutex;

use agrimarket_sdk::prelude::*;
use agrimarket_sdk::transport::methods;

const ALICE: Address = address!("00000000000000000000000000000000000000aa");
const BOB: Address = address!("00000000000000000000000000000000000000bb");

fn client_for(wallet: &MemoryWallet) -> AgrimarketClient {
    AgrimarketClient::builder()
        .wallet(Arc::new(wallet.clone()))
        .read_transport(Arc::new(wallet.clone()))
        .confirmation(ConfirmationConfig {
            poll_interval: Duration::from_millis(1),
            max_polls: 5,
        })
        .build()
        .expect("client should build")
}

/// Every invalidation published on the client's bus, in order.
fn record(client: &AgrimarketClient) -> Arc<Mutex<Vec<Invalidation>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client
        .invalidation_bus()
        .subscribe(move |reason: &Invalidation| sink.lock().push(reason.clone()));
    seen
}

#[tokio::test]
async fn connect_then_disconnect() {
    let wallet = MemoryWallet::new(vec![ALICE, BOB]);
    let client = client_for(&wallet);
    let seen = record(&client);

    assert_eq!(client.session().state(), SessionState::Disconnected);

    let account = client.session().connect().await.expect("connect");
    assert_eq!(account, ALICE, "first granted account wins");
    assert_eq!(client.session().state(), SessionState::Connected(ALICE));
    assert!(client.session().listener_registered());
    assert_eq!(wallet.listener_count(), 1);

    client.session().disconnect();
    assert_eq!(client.session().account(), None);
    assert!(!client.session().listener_registered());
    assert_eq!(wallet.listener_count(), 0);

    let seen = seen.lock();
    assert!(seen.contains(&Invalidation::AccountChanged {
        account: Some(ALICE)
    }));
    assert_eq!(
        seen.last(),
        Some(&Invalidation::AccountChanged { account: None })
    );
}

#[tokio::test]
async fn connect_is_idempotent() {
    let wallet = MemoryWallet::new(vec![ALICE]);
    let client = client_for(&wallet);

    client.session().connect().await.expect("first connect");
    let generation = client.session().generation();
    let prompts = wallet.request_count(methods::REQUEST_ACCOUNTS);

    let again = client.session().connect().await.expect("second connect");

    assert_eq!(again, ALICE);
    assert_eq!(client.session().generation(), generation);
    assert_eq!(wallet.request_count(methods::REQUEST_ACCOUNTS), prompts);
    assert_eq!(wallet.listener_count(), 1);
}

#[tokio::test]
async fn rejected_prompt_is_recorded() {
    let wallet = MemoryWallet::new(vec![ALICE]);
    let client = client_for(&wallet);
    wallet.reject_next(methods::REQUEST_PERMISSIONS);

    let err = client.session().connect().await.unwrap_err();

    assert!(matches!(err, WalletError::UserRejected(_)), "got {err:?}");
    assert!(matches!(
        client.session().state(),
        SessionState::Error(WalletError::UserRejected(_))
    ));
    assert_eq!(wallet.listener_count(), 0);

    // A retry clears the recorded error.
    client.session().connect().await.expect("retry");
    assert!(client.session().session().connection_error().is_none());
}

#[tokio::test]
async fn restore_only_uses_authorized_accounts() {
    let fresh = MemoryWallet::new(vec![ALICE]);
    let client = client_for(&fresh);
    assert_eq!(client.session().restore().await.unwrap(), None);
    assert_eq!(fresh.request_count(methods::REQUEST_ACCOUNTS), 0);
    assert!(!client.session().is_connected());

    let returning = MemoryWallet::authorized(vec![BOB]);
    let client = client_for(&returning);
    assert_eq!(client.session().restore().await.unwrap(), Some(BOB));
    assert_eq!(returning.request_count(methods::REQUEST_PERMISSIONS), 0);
    assert!(client.session().is_connected());
}

#[tokio::test]
async fn restore_without_wallet_is_a_no_op() {
    let client = AgrimarketClient::builder()
        .read_transport(Arc::new(MemoryWallet::default()))
        .build()
        .expect("client should build");

    assert_eq!(client.session().restore().await.unwrap(), None);
    assert_eq!(
        client.session().connect().await.unwrap_err(),
        WalletError::Unavailable
    );
}

#[tokio::test]
async fn account_switch_bumps_generation() {
    let wallet = MemoryWallet::new(vec![ALICE]);
    let client = client_for(&wallet);
    client.session().connect().await.expect("connect");
    let before = client.session().generation();

    wallet.emit_accounts_changed(vec![BOB, ALICE]);

    assert_eq!(client.session().account(), Some(BOB));
    assert!(!client.session().is_current(before));
    assert_eq!(wallet.listener_count(), 1);
}

#[tokio::test]
async fn empty_accounts_keeps_listener_for_reconnect() {
    let wallet = MemoryWallet::new(vec![ALICE]);
    let client = client_for(&wallet);
    client.session().connect().await.expect("connect");

    wallet.emit_accounts_changed(vec![]);
    assert!(!client.session().is_connected());
    assert_eq!(wallet.listener_count(), 1);

    wallet.emit_accounts_changed(vec![ALICE]);
    assert_eq!(client.session().account(), Some(ALICE));
}

#[tokio::test]
async fn chain_change_resets_everything() {
    let wallet = MemoryWallet::new(vec![ALICE]);
    let client = client_for(&wallet);
    let seen = record(&client);
    client.session().connect().await.expect("connect");

    wallet.emit_chain_changed("0x1");

    assert!(!client.session().is_connected());
    assert_eq!(wallet.listener_count(), 0);
    assert!(seen.lock().contains(&Invalidation::ChainChanged {
        chain_id: "0x1".to_string()
    }));
}

#[tokio::test]
async fn writes_need_a_session_reads_do_not() {
    let wallet = MemoryWallet::new(vec![ALICE]);
    wallet.on_method(methods::CALL, |_| {
        // `getActiveProducts` returning an empty array.
        Ok(serde_json::json!(format!("0x{:064x}{:064x}", 0x20, 0)))
    });
    let client = client_for(&wallet);

    let products = client.products().active().await.expect("read-only call");
    assert!(products.is_empty());

    let err = client.orders().cancel(OrderId::from(1u64)).await.unwrap_err();
    assert!(matches!(err, SdkError::Tx(TxError::WalletRequired)));
    assert_eq!(wallet.request_count(methods::SEND_TRANSACTION), 0);
}
