//! End-to-end marketplace flows through the public API.
//!
//! A `MemoryWallet` plays wallet and node; a small stub answers the view
//! functions of the three contracts so the view models can load state,
//! submit writes and observe invalidations.
//!
//! Run with:
//! ```bash
//! cargo test -p agrimarket-sdk --test contract_flows
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolInterface, SolValue};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde_json::{json, Value};

use agrimarket_sdk::contracts::{IEscrow, IMarketplace, IUtilityToken};
use agrimarket_sdk::prelude::*;
use agrimarket_sdk::transport::methods;

const FARMER: Address = address!("000000000000000000000000000000000000fa51");
const BUYER: Address = address!("000000000000000000000000000000000000b0b0");

fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u64.pow(18))
}

#[derive(Default)]
struct Contracts {
    products: Vec<IMarketplace::Product>,
    escrows: HashMap<U256, IEscrow::EscrowDetails>,
    balances: HashMap<Address, U256>,
}

/// Answers `eth_call` for the default deployment.
#[derive(Clone, Default)]
struct ChainStub {
    state: Arc<Mutex<Contracts>>,
}

impl ChainStub {
    fn install(&self, wallet: &MemoryWallet) {
        let stub = self.clone();
        wallet.on_method(methods::CALL, move |params| stub.answer(params));
    }

    fn answer(&self, params: &Value) -> Result<Value, RpcError> {
        let bad = |e: String| RpcError::InvalidResponse(e);
        let to: Address =
            serde_json::from_value(params[0]["to"].clone()).map_err(|e| bad(e.to_string()))?;
        let data: Bytes =
            serde_json::from_value(params[0]["data"].clone()).map_err(|e| bad(e.to_string()))?;
        let addresses = ContractAddresses::default();
        let state = self.state.lock();

        let encoded = if to == addresses.marketplace {
            match IMarketplace::IMarketplaceCalls::abi_decode(&data)
                .map_err(|e| bad(e.to_string()))?
            {
                IMarketplace::IMarketplaceCalls::getActiveProducts(_) => {
                    state.products.abi_encode()
                }
                IMarketplace::IMarketplaceCalls::getOrdersForProduct(_) => {
                    Vec::<IMarketplace::Order>::new().abi_encode()
                }
                _ => return Err(bad("not a view".into())),
            }
        } else if to == addresses.escrow {
            match IEscrow::IEscrowCalls::abi_decode(&data).map_err(|e| bad(e.to_string()))? {
                IEscrow::IEscrowCalls::getEscrowDetails(call) => {
                    match state.escrows.get(&call.orderId) {
                        Some(details) => details.abi_encode(),
                        None => {
                            return Err(RpcError::Response {
                                code: 3,
                                message: "execution reverted: Escrow does not exist".into(),
                                data: None,
                            })
                        }
                    }
                }
                IEscrow::IEscrowCalls::isDisputed(_) | IEscrow::IEscrowCalls::canRefund(_) => {
                    false.abi_encode()
                }
                _ => return Err(bad("not a view".into())),
            }
        } else if to == addresses.token {
            match IUtilityToken::IUtilityTokenCalls::abi_decode(&data)
                .map_err(|e| bad(e.to_string()))?
            {
                IUtilityToken::IUtilityTokenCalls::balanceOf(call) => state
                    .balances
                    .get(&call.owner)
                    .copied()
                    .unwrap_or_default()
                    .abi_encode(),
                _ => return Err(bad("not a view".into())),
            }
        } else {
            return Err(bad(format!("no contract at {to}")));
        };

        Ok(json!(Bytes::from(encoded)))
    }
}

fn listing(id: u64, quantity: u64) -> IMarketplace::Product {
    IMarketplace::Product {
        id: U256::from(id),
        farmer: FARMER,
        name: "Sweet Potatoes".into(),
        description: "Orange flesh".into(),
        category: "Vegetables".into(),
        unit: "kg".into(),
        price: tokens(2),
        quantity: U256::from(quantity),
        imageHash: String::new(),
        location: "Kisumu".into(),
        harvestDate: U256::from(1_767_225_600u64),
        isOrganic: false,
        isActive: true,
    }
}

fn setup(account: Address) -> (MemoryWallet, ChainStub, AgrimarketClient) {
    let wallet = MemoryWallet::new(vec![account]);
    let stub = ChainStub::default();
    stub.install(&wallet);
    let client = AgrimarketClient::builder()
        .wallet(Arc::new(wallet.clone()))
        .read_transport(Arc::new(wallet.clone()))
        .confirmation(ConfirmationConfig {
            poll_interval: Duration::from_millis(1),
            max_polls: 10,
        })
        .build()
        .expect("client should build");
    (wallet, stub, client)
}

fn last_calldata(wallet: &MemoryWallet) -> Bytes {
    let (_, params) = wallet
        .requests()
        .into_iter()
        .filter(|(method, _)| method == methods::SEND_TRANSACTION)
        .last()
        .expect("a transaction was sent");
    serde_json::from_value(params[0]["data"].clone()).expect("calldata")
}

fn record(client: &AgrimarketClient) -> Arc<Mutex<Vec<Invalidation>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client
        .invalidation_bus()
        .subscribe(move |reason: &Invalidation| sink.lock().push(reason.clone()));
    seen
}

#[tokio::test]
async fn farmer_lists_a_product() {
    let (wallet, _stub, client) = setup(FARMER);
    let seen = record(&client);
    client.session().connect().await.expect("connect");

    let mut view = ProductCreateView::new();
    view.form = NewProductForm {
        name: "Sweet Potatoes".into(),
        description: "Orange flesh".into(),
        price_per_unit: "2.5".into(),
        initial_quantity: "40".into(),
        location: "Kisumu".into(),
        harvest_date: "2026-11-02".into(),
        ..NewProductForm::default()
    };
    let today = NaiveDate::from_ymd_opt(2026, 10, 16).expect("date");

    let receipt = view.submit_on(&client, today).await.expect("create");

    assert!(receipt.succeeded());
    assert_eq!(view.success(), Some("Product created successfully!"));
    assert_eq!(view.form, NewProductForm::default());

    let call = IMarketplace::createProductCall::abi_decode(&last_calldata(&wallet)).unwrap();
    assert_eq!(call.pricePerUnit, tokens(5) / U256::from(2));
    assert_eq!(call.quantity, U256::from(40));
    assert_eq!(call.category, "Vegetables");
    assert!(seen.lock().contains(&Invalidation::ProductsChanged));
}

#[tokio::test]
async fn buyer_orders_from_the_marketplace() {
    let (wallet, stub, client) = setup(BUYER);
    stub.state.lock().products = vec![listing(1, 25), listing(2, 4)];
    let seen = record(&client);

    let mut market = MarketplaceView::new();
    market.refresh(&client).await;
    assert_eq!(market.products().len(), 2);
    assert!(market.error().is_none());

    client.session().connect().await.expect("connect");
    market.open_order(ProductId::from(1u64));
    assert_eq!(market.order_form.price, "2");
    market.order_form.amount = "5".into();
    assert!(market.can_place_order());

    market.place_order(&client).await.expect("order");

    assert!(market.selected_product().is_none());
    assert!(market.is_stale());
    assert_eq!(market.product(ProductId::from(1u64)).unwrap().quantity, 20);

    let call = IMarketplace::createOrderCall::abi_decode(&last_calldata(&wallet)).unwrap();
    assert_eq!(call.productId, U256::from(1));
    assert_eq!(call.amount, U256::from(5));
    assert_eq!(call.price, tokens(2));
    assert!(seen.lock().contains(&Invalidation::OrdersChanged));
}

#[tokio::test]
async fn reverted_order_restores_quantity() {
    let (wallet, stub, client) = setup(BUYER);
    stub.state.lock().products = vec![listing(1, 25)];
    client.session().connect().await.expect("connect");

    let mut market = MarketplaceView::new();
    market.refresh(&client).await;
    market.open_order(ProductId::from(1u64));
    market.order_form.amount = "3".into();
    wallet.revert_next_transaction();

    let err = market.place_order(&client).await.unwrap_err();

    assert!(err.is_revert());
    assert_eq!(market.product(ProductId::from(1u64)).unwrap().quantity, 25);
    assert!(market.error().is_some());
}

#[tokio::test]
async fn escrow_lookup_works_without_a_wallet() {
    let (_wallet, stub, client) = setup(BUYER);
    stub.state.lock().escrows.insert(
        U256::from(9),
        IEscrow::EscrowDetails {
            orderId: U256::from(9),
            buyer: BUYER,
            seller: FARMER,
            amount: tokens(10),
            isReleased: false,
            isRefunded: false,
            createdAt: U256::from(1_767_300_000u64),
        },
    );

    let mut lookup = EscrowLookupView::new();
    lookup.search(&client).await;
    assert_eq!(lookup.error(), Some("Please enter an order ID"));

    lookup.order_id = "9".into();
    lookup.search(&client).await;
    let escrow = lookup.escrow().expect("escrow loaded");
    assert_eq!(escrow.status, EscrowStatus::Held);
    assert_eq!(escrow.dispute_label(), "No Dispute");

    lookup.order_id = "10".into();
    lookup.search(&client).await;
    assert!(lookup.escrow().is_none());
    assert!(lookup
        .error()
        .unwrap()
        .starts_with("Failed to fetch escrow: "));
}

#[tokio::test]
async fn minting_refreshes_the_balance() {
    let (wallet, stub, client) = setup(BUYER);
    client.session().connect().await.expect("connect");
    let mut view = TokenView::new();
    view.refresh(&client).await;
    assert_eq!(view.balance_label(), "0.00");

    view.mint_form.amount = "12.5".into();
    stub.state.lock().balances.insert(BUYER, tokens(25) / U256::from(2));
    view.mint(&client).await.expect("mint");

    assert!(view.minted());
    assert_eq!(view.balance_label(), "12.50");
    let call = IUtilityToken::mintCall::abi_decode(&last_calldata(&wallet)).unwrap();
    assert_eq!(call.to, BUYER);
    assert_eq!(call.amount, tokens(25) / U256::from(2));
}

#[tokio::test]
async fn account_switch_mid_load_marks_view_stale() {
    let (wallet, stub, client) = setup(BUYER);
    stub.state.lock().products = vec![listing(1, 25)];
    client.session().connect().await.expect("connect");

    // Switch accounts while the product list is in flight.
    let switcher = wallet.clone();
    let inner = stub.clone();
    wallet.on_method(methods::CALL, move |params| {
        switcher.emit_accounts_changed(vec![FARMER]);
        inner.answer(params)
    });

    let mut market = MarketplaceView::new();
    market.refresh(&client).await;

    assert!(market.is_stale());
    assert!(market.products().is_empty());
    assert_eq!(client.session().account(), Some(FARMER));
}

#[tokio::test]
async fn account_switch_while_order_confirms_leaves_form_alone() {
    let (wallet, stub, client) = setup(BUYER);
    stub.state.lock().products = vec![listing(1, 25)];
    client.session().connect().await.expect("connect");

    let mut market = MarketplaceView::new();
    market.refresh(&client).await;
    market.open_order(ProductId::from(1u64));
    market.order_form.amount = "5".into();

    // The account changes while the receipt is being fetched.
    let switcher = wallet.clone();
    wallet.on_method(methods::GET_TRANSACTION_RECEIPT, move |params| {
        switcher.emit_accounts_changed(vec![FARMER]);
        Ok(json!({
            "transactionHash": params[0].clone(),
            "blockNumber": "0x10",
            "status": "0x1",
        }))
    });

    market.place_order(&client).await.expect("order confirms");

    assert!(market.is_stale());
    assert!(market.selected_product().is_some());
    assert!(market.error().is_none());
    assert_eq!(client.session().account(), Some(FARMER));
}

#[tokio::test]
async fn order_progress_is_visible_before_confirmation() {
    let (_wallet, stub, client) = setup(BUYER);
    stub.state.lock().products = vec![listing(1, 25)];
    client.session().connect().await.expect("connect");

    let mut market = MarketplaceView::new();
    market.refresh(&client).await;
    market.open_order(ProductId::from(1u64));
    market.order_form.amount = "5".into();

    let submitted = market.begin_order(&client).await.expect("submitted");
    assert_eq!(
        market.order_action(),
        &ActionState::AwaitingConfirmation(submitted.tx_hash())
    );
    assert!(market.loading().ordering);

    market.finish_order(&client, submitted).await.expect("confirmed");
    assert!(matches!(market.order_action(), ActionState::Confirmed(_)));
}
