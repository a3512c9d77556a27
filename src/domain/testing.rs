//! Fixtures shared by the domain unit tests: wire structs and a fake chain
//! answering `eth_call` on a `MemoryWallet`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::{SolInterface, SolValue};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::client::AgrimarketClient;
use crate::contracts::{ContractAddresses, IEscrow, IMarketplace, IUtilityToken};
use crate::error::RpcError;
use crate::session::ConfirmationConfig;
use crate::transport::memory::MemoryWallet;
use crate::transport::methods;

pub(crate) const FARMER: Address = address!("000000000000000000000000000000000000fa51");
pub(crate) const BUYER: Address = address!("000000000000000000000000000000000000b0b0");

/// `whole` tokens in base units.
pub(crate) fn tokens(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10u8).pow(U256::from(18u8))
}

pub(crate) fn wire_product(id: u64, quantity: u64) -> IMarketplace::Product {
    IMarketplace::Product {
        id: U256::from(id),
        farmer: FARMER,
        name: "Heirloom Tomatoes".to_string(),
        description: "Vine ripened".to_string(),
        category: "Vegetables".to_string(),
        unit: "kg".to_string(),
        price: U256::from(120_000_000_000_000_000u64),
        quantity: U256::from(quantity),
        imageHash: String::new(),
        location: "Nakuru".to_string(),
        harvestDate: U256::from(1_767_225_600u64),
        isOrganic: true,
        isActive: true,
    }
}

pub(crate) fn wire_order(id: u64, product_id: u64, buyer: Address, amount: u64) -> IMarketplace::Order {
    IMarketplace::Order {
        id: U256::from(id),
        productId: U256::from(product_id),
        farmer: FARMER,
        buyer,
        amount: U256::from(amount),
        price: U256::from(120_000_000_000_000_000u64),
        escrowId: U256::from(id),
        isCompleted: false,
        isCancelled: false,
        createdAt: U256::from(1_767_300_000u64),
        expiryTime: U256::ZERO,
    }
}

pub(crate) fn wire_escrow(order_id: u64, amount: U256) -> IEscrow::EscrowDetails {
    IEscrow::EscrowDetails {
        orderId: U256::from(order_id),
        buyer: BUYER,
        seller: FARMER,
        amount,
        isReleased: false,
        isRefunded: false,
        createdAt: U256::from(1_767_300_000u64),
    }
}

pub(crate) fn fast_confirmation() -> ConfirmationConfig {
    ConfirmationConfig {
        poll_interval: Duration::from_millis(1),
        max_polls: 5,
    }
}

/// A client whose wallet and read transport are both `wallet`.
pub(crate) fn client_with(wallet: &MemoryWallet) -> AgrimarketClient {
    AgrimarketClient::builder()
        .wallet(Arc::new(wallet.clone()))
        .read_transport(Arc::new(wallet.clone()))
        .confirmation(fast_confirmation())
        .build()
        .unwrap()
}

/// Calldata of every recorded `eth_sendTransaction`, in order.
pub(crate) fn sent_calldata(wallet: &MemoryWallet) -> Vec<Bytes> {
    wallet
        .requests()
        .into_iter()
        .filter(|(method, _)| method == methods::SEND_TRANSACTION)
        .map(|(_, params)| serde_json::from_value(params[0]["data"].clone()).unwrap())
        .collect()
}

// ─── Fake chain ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct Chain {
    products: Vec<IMarketplace::Product>,
    orders: HashMap<U256, Vec<IMarketplace::Order>>,
    escrows: HashMap<U256, IEscrow::EscrowDetails>,
    disputed: HashSet<U256>,
    refundable: HashSet<U256>,
    balances: HashMap<Address, U256>,
}

/// Contract state served to `eth_call`, dispatched on the target address.
#[derive(Clone, Default)]
pub(crate) struct FakeChain {
    chain: Arc<Mutex<Chain>>,
}

impl FakeChain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_products(self, products: Vec<IMarketplace::Product>) -> Self {
        self.chain.lock().products = products;
        self
    }

    pub(crate) fn set_products(&self, products: Vec<IMarketplace::Product>) {
        self.chain.lock().products = products;
    }

    pub(crate) fn add_order(&self, order: IMarketplace::Order) {
        self.chain
            .lock()
            .orders
            .entry(order.productId)
            .or_default()
            .push(order);
    }

    pub(crate) fn add_escrow(&self, details: IEscrow::EscrowDetails) {
        self.chain.lock().escrows.insert(details.orderId, details);
    }

    pub(crate) fn set_disputed(&self, order_id: u64) {
        self.chain.lock().disputed.insert(U256::from(order_id));
    }

    pub(crate) fn set_refundable(&self, order_id: u64) {
        self.chain.lock().refundable.insert(U256::from(order_id));
    }

    pub(crate) fn set_balance(&self, owner: Address, balance: U256) {
        self.chain.lock().balances.insert(owner, balance);
    }

    /// Answer `eth_call` on `wallet` from this chain.
    pub(crate) fn install(&self, wallet: &MemoryWallet) {
        let chain = self.clone();
        wallet.on_method(methods::CALL, move |params| chain.answer(params));
    }

    pub(crate) fn answer(&self, params: &Value) -> Result<Value, RpcError> {
        let invalid = |e: &dyn std::fmt::Display| RpcError::InvalidResponse(e.to_string());
        let to: Address = serde_json::from_value(params[0]["to"].clone()).map_err(|e| invalid(&e))?;
        let data: Bytes = serde_json::from_value(params[0]["data"].clone()).map_err(|e| invalid(&e))?;
        let addresses = ContractAddresses::default();
        let chain = self.chain.lock();

        let encoded = if to == addresses.marketplace {
            match IMarketplace::IMarketplaceCalls::abi_decode(&data).map_err(|e| invalid(&e))? {
                IMarketplace::IMarketplaceCalls::getActiveProducts(_) => {
                    chain.products.abi_encode()
                }
                IMarketplace::IMarketplaceCalls::getOrdersForProduct(call) => chain
                    .orders
                    .get(&call.productId)
                    .cloned()
                    .unwrap_or_default()
                    .abi_encode(),
                _ => return Err(invalid(&"not a view function")),
            }
        } else if to == addresses.escrow {
            match IEscrow::IEscrowCalls::abi_decode(&data).map_err(|e| invalid(&e))? {
                IEscrow::IEscrowCalls::getEscrowDetails(call) => match chain.escrows.get(&call.orderId) {
                    Some(details) => details.abi_encode(),
                    None => {
                        return Err(RpcError::Response {
                            code: 3,
                            message: "execution reverted: Escrow does not exist".to_string(),
                            data: None,
                        })
                    }
                },
                IEscrow::IEscrowCalls::isDisputed(call) => {
                    chain.disputed.contains(&call.orderId).abi_encode()
                }
                IEscrow::IEscrowCalls::canRefund(call) => {
                    chain.refundable.contains(&call.orderId).abi_encode()
                }
                _ => return Err(invalid(&"not a view function")),
            }
        } else if to == addresses.token {
            match IUtilityToken::IUtilityTokenCalls::abi_decode(&data).map_err(|e| invalid(&e))? {
                IUtilityToken::IUtilityTokenCalls::balanceOf(call) => chain
                    .balances
                    .get(&call.owner)
                    .copied()
                    .unwrap_or_default()
                    .abi_encode(),
                _ => return Err(invalid(&"not a view function")),
            }
        } else {
            return Err(invalid(&format!("no contract at {}", to)));
        };

        Ok(json!(Bytes::from(encoded)))
    }
}
