//! Contract gateway: binds an address + interface to an executor.
//!
//! `ContractGateway::bind` is a pure function of (address, interface,
//! executor). Handles are cheap and meant to be re-derived per operation from
//! the current session, never cached across session changes.

use std::marker::PhantomData;

use alloy_primitives::{Address, Bytes};

use crate::contracts::{
    ContractAddresses, ContractCall, ContractInterface, Escrow, Marketplace, UtilityToken,
};
use crate::error::{SdkError, TxError};
use crate::session::{ConfirmationConfig, PendingTransaction, Provider, Signer};

/// What a contract handle executes through.
#[derive(Debug, Clone)]
pub enum Executor {
    /// Connected account: reads and writes.
    Signing(Signer),
    /// Reads only.
    ReadOnly(Provider),
}

impl Executor {
    pub fn provider(&self) -> Provider {
        match self {
            Executor::Signing(signer) => signer.provider(),
            Executor::ReadOnly(provider) => provider.clone(),
        }
    }

    /// Account used as `from` for calls, when there is one.
    pub fn account(&self) -> Option<Address> {
        match self {
            Executor::Signing(signer) => Some(signer.account()),
            Executor::ReadOnly(_) => None,
        }
    }

    pub fn can_sign(&self) -> bool {
        matches!(self, Executor::Signing(_))
    }
}

/// Stateless factory for contract handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractGateway {
    addresses: ContractAddresses,
    confirmation: ConfirmationConfig,
}

impl ContractGateway {
    pub fn new(addresses: ContractAddresses, confirmation: ConfirmationConfig) -> Self {
        Self {
            addresses,
            confirmation,
        }
    }

    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    pub fn bind<I: ContractInterface>(&self, executor: Executor) -> ContractHandle<I> {
        ContractHandle {
            address: I::address(&self.addresses),
            executor,
            confirmation: self.confirmation,
            _interface: PhantomData,
        }
    }

    pub fn marketplace(&self, executor: Executor) -> ContractHandle<Marketplace> {
        self.bind(executor)
    }

    pub fn escrow(&self, executor: Executor) -> ContractHandle<Escrow> {
        self.bind(executor)
    }

    pub fn token(&self, executor: Executor) -> ContractHandle<UtilityToken> {
        self.bind(executor)
    }
}

/// Callable proxy for one contract.
pub struct ContractHandle<I> {
    address: Address,
    executor: Executor,
    confirmation: ConfirmationConfig,
    _interface: PhantomData<fn() -> I>,
}

impl<I: ContractInterface> ContractHandle<I> {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Read call (`eth_call`), decoded into the function's return type.
    pub async fn call<C>(&self, call: C) -> Result<C::Return, SdkError>
    where
        C: ContractCall<I>,
    {
        let data = Bytes::from(call.abi_encode());
        tracing::debug!(contract = I::NAME, function = C::SIGNATURE, "eth_call");
        let raw = self
            .executor
            .provider()
            .call(self.executor.account(), self.address, data)
            .await?;
        Ok(C::abi_decode_returns(&raw)?)
    }

    /// Write call. Fails with [`TxError::WalletRequired`] before any request
    /// when bound read-only.
    pub async fn send<C>(&self, call: C) -> Result<PendingTransaction, TxError>
    where
        C: ContractCall<I>,
    {
        let Executor::Signing(signer) = &self.executor else {
            return Err(TxError::WalletRequired);
        };
        let data = Bytes::from(call.abi_encode());
        tracing::debug!(contract = I::NAME, function = C::SIGNATURE, "eth_sendTransaction");
        signer
            .send_transaction(self.address, data, self.confirmation)
            .await
    }
}

impl<I> std::fmt::Debug for ContractHandle<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractHandle")
            .field("address", &self.address)
            .field("executor", &self.executor)
            .finish()
    }
}
