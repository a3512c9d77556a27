//! Typed bindings for the three external contracts.
//!
//! Interfaces are declared with `alloy_sol_types::sol!`; each contract has a
//! zero-sized marker implementing [`ContractInterface`], which ties it to an
//! address in [`ContractAddresses`]. [`ContractCall`] lists which generated
//! call types belong to which contract.

/// Implements [`ContractCall`] for each listed call type.
macro_rules! contract_calls {
    ($contract:ty => $($call:ty),+ $(,)?) => {
        $(impl $crate::contracts::ContractCall<$contract> for $call {})+
    };
}

pub mod escrow;
pub mod marketplace;
pub mod token;

pub use escrow::{Escrow, IEscrow};
pub use marketplace::{IMarketplace, Marketplace};
pub use token::{IUtilityToken, UtilityToken};

use alloy_primitives::Address;
use alloy_sol_types::SolCall;

use crate::network;

/// Deployed addresses of the marketplace, escrow and utility token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub marketplace: Address,
    pub escrow: Address,
    pub token: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            marketplace: network::MARKETPLACE_ADDRESS,
            escrow: network::ESCROW_ADDRESS,
            token: network::UTILITY_TOKEN_ADDRESS,
        }
    }
}

/// A contract the gateway can bind.
pub trait ContractInterface {
    const NAME: &'static str;

    fn address(addresses: &ContractAddresses) -> Address;
}

/// A `sol!` call type declared by contract `I`. Handles only accept calls of
/// their own contract.
pub trait ContractCall<I: ContractInterface>: SolCall {}
