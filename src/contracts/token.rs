//! Utility token interface (18-decimal ERC-20 with open mint).

use alloy_primitives::Address;
use alloy_sol_types::sol;

use super::{ContractAddresses, ContractInterface};

sol! {
    interface IUtilityToken {
        function balanceOf(address owner) external view returns (uint256);
        function mint(address to, uint256 amount) external;
    }
}

/// Marker for the utility token contract.
#[derive(Debug, Clone, Copy)]
pub struct UtilityToken;

impl ContractInterface for UtilityToken {
    const NAME: &'static str = "utility token";

    fn address(addresses: &ContractAddresses) -> Address {
        addresses.token
    }
}

contract_calls!(UtilityToken => IUtilityToken::balanceOfCall, IUtilityToken::mintCall);
