//! Escrow contract interface.
//!
//! One escrow per order, keyed by order id. Release, refund and dispute
//! rules are enforced on-chain.

use alloy_primitives::Address;
use alloy_sol_types::sol;

use super::{ContractAddresses, ContractInterface};

sol! {
    interface IEscrow {
        #[derive(Debug, PartialEq, Eq)]
        struct EscrowDetails {
            uint256 orderId;
            address buyer;
            address seller;
            uint256 amount;
            bool isReleased;
            bool isRefunded;
            uint256 createdAt;
        }

        function getEscrowDetails(uint256 orderId) external view returns (EscrowDetails memory);
        function isDisputed(uint256 orderId) external view returns (bool);
        function canRefund(uint256 orderId) external view returns (bool);

        function createEscrow(address seller, address buyer, uint256 amount) external payable;
        function completeEscrow(uint256 orderId) external;
        function refundEscrow(uint256 orderId) external;
        function raiseDispute(uint256 orderId) external;
        function resolveDispute(uint256 orderId, bool releaseToSeller) external;
    }
}

/// Marker for the escrow contract.
#[derive(Debug, Clone, Copy)]
pub struct Escrow;

impl ContractInterface for Escrow {
    const NAME: &'static str = "escrow";

    fn address(addresses: &ContractAddresses) -> Address {
        addresses.escrow
    }
}

contract_calls!(Escrow =>
    IEscrow::getEscrowDetailsCall,
    IEscrow::isDisputedCall,
    IEscrow::canRefundCall,
    IEscrow::createEscrowCall,
    IEscrow::completeEscrowCall,
    IEscrow::refundEscrowCall,
    IEscrow::raiseDisputeCall,
    IEscrow::resolveDisputeCall,
);
