//! Marketplace contract interface.
//!
//! Products are listed by farmers; orders reference a product and lock the
//! buyer's payment in the escrow contract.

use alloy_primitives::Address;
use alloy_sol_types::sol;

use super::{ContractAddresses, ContractInterface};

sol! {
    interface IMarketplace {
        #[derive(Debug, PartialEq, Eq)]
        struct Product {
            uint256 id;
            address farmer;
            string name;
            string description;
            string category;
            string unit;
            uint256 price;
            uint256 quantity;
            string imageHash;
            string location;
            uint256 harvestDate;
            bool isOrganic;
            bool isActive;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Order {
            uint256 id;
            uint256 productId;
            address farmer;
            address buyer;
            uint256 amount;
            uint256 price;
            uint256 escrowId;
            bool isCompleted;
            bool isCancelled;
            uint256 createdAt;
            uint256 expiryTime;
        }

        function getActiveProducts() external view returns (Product[] memory);
        function getOrdersForProduct(uint256 productId) external view returns (Order[] memory);

        function createProduct(
            string name,
            string description,
            string category,
            string unit,
            uint256 pricePerUnit,
            uint256 quantity,
            string imageHash,
            string location,
            uint256 harvestDate,
            bool isOrganic
        ) external;
        function updateProduct(
            uint256 productId,
            string name,
            string description,
            uint256 price,
            uint256 quantity
        ) external;
        function deactivateProduct(uint256 productId) external;

        function createOrder(uint256 productId, uint256 amount, uint256 price) external payable;
        function completeOrder(uint256 orderId) external;
        function cancelOrder(uint256 orderId) external;
    }
}

/// Marker for the marketplace contract.
#[derive(Debug, Clone, Copy)]
pub struct Marketplace;

impl ContractInterface for Marketplace {
    const NAME: &'static str = "marketplace";

    fn address(addresses: &ContractAddresses) -> Address {
        addresses.marketplace
    }
}

contract_calls!(Marketplace =>
    IMarketplace::getActiveProductsCall,
    IMarketplace::getOrdersForProductCall,
    IMarketplace::createProductCall,
    IMarketplace::updateProductCall,
    IMarketplace::deactivateProductCall,
    IMarketplace::createOrderCall,
    IMarketplace::completeOrderCall,
    IMarketplace::cancelOrderCall,
);
