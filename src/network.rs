//! Network constants for the Agrimarket SDK.

use alloy_primitives::{address, Address};

/// Default JSON-RPC endpoint for read-only access (Sepolia testnet).
pub const DEFAULT_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

/// Chain the default contracts are deployed on.
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// Deployed marketplace contract.
pub const MARKETPLACE_ADDRESS: Address = address!("7dd9f0511a4718eff1ebf1dc50fcb383955c706d");

/// Deployed escrow contract.
pub const ESCROW_ADDRESS: Address = address!("fcfc3a73044b5431388b184dd745ffead9ee9b5a");

/// Deployed utility token contract.
pub const UTILITY_TOKEN_ADDRESS: Address = address!("a8b0a977098463e58630c50e6a5d218e505932f5");

/// Decimals used by every amount the contracts expose.
pub const TOKEN_DECIMALS: u32 = 18;
