//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Solana: RPC gateway, WebSocket account listener, wallet management
//! - Executor: the three transaction submission paths (standard RPC,
//!   relay, block-builder bundles)
//! - CLI: clap argument definitions

pub mod cli;
pub mod executor;
pub mod solana;

pub use executor::{build_executor, BundleExecutor, RelayExecutor, StandardExecutor};
pub use solana::{AccountListener, RpcGateway, WalletManager};
