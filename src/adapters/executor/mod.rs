//! Transaction executor implementations.
//!
//! Three interchangeable submission paths sit behind the
//! `TransactionExecutor` trait: plain RPC broadcast, relay submission,
//! and block-builder bundles. The variant is chosen once at startup.

pub mod bundle;
pub mod relay;
pub mod standard;

pub use bundle::{BundleConfig, BundleExecutor};
pub use relay::{RelayConfig, RelayExecutor};
pub use standard::{StandardExecutor, StandardExecutorConfig};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use tracing::info;

use crate::adapters::solana::rpc::RpcGateway;
use crate::ports::executor::{ExecutorError, ExecutorKind, TransactionExecutor};

/// Wire encoding shared by the relay and bundle paths
pub(crate) fn encode_versioned_transaction(
    tx: &VersionedTransaction,
) -> Result<String, ExecutorError> {
    let bytes = bincode::serialize(tx).map_err(|e| ExecutorError::Serialization(e.to_string()))?;
    Ok(BASE64.encode(bytes))
}

/// Instantiate the configured executor variant.
pub fn build_executor(
    kind: ExecutorKind,
    gateway: RpcGateway,
    standard: StandardExecutorConfig,
    relay: RelayConfig,
    bundle: BundleConfig,
) -> Result<Arc<dyn TransactionExecutor>, ExecutorError> {
    let executor: Arc<dyn TransactionExecutor> = match kind {
        ExecutorKind::Standard => Arc::new(StandardExecutor::new(gateway, standard)),
        ExecutorKind::Relay => Arc::new(RelayExecutor::new(relay)?),
        ExecutorKind::Bundle => Arc::new(BundleExecutor::new(bundle)?),
    };
    info!(executor = executor.name(), "Transaction executor selected");
    Ok(executor)
}
