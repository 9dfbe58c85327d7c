//! Standard RPC executor.
//!
//! Broadcasts through the regular RPC gateway and polls signature
//! statuses until the transaction confirms, the chain rejects it, or the
//! blockhash it was built on expires.

use async_trait::async_trait;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Keypair;
use solana_sdk::transaction::VersionedTransaction;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::adapters::solana::rpc::RpcGateway;
use crate::ports::executor::{ExecutionReceipt, ExecutorError, TransactionExecutor};

#[derive(Debug, Clone, Copy)]
pub struct StandardExecutorConfig {
    pub poll_interval: Duration,
    /// Hard ceiling in case the blockhash validity check itself stalls
    pub confirm_timeout: Duration,
}

impl Default for StandardExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(400),
            confirm_timeout: Duration::from_secs(90),
        }
    }
}

pub struct StandardExecutor {
    gateway: RpcGateway,
    config: StandardExecutorConfig,
}

impl StandardExecutor {
    pub fn new(gateway: RpcGateway, config: StandardExecutorConfig) -> Self {
        Self { gateway, config }
    }
}

#[async_trait]
impl TransactionExecutor for StandardExecutor {
    async fn execute_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        _wallet: &Keypair,
        recent_blockhash: Hash,
    ) -> Result<ExecutionReceipt, ExecutorError> {
        let signature = self
            .gateway
            .send_transaction_skip_preflight(transaction)
            .await
            .map_err(|e| ExecutorError::SubmissionRejected(e.to_string()))?;

        debug!(%signature, "Transaction broadcast, polling for confirmation");
        let started = Instant::now();

        loop {
            if started.elapsed() > self.config.confirm_timeout {
                return Err(ExecutorError::SubmissionTimeout(format!(
                    "no confirmation for {} after {:?}",
                    signature, self.config.confirm_timeout
                )));
            }

            match self.gateway.get_signature_statuses(&[signature]).await {
                Ok(statuses) => {
                    if let Some(Some(status)) = statuses.first() {
                        if let Some(err) = &status.err {
                            return Err(ExecutorError::SubmissionRejected(format!(
                                "{signature}: {err}"
                            )));
                        }
                        if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                            return Ok(ExecutionReceipt::confirmed(signature.to_string()));
                        }
                    }
                }
                Err(e) => {
                    warn!(%signature, error = %e, "Status poll failed, retrying");
                }
            }

            // unknown status and an expired blockhash means this
            // transaction can never land
            match self.gateway.is_blockhash_valid(&recent_blockhash).await {
                Ok(false) => {
                    return Err(ExecutorError::SubmissionTimeout(format!(
                        "blockhash expired before {signature} confirmed"
                    )));
                }
                Ok(true) => {}
                Err(e) => {
                    warn!(error = %e, "Blockhash validity check failed, retrying");
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StandardExecutorConfig::default();
        assert!(config.poll_interval < config.confirm_timeout);
    }

    #[test]
    fn test_executor_does_not_supply_fees() {
        let gateway = RpcGateway::new(
            "https://api.devnet.solana.com".to_string(),
            CommitmentConfig::confirmed(),
        );
        let executor = StandardExecutor::new(gateway, StandardExecutorConfig::default());
        assert!(!executor.supplies_priority_fee());
        assert_eq!(executor.name(), "standard");
    }
}
