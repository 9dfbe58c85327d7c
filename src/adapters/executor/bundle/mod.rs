//! Bundle executor.
//!
//! Wraps the swap transaction together with a validator tip transfer and
//! submits both as an atomic bundle to a block-building auction. The
//! auction manages priority, so compute-budget instructions stay out of
//! transactions routed here.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::BlockEngineClient;
pub use config::BundleConfig;
pub use error::BundleError;
pub use types::{BundleOutcome, BundleStatus};

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::message::{v0, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::system_instruction;
use solana_sdk::transaction::VersionedTransaction;
use tracing::debug;

use crate::adapters::executor::encode_versioned_transaction;
use crate::ports::executor::{ExecutionReceipt, ExecutorError, TransactionExecutor};

pub struct BundleExecutor {
    client: BlockEngineClient,
}

impl BundleExecutor {
    pub fn new(config: BundleConfig) -> Result<Self, ExecutorError> {
        let client = BlockEngineClient::new(config).map_err(map_bundle_error)?;
        Ok(Self { client })
    }

    /// Separate transaction paying the validator tip, signed with the
    /// same blockhash as the swap so both expire together.
    fn build_tip_transaction(
        &self,
        wallet: &Keypair,
        recent_blockhash: Hash,
    ) -> Result<VersionedTransaction, ExecutorError> {
        let tip_account = config::tip_accounts::random_tip_account()
            .parse::<Pubkey>()
            .map_err(|e| ExecutorError::Serialization(format!("bad tip account: {e}")))?;
        let tip_ix =
            system_instruction::transfer(&wallet.pubkey(), &tip_account, self.client.tip_lamports());

        let message = v0::Message::try_compile(&wallet.pubkey(), &[tip_ix], &[], recent_blockhash)
            .map_err(|e| ExecutorError::Serialization(e.to_string()))?;
        VersionedTransaction::try_new(VersionedMessage::V0(message), &[wallet])
            .map_err(|e| ExecutorError::Serialization(e.to_string()))
    }
}

fn map_bundle_error(e: BundleError) -> ExecutorError {
    match e {
        BundleError::ConfirmDeadline | BundleError::Timeout => {
            ExecutorError::SubmissionTimeout(e.to_string())
        }
        BundleError::Api { .. } | BundleError::InvalidBundle(_) => {
            ExecutorError::SubmissionRejected(e.to_string())
        }
        BundleError::Serialization(msg) => ExecutorError::Serialization(msg),
        BundleError::Http(_) | BundleError::RateLimited | BundleError::StatusCheckFailed(_) => {
            ExecutorError::Http(e.to_string())
        }
    }
}

#[async_trait]
impl TransactionExecutor for BundleExecutor {
    async fn execute_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        wallet: &Keypair,
        recent_blockhash: Hash,
    ) -> Result<ExecutionReceipt, ExecutorError> {
        let tip_tx = self.build_tip_transaction(wallet, recent_blockhash)?;

        let encoded = vec![
            encode_versioned_transaction(transaction)?,
            encode_versioned_transaction(&tip_tx)?,
        ];
        let signature = transaction
            .signatures
            .first()
            .map(ToString::to_string)
            .unwrap_or_default();

        let outcome = self
            .client
            .send_bundle_and_wait(encoded)
            .await
            .map_err(map_bundle_error)?;

        debug!(
            bundle_id = %outcome.bundle_id,
            status = ?outcome.status,
            time_to_land_ms = ?outcome.time_to_land_ms,
            "Bundle reached terminal status"
        );

        match outcome.status {
            BundleStatus::Landed => Ok(ExecutionReceipt::confirmed(signature)),
            BundleStatus::Dropped => Err(ExecutorError::SubmissionRejected(format!(
                "bundle {} dropped by auction",
                outcome.bundle_id
            ))),
            _ => Err(ExecutorError::SubmissionRejected(format!(
                "bundle {} failed",
                outcome.bundle_id
            ))),
        }
    }

    fn supplies_priority_fee(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "bundle"
    }
}
