//! Transaction Executor Port
//!
//! The submission contract shared by the standard RPC, relay, and bundle
//! paths. The orchestrator holds exactly one executor as a trait object,
//! chosen from config at startup.

use async_trait::async_trait;
use serde::Deserialize;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Keypair;
use solana_sdk::transaction::VersionedTransaction;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Transaction rejected on submit: {0}")]
    SubmissionRejected(String),

    #[error("Confirmation wait timed out: {0}")]
    SubmissionTimeout(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("Transaction serialization failed: {0}")]
    Serialization(String),
}

/// Result of one submit-and-await-confirmation call.
///
/// `confirmed == false` with an `error` message covers the expected
/// failure modes (blockhash expiry, dropped bundle); transport problems
/// surface as `ExecutorError` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReceipt {
    pub confirmed: bool,
    pub signature: String,
    pub error: Option<String>,
}

impl ExecutionReceipt {
    pub fn confirmed(signature: impl Into<String>) -> Self {
        Self {
            confirmed: true,
            signature: signature.into(),
            error: None,
        }
    }

    pub fn failed(signature: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            confirmed: false,
            signature: signature.into(),
            error: Some(error.into()),
        }
    }
}

/// Which submission path is active, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Plain RPC broadcast with status polling
    #[serde(alias = "default")]
    Standard,
    /// Third-party relay with its own priority handling
    Relay,
    /// Block-engine bundle with a tip instruction
    Bundle,
}

impl FromStr for ExecutorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" | "standard" => Ok(ExecutorKind::Standard),
            "relay" => Ok(ExecutorKind::Relay),
            "bundle" => Ok(ExecutorKind::Bundle),
            other => Err(format!(
                "Unknown executor '{}' (expected default, relay, or bundle)",
                other
            )),
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutorKind::Standard => "standard",
            ExecutorKind::Relay => "relay",
            ExecutorKind::Bundle => "bundle",
        };
        f.write_str(s)
    }
}

/// Fresh blockhash per swap attempt. Split from the executor so retry
/// loops can be tested without a live RPC endpoint.
#[async_trait]
pub trait BlockhashProvider: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, ExecutorError>;
}

/// Submission backends implement this; the orchestrator never learns which
/// one is behind the trait object.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    /// Submit a signed transaction and wait for a terminal outcome. The
    /// wallet is passed so backends that add their own signed tip
    /// transactions can do so; `recent_blockhash` bounds the wait.
    async fn execute_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        wallet: &Keypair,
        recent_blockhash: Hash,
    ) -> Result<ExecutionReceipt, ExecutorError>;

    /// Whether this path prices its own priority. The swap builder skips
    /// compute-budget instructions when true.
    fn supplies_priority_fee(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str;
}
