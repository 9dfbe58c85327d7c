//! Relay executor.
//!
//! Hands the signed transaction to a third-party relay over JSON-RPC.
//! The relay attaches its own priority handling, so compute-budget
//! instructions are left out of transactions routed here. Confirmation
//! comes from the relay's signature-status endpoint, polled until the
//! configured deadline.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Keypair;
use solana_sdk::transaction::VersionedTransaction;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::adapters::executor::encode_versioned_transaction;
use crate::ports::executor::{ExecutionReceipt, ExecutorError, TransactionExecutor};

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub endpoint: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub confirm_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_token: None,
            request_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            confirm_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    value: Vec<Option<StatusValue>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusValue {
    confirmation_status: Option<String>,
    err: Option<serde_json::Value>,
}

pub struct RelayExecutor {
    config: RelayConfig,
    http: Client,
}

impl RelayExecutor {
    pub fn new(config: RelayConfig) -> Result<Self, ExecutorError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ExecutorError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    async fn post_rpc<T: serde::de::DeserializeOwned>(
        &self,
        body: serde_json::Value,
    ) -> Result<RpcEnvelope<T>, ExecutorError> {
        let mut request = self.http.post(&self.config.endpoint).json(&body);
        if let Some(token) = &self.config.api_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        let response = request
            .send()
            .await
            .map_err(|e| ExecutorError::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExecutorError::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(ExecutorError::Http(format!(
                "relay returned {}: {}",
                status, text
            )));
        }
        serde_json::from_str(&text).map_err(|e| ExecutorError::Serialization(e.to_string()))
    }

    async fn submit(&self, encoded_tx: &str) -> Result<String, ExecutorError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "sendTransaction",
            "params": [
                encoded_tx,
                { "encoding": "base64", "skipPreflight": true, "maxRetries": 0 }
            ]
        });
        let envelope: RpcEnvelope<String> = self.post_rpc(body).await?;
        if let Some(error) = envelope.error {
            return Err(ExecutorError::SubmissionRejected(format!(
                "relay rejected transaction: {} (code {})",
                error.message, error.code
            )));
        }
        envelope
            .result
            .ok_or_else(|| ExecutorError::SubmissionRejected("relay returned no signature".into()))
    }

    async fn signature_status(
        &self,
        signature: &str,
    ) -> Result<Option<StatusValue>, ExecutorError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getSignatureStatuses",
            "params": [[signature]]
        });
        let envelope: RpcEnvelope<StatusResult> = self.post_rpc(body).await?;
        if let Some(error) = envelope.error {
            return Err(ExecutorError::Http(format!(
                "status query failed: {} (code {})",
                error.message, error.code
            )));
        }
        Ok(envelope
            .result
            .and_then(|r| r.value.into_iter().next())
            .flatten())
    }
}

#[async_trait]
impl TransactionExecutor for RelayExecutor {
    async fn execute_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        _wallet: &Keypair,
        _recent_blockhash: Hash,
    ) -> Result<ExecutionReceipt, ExecutorError> {
        let encoded = encode_versioned_transaction(transaction)?;
        let signature = self.submit(&encoded).await?;
        debug!(%signature, "Relay accepted transaction, polling status");

        let started = Instant::now();
        loop {
            if started.elapsed() > self.config.confirm_timeout {
                return Err(ExecutorError::SubmissionTimeout(format!(
                    "relay gave no terminal status for {} within {:?}",
                    signature, self.config.confirm_timeout
                )));
            }

            match self.signature_status(&signature).await {
                Ok(Some(status)) => {
                    if let Some(err) = status.err {
                        return Err(ExecutorError::SubmissionRejected(format!(
                            "{signature}: {err}"
                        )));
                    }
                    if matches!(
                        status.confirmation_status.as_deref(),
                        Some("confirmed") | Some("finalized")
                    ) {
                        return Ok(ExecutionReceipt::confirmed(signature));
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(%signature, error = %e, "Relay status poll failed, retrying");
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    fn supplies_priority_fee(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "relay"
    }
}
