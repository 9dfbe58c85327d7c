//! Block engine HTTP client.
//!
//! Submits bundles and polls their status until a terminal state.

use std::time::{Duration, Instant};

use reqwest::Client;

use super::config::BundleConfig;
use super::error::BundleError;
use super::types::{
    BundleOutcome, BundleStatus, GetBundleStatusesRequest, GetBundleStatusesResponse,
    JsonRpcResponse, SendBundleRequest,
};

/// Bundles may carry at most this many transactions
const MAX_BUNDLE_TRANSACTIONS: usize = 5;

#[derive(Debug, Clone)]
pub struct BlockEngineClient {
    config: BundleConfig,
    http: Client,
}

impl BlockEngineClient {
    pub fn new(config: BundleConfig) -> Result<Self, BundleError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BundleError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn block_engine_url(&self) -> &str {
        &self.config.block_engine_url
    }

    pub fn tip_lamports(&self) -> u64 {
        self.config.tip_lamports
    }

    /// Submit a bundle of base64-encoded transactions; returns the
    /// engine-assigned bundle id.
    pub async fn send_bundle(&self, transactions: Vec<String>) -> Result<String, BundleError> {
        if transactions.is_empty() {
            return Err(BundleError::InvalidBundle("Bundle cannot be empty".into()));
        }
        if transactions.len() > MAX_BUNDLE_TRANSACTIONS {
            return Err(BundleError::InvalidBundle(format!(
                "Bundle cannot contain more than {} transactions",
                MAX_BUNDLE_TRANSACTIONS
            )));
        }

        let url = format!("{}/api/v1/bundles", self.config.block_engine_url);
        let request = SendBundleRequest::new(transactions);

        let mut req_builder = self.http.post(&url).json(&request);
        if let Some(token) = &self.config.api_token {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = req_builder.send().await?;
        if response.status().as_u16() == 429 {
            return Err(BundleError::RateLimited);
        }
        let text = response.text().await?;

        let rpc_response: JsonRpcResponse<String> = serde_json::from_str(&text)?;
        if let Some(error) = rpc_response.error {
            return Err(BundleError::Api {
                code: error.code,
                message: error.message,
            });
        }
        rpc_response.result.ok_or(BundleError::Api {
            code: -1,
            message: "No bundle ID in response".into(),
        })
    }

    pub async fn get_bundle_status(&self, bundle_id: &str) -> Result<BundleStatus, BundleError> {
        let url = format!("{}/api/v1/bundles", self.config.block_engine_url);
        let request = GetBundleStatusesRequest::new(vec![bundle_id.to_string()]);

        let mut req_builder = self.http.post(&url).json(&request);
        if let Some(token) = &self.config.api_token {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = req_builder.send().await?;
        if response.status().as_u16() == 429 {
            return Err(BundleError::RateLimited);
        }
        let text = response.text().await?;

        let rpc_response: JsonRpcResponse<GetBundleStatusesResponse> =
            serde_json::from_str(&text)?;
        if let Some(error) = rpc_response.error {
            return Err(BundleError::StatusCheckFailed(error.message));
        }
        let statuses = rpc_response
            .result
            .ok_or_else(|| BundleError::StatusCheckFailed("No status in response".into()))?;

        let entry = statuses
            .value
            .into_iter()
            .find(|e| e.bundle_id == bundle_id)
            .ok_or_else(|| BundleError::StatusCheckFailed("Bundle not found".into()))?;

        if entry.err.is_some() {
            return Ok(BundleStatus::Failed);
        }
        Ok(entry
            .confirmation_status
            .as_deref()
            .map(BundleStatus::parse)
            .unwrap_or(BundleStatus::Pending))
    }

    /// Submit and poll until the bundle reaches a terminal state or the
    /// confirm deadline passes. Transient status-poll failures are
    /// tolerated inside the deadline.
    pub async fn send_bundle_and_wait(
        &self,
        transactions: Vec<String>,
    ) -> Result<BundleOutcome, BundleError> {
        let start = Instant::now();
        let bundle_id = self.send_bundle(transactions).await?;

        loop {
            if start.elapsed() > self.config.confirm_timeout {
                return Err(BundleError::ConfirmDeadline);
            }

            match self.get_bundle_status(&bundle_id).await {
                Ok(status) if status.is_final() => {
                    return Ok(BundleOutcome {
                        bundle_id,
                        status,
                        time_to_land_ms: Some(start.elapsed().as_millis() as u64),
                    });
                }
                Ok(_) => {}
                Err(e) if e.is_retryable() => {}
                Err(e) => return Err(e),
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BlockEngineClient {
        BlockEngineClient::new(BundleConfig::default()).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = client();
        assert!(client.block_engine_url().contains("block-engine.jito.wtf"));
        assert!(client.tip_lamports() > 0);
    }

    #[tokio::test]
    async fn test_send_bundle_empty_validation() {
        let result = client().send_bundle(vec![]).await;
        match result.unwrap_err() {
            BundleError::InvalidBundle(msg) => assert!(msg.contains("empty")),
            e => panic!("Expected InvalidBundle, got {:?}", e),
        }
    }

    #[tokio::test]
    async fn test_send_bundle_size_validation() {
        let txs = (0..6).map(|i| format!("tx{}", i)).collect();
        let result = client().send_bundle(txs).await;
        match result.unwrap_err() {
            BundleError::InvalidBundle(msg) => assert!(msg.contains("more than 5")),
            e => panic!("Expected InvalidBundle, got {:?}", e),
        }
    }

    #[test]
    fn test_status_response_parsing() {
        let raw = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "context": { "slot": 280000000 },
                "value": [
                    { "bundle_id": "uuid-1", "confirmation_status": "confirmed", "err": null }
                ]
            }
        }"#;
        let parsed: JsonRpcResponse<GetBundleStatusesResponse> = serde_json::from_str(raw).unwrap();
        let entry = &parsed.result.unwrap().value[0];
        assert_eq!(entry.bundle_id, "uuid-1");
        assert_eq!(entry.confirmation_status.as_deref(), Some("confirmed"));
    }
}
