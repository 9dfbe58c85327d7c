//! Block engine API types
//!
//! JSON-RPC request and response shapes for bundle submission and
//! status queries.

use serde::{Deserialize, Serialize};

/// Bundle submission request (JSON-RPC format)
#[derive(Debug, Clone, Serialize)]
pub struct SendBundleRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    /// One entry: the list of base64-encoded transactions
    pub params: Vec<Vec<String>>,
}

impl SendBundleRequest {
    pub fn new(transactions: Vec<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: 1,
            method: "sendBundle".to_string(),
            params: vec![transactions],
        }
    }
}

/// Status query for previously submitted bundles
#[derive(Debug, Clone, Serialize)]
pub struct GetBundleStatusesRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Vec<Vec<String>>,
}

impl GetBundleStatusesRequest {
    pub fn new(bundle_ids: Vec<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: 1,
            method: "getBundleStatuses".to_string(),
            params: vec![bundle_ids],
        }
    }
}

/// JSON-RPC response wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

/// Result payload of getBundleStatuses
#[derive(Debug, Clone, Deserialize)]
pub struct GetBundleStatusesResponse {
    pub value: Vec<BundleStatusEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BundleStatusEntry {
    pub bundle_id: String,
    /// Raw status string from the engine
    #[serde(default)]
    pub confirmation_status: Option<String>,
    #[serde(default)]
    pub err: Option<serde_json::Value>,
}

/// Normalized bundle lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BundleStatus {
    Pending,
    Processing,
    Landed,
    Failed,
    Dropped,
    #[default]
    Unknown,
}

impl BundleStatus {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            BundleStatus::Landed | BundleStatus::Failed | BundleStatus::Dropped
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BundleStatus::Landed)
    }

    /// Interpret the engine's status string. Landed covers every
    /// commitment level at or above processed-with-inclusion.
    pub fn parse(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "pending" => BundleStatus::Pending,
            "processing" => BundleStatus::Processing,
            "processed" | "confirmed" | "finalized" | "landed" => BundleStatus::Landed,
            "failed" | "invalid" => BundleStatus::Failed,
            "dropped" => BundleStatus::Dropped,
            _ => BundleStatus::Unknown,
        }
    }
}

/// Terminal outcome of one bundle submission
#[derive(Debug, Clone)]
pub struct BundleOutcome {
    pub bundle_id: String,
    pub status: BundleStatus,
    pub time_to_land_ms: Option<u64>,
}

impl BundleOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
