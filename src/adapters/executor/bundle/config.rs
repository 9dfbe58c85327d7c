//! Bundle submission configuration
//!
//! Block engine endpoints and the validator tip accounts bundles pay
//! into.

use std::time::Duration;

/// Known block engine endpoints
pub mod endpoints {
    /// Mainnet block engine (Amsterdam)
    pub const MAINNET_AMSTERDAM: &str = "https://amsterdam.mainnet.block-engine.jito.wtf";
    /// Mainnet block engine (Frankfurt)
    pub const MAINNET_FRANKFURT: &str = "https://frankfurt.mainnet.block-engine.jito.wtf";
    /// Mainnet block engine (New York)
    pub const MAINNET_NY: &str = "https://ny.mainnet.block-engine.jito.wtf";
    /// Mainnet block engine (Tokyo)
    pub const MAINNET_TOKYO: &str = "https://tokyo.mainnet.block-engine.jito.wtf";
    /// Default mainnet endpoint
    pub const MAINNET_DEFAULT: &str = MAINNET_NY;
}

/// Validator tip accounts (the auction rotates through these)
pub mod tip_accounts {
    pub const TIP_ACCOUNTS: &[&str] = &[
        "96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5",
        "HFqU5x63VTqvQss8hp11i4bVmkdzGZBJLYQ6QwBvp8dx",
        "Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY",
        "ADaUMid9yfUytqMBgopwjb2DTLSokTSzL1zt6iGPaS49",
        "DfXygSm4jCyNCybVYYK6DwvWqjKee8pbDmJGcLWNDXjh",
        "ADuUkR4vqLUMWXxW9gh6D6L8pMSawimctcNZ5pGwDcEt",
        "DttWaMuVvTiduZRnguLF7jNxTgiMBZ1hyAumKUiL2KRL",
        "3AVi9Tg9Uo68tJfuvoKvqKNWKkC5wPdSSdeBnizKZ6jT",
    ];

    /// Pick a random tip account to spread load across validators
    pub fn random_tip_account() -> &'static str {
        use rand::Rng;
        let idx = rand::thread_rng().gen_range(0..TIP_ACCOUNTS.len());
        TIP_ACCOUNTS[idx]
    }
}

#[derive(Debug, Clone)]
pub struct BundleConfig {
    /// Block engine endpoint URL
    pub block_engine_url: String,
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// Tip paid to the validator per bundle, in lamports
    pub tip_lamports: u64,
    /// How long to wait for a terminal bundle status
    pub confirm_timeout: Duration,
    /// Status poll spacing
    pub poll_interval: Duration,
    /// Optional API token for authenticated engines
    pub api_token: Option<String>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            block_engine_url: endpoints::MAINNET_DEFAULT.to_string(),
            request_timeout: Duration::from_secs(10),
            tip_lamports: 1_000_000, // 0.001 SOL
            confirm_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
            api_token: None,
        }
    }
}

impl BundleConfig {
    /// Pick a regional mainnet endpoint by name
    pub fn mainnet(region: &str) -> Self {
        let url = match region.to_lowercase().as_str() {
            "amsterdam" | "ams" => endpoints::MAINNET_AMSTERDAM,
            "frankfurt" | "fra" => endpoints::MAINNET_FRANKFURT,
            "tokyo" | "tyo" => endpoints::MAINNET_TOKYO,
            _ => endpoints::MAINNET_NY,
        };
        Self {
            block_engine_url: url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_tip(mut self, lamports: u64) -> Self {
        self.tip_lamports = lamports;
        self
    }

    pub fn with_api_token(mut self, token: String) -> Self {
        self.api_token = Some(token);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BundleConfig::default();
        assert_eq!(config.block_engine_url, endpoints::MAINNET_NY);
        assert!(config.tip_lamports > 0);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_mainnet_regions() {
        assert!(BundleConfig::mainnet("amsterdam")
            .block_engine_url
            .contains("amsterdam"));
        assert!(BundleConfig::mainnet("fra")
            .block_engine_url
            .contains("frankfurt"));
        assert!(BundleConfig::mainnet("unknown")
            .block_engine_url
            .contains("ny."));
    }

    #[test]
    fn test_builder_methods() {
        let config = BundleConfig::default()
            .with_tip(50_000)
            .with_api_token("token".to_string());
        assert_eq!(config.tip_lamports, 50_000);
        assert_eq!(config.api_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_random_tip_account_is_known() {
        let tip = tip_accounts::random_tip_account();
        assert!(tip_accounts::TIP_ACCOUNTS.contains(&tip));
    }
}
