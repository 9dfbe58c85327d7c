//! Configuration Loader
//!
//! Loads and validates the sniper configuration from a TOML file. Secrets
//! never live in the file: the wallet private key and RPC endpoints can be
//! supplied through `KF_`-prefixed environment variables, which win over
//! the file values.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::executor::bundle::BundleConfig;
use crate::adapters::executor::{RelayConfig, StandardExecutorConfig};
use crate::application::{ExitMonitorSettings, OrchestratorSettings};
use crate::filters::{FilterMode, GateSettings};
use crate::ports::ExecutorKind;
use crate::swap::ComputeBudgetSettings;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wallet: WalletSection,
    pub rpc: RpcSection,
    pub trade: TradeSection,
    pub filters: FiltersSection,
    pub exit: ExitSection,
    pub executor: ExecutorSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Wallet configuration section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletSection {
    /// Path to a JSON keypair file; `KF_PRIVATE_KEY` (base58) wins over it
    #[serde(default)]
    pub keypair_path: Option<String>,
}

impl WalletSection {
    /// Base58 private key from the environment, if set and non-empty
    pub fn resolve_private_key(&self) -> Option<String> {
        std::env::var("KF_PRIVATE_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Keypair path with `~` expanded
    pub fn resolve_keypair_path(&self) -> Option<PathBuf> {
        self.keypair_path
            .as_ref()
            .map(|path| PathBuf::from(shellexpand::tilde(path).into_owned()))
    }
}

/// RPC endpoint configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct RpcSection {
    /// HTTP endpoint (use a private RPC for production)
    pub http_url: String,
    /// Websocket endpoint for account subscriptions
    pub ws_url: String,
    /// Commitment level: "processed", "confirmed", "finalized"
    pub commitment: String,
}

impl RpcSection {
    /// HTTP URL with `KF_RPC_URL` environment override
    pub fn resolve_http_url(&self) -> String {
        std::env::var("KF_RPC_URL").unwrap_or_else(|_| self.http_url.clone())
    }

    /// Websocket URL with `KF_WS_URL` environment override
    pub fn resolve_ws_url(&self) -> String {
        std::env::var("KF_WS_URL").unwrap_or_else(|_| self.ws_url.clone())
    }
}

/// Trade sizing and retry configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct TradeSection {
    /// WSOL spent per buy, in SOL
    pub quote_amount_sol: Decimal,
    /// Buy slippage tolerance in percent (15 = accept 15% less)
    pub buy_slippage_pct: Decimal,
    /// Sell slippage tolerance in percent
    pub sell_slippage_pct: Decimal,
    /// Independent submit attempts per buy
    pub max_buy_retries: u32,
    /// Independent submit attempts per sell
    pub max_sell_retries: u32,
    /// Serialize submissions so only one swap is in flight at a time
    pub one_token_at_a_time: bool,
}

/// Pool safety filter configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct FiltersSection {
    /// "enforced" or "bypass"; bypass skips every check and logs loudly
    #[serde(default)]
    pub mode: FilterMode,
    /// Spacing between filter evaluations in milliseconds
    pub check_interval_ms: u64,
    /// Total evaluation window in milliseconds
    pub check_duration_ms: u64,
    /// Consecutive full passes required for approval
    pub consecutive_matches: u32,
    /// Require the mint authority to be renounced
    #[serde(default = "default_true")]
    pub require_mint_renounced: bool,
    /// Require the freeze authority to be absent
    #[serde(default = "default_true")]
    pub require_freeze_revoked: bool,
    /// Require the LP mint supply to be burned to zero
    #[serde(default)]
    pub require_burned: bool,
    /// Lower bound on the pool's quote reserves, in SOL
    #[serde(default)]
    pub min_pool_size_sol: Option<Decimal>,
    /// Upper bound on the pool's quote reserves, in SOL
    #[serde(default)]
    pub max_pool_size_sol: Option<Decimal>,
    /// Optional flat file of mints the sniper may trade, one per line
    #[serde(default)]
    pub allow_list_path: Option<String>,
    /// How often the allow-list file is re-read
    #[serde(default = "default_allow_list_refresh_secs")]
    pub allow_list_refresh_secs: u64,
}

impl FiltersSection {
    pub fn resolve_allow_list_path(&self) -> Option<PathBuf> {
        self.allow_list_path
            .as_ref()
            .map(|path| PathBuf::from(shellexpand::tilde(path).into_owned()))
    }
}

/// Exit monitor configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ExitSection {
    /// Sell when the re-quoted exit rises this far above entry, in percent
    pub take_profit_pct: Decimal,
    /// Sell when the re-quoted exit falls this far below entry, in percent
    pub stop_loss_pct: Decimal,
    /// Spacing between price checks in milliseconds
    pub price_check_interval_ms: u64,
    /// Total monitoring window in milliseconds
    pub price_check_duration_ms: u64,
}

/// Transaction submission configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSection {
    /// "standard", "relay", or "bundle"
    pub kind: ExecutorKind,
    /// Compute unit limit for the standard path
    #[serde(default = "default_compute_unit_limit")]
    pub compute_unit_limit: u32,
    /// Compute unit price in micro-lamports for the standard path
    #[serde(default = "default_compute_unit_price")]
    pub compute_unit_price_micro_lamports: u64,
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub bundle: BundleSection,
}

/// Relay executor settings, only read when `kind = "relay"`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelaySection {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_token: Option<String>,
}

/// Bundle executor settings, only read when `kind = "bundle"`
#[derive(Debug, Clone, Deserialize)]
pub struct BundleSection {
    #[serde(default = "default_block_engine_url")]
    pub block_engine_url: String,
    /// Validator tip per bundle, in SOL
    #[serde(default = "default_tip_sol")]
    pub tip_sol: Decimal,
    #[serde(default)]
    pub api_token: Option<String>,
}

impl Default for BundleSection {
    fn default() -> Self {
        Self {
            block_engine_url: default_block_engine_url(),
            tip_sol: default_tip_sol(),
            api_token: None,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_allow_list_refresh_secs() -> u64 {
    60
}

fn default_compute_unit_limit() -> u32 {
    ComputeBudgetSettings::default().unit_limit
}

fn default_compute_unit_price() -> u64 {
    ComputeBudgetSettings::default().unit_price_micro_lamports
}

fn default_block_engine_url() -> String {
    crate::adapters::executor::bundle::config::endpoints::MAINNET_DEFAULT.to_string()
}

fn default_tip_sol() -> Decimal {
    Decimal::new(1, 3) // 0.001 SOL
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Whole SOL (decimal) to raw lamports, truncating sub-lamport dust
pub fn sol_to_lamports(amount: Decimal) -> Result<u64, ConfigError> {
    (amount * Decimal::from(LAMPORTS_PER_SOL))
        .trunc()
        .to_u64()
        .ok_or_else(|| {
            ConfigError::ValidationError(format!("SOL amount {} does not fit in lamports", amount))
        })
}

/// Percentage to basis points (15.5% -> 1550)
pub fn pct_to_bps(pct: Decimal) -> Result<u64, ConfigError> {
    (pct * Decimal::from(100u32)).trunc().to_u64().ok_or_else(|| {
        ConfigError::ValidationError(format!("Percentage {} does not convert to basis points", pct))
    })
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Trade sizing
        if self.trade.quote_amount_sol <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "quote_amount_sol must be > 0, got {}",
                self.trade.quote_amount_sol
            )));
        }

        for (name, pct) in [
            ("buy_slippage_pct", self.trade.buy_slippage_pct),
            ("sell_slippage_pct", self.trade.sell_slippage_pct),
        ] {
            if pct < Decimal::ZERO || pct > Decimal::from(100u32) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be 0-100, got {}",
                    name, pct
                )));
            }
        }

        if self.trade.max_buy_retries == 0 || self.trade.max_sell_retries == 0 {
            return Err(ConfigError::ValidationError(
                "max_buy_retries and max_sell_retries must be >= 1".to_string(),
            ));
        }

        // Filter gate timing
        if self.filters.check_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "check_interval_ms must be > 0".to_string(),
            ));
        }
        if self.filters.check_duration_ms < self.filters.check_interval_ms {
            return Err(ConfigError::ValidationError(format!(
                "check_duration_ms ({}) must be >= check_interval_ms ({})",
                self.filters.check_duration_ms, self.filters.check_interval_ms
            )));
        }
        if self.filters.consecutive_matches == 0 {
            return Err(ConfigError::ValidationError(
                "consecutive_matches must be >= 1".to_string(),
            ));
        }
        if let (Some(min), Some(max)) =
            (self.filters.min_pool_size_sol, self.filters.max_pool_size_sol)
        {
            if min > max {
                return Err(ConfigError::ValidationError(format!(
                    "min_pool_size_sol ({}) must be <= max_pool_size_sol ({})",
                    min, max
                )));
            }
        }

        // Exit monitor
        if self.exit.take_profit_pct < Decimal::ZERO || self.exit.stop_loss_pct < Decimal::ZERO {
            return Err(ConfigError::ValidationError(
                "take_profit_pct and stop_loss_pct must be >= 0".to_string(),
            ));
        }
        if self.exit.price_check_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "price_check_interval_ms must be > 0".to_string(),
            ));
        }

        // RPC endpoints
        if self.rpc.http_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc.http_url cannot be empty".to_string(),
            ));
        }
        if !self.rpc.ws_url.starts_with("ws") {
            return Err(ConfigError::ValidationError(format!(
                "rpc.ws_url must be a ws:// or wss:// endpoint, got '{}'",
                self.rpc.ws_url
            )));
        }
        self.commitment()?;

        // Executor specifics
        if self.executor.kind == ExecutorKind::Relay && self.executor.relay.endpoint.is_empty() {
            return Err(ConfigError::ValidationError(
                "executor.relay.endpoint is required when kind = \"relay\"".to_string(),
            ));
        }
        if self.executor.kind == ExecutorKind::Bundle
            && self.executor.bundle.tip_sol <= Decimal::ZERO
        {
            return Err(ConfigError::ValidationError(
                "executor.bundle.tip_sol must be > 0 when kind = \"bundle\"".to_string(),
            ));
        }

        // Logging
        if !matches!(
            self.logging.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be trace/debug/info/warn/error, got '{}'",
                self.logging.level
            )));
        }

        Ok(())
    }

    pub fn commitment(&self) -> Result<CommitmentConfig, ConfigError> {
        match self.rpc.commitment.as_str() {
            "processed" => Ok(CommitmentConfig::processed()),
            "confirmed" => Ok(CommitmentConfig::confirmed()),
            "finalized" => Ok(CommitmentConfig::finalized()),
            other => Err(ConfigError::ValidationError(format!(
                "commitment must be processed/confirmed/finalized, got '{}'",
                other
            ))),
        }
    }

    pub fn gate_settings(&self) -> GateSettings {
        GateSettings {
            interval: Duration::from_millis(self.filters.check_interval_ms),
            duration: Duration::from_millis(self.filters.check_duration_ms),
            consecutive_matches: self.filters.consecutive_matches,
        }
    }

    pub fn exit_settings(&self) -> ExitMonitorSettings {
        ExitMonitorSettings {
            interval: Duration::from_millis(self.exit.price_check_interval_ms),
            duration: Duration::from_millis(self.exit.price_check_duration_ms),
        }
    }

    pub fn orchestrator_settings(&self) -> Result<OrchestratorSettings, ConfigError> {
        Ok(OrchestratorSettings {
            quote_amount: sol_to_lamports(self.trade.quote_amount_sol)?,
            buy_slippage_bps: pct_to_bps(self.trade.buy_slippage_pct)?,
            sell_slippage_bps: pct_to_bps(self.trade.sell_slippage_pct)?,
            max_buy_retries: self.trade.max_buy_retries,
            max_sell_retries: self.trade.max_sell_retries,
            one_token_at_a_time: self.trade.one_token_at_a_time,
            gate: self.gate_settings(),
            exit: self.exit_settings(),
            take_profit_pct: self.exit.take_profit_pct,
            stop_loss_pct: self.exit.stop_loss_pct,
        })
    }

    /// Pool size bounds converted to raw lamports of quote reserves
    pub fn pool_size_bounds(&self) -> Result<(Option<u64>, Option<u64>), ConfigError> {
        let min = self
            .filters
            .min_pool_size_sol
            .map(sol_to_lamports)
            .transpose()?;
        let max = self
            .filters
            .max_pool_size_sol
            .map(sol_to_lamports)
            .transpose()?;
        Ok((min, max))
    }

    pub fn compute_budget(&self) -> ComputeBudgetSettings {
        ComputeBudgetSettings {
            unit_limit: self.executor.compute_unit_limit,
            unit_price_micro_lamports: self.executor.compute_unit_price_micro_lamports,
        }
    }

    pub fn standard_executor(&self) -> StandardExecutorConfig {
        StandardExecutorConfig::default()
    }

    pub fn relay_executor(&self) -> RelayConfig {
        RelayConfig {
            endpoint: self.executor.relay.endpoint.clone(),
            api_token: self.executor.relay.api_token.clone(),
            ..RelayConfig::default()
        }
    }

    pub fn bundle_executor(&self) -> Result<BundleConfig, ConfigError> {
        Ok(BundleConfig {
            block_engine_url: self.executor.bundle.block_engine_url.clone(),
            tip_lamports: sol_to_lamports(self.executor.bundle.tip_sol)?,
            api_token: self.executor.bundle.api_token.clone(),
            ..BundleConfig::default()
        })
    }
}
