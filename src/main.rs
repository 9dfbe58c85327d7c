//! Kingfisher - Raydium new-pool sniper for Solana
//!
//! Watches for freshly created Raydium AMM v4 pools over a websocket feed,
//! gates them through configurable safety filters, buys with a fixed WSOL
//! amount, and exits on take-profit or stop-loss.

mod adapters;
mod application;
mod cache;
mod config;
mod domain;
mod filters;
mod ports;
mod swap;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::cli::{CheckConfigCmd, CliApp, Command, RunCmd, WalletCmd};
use crate::adapters::executor::build_executor;
use crate::adapters::solana::{AccountListener, RpcGateway, WalletManager};
use crate::application::{OrchestratorServices, TradeOrchestrator};
use crate::cache::{AllowList, MarketCache, PoolCache};
use crate::config::{load_config, Config};
use crate::domain::programs;
use crate::filters::checks::{
    FreezeAuthorityAbsent, LiquidityBurned, MintAuthorityRenounced, PoolSizeBounds,
};
use crate::filters::FilterChain;
use crate::ports::market_data::TokenStateReader;
use crate::ports::{event_channel, TracingTradeLog};
use crate::swap::SwapBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    match app.command {
        Command::Run(cmd) => run_command(cmd, app.verbose, app.debug).await,
        Command::CheckConfig(cmd) => check_config_command(cmd).await,
        Command::Wallet(cmd) => wallet_command(cmd, app.verbose, app.debug).await,
    }
}

/// CLI flags win over the configured level; RUST_LOG wins over both.
fn init_logging(verbose: bool, debug: bool, fallback: &str) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };

    fmt().with_env_filter(filter).with_target(false).init();
}

async fn run_command(cmd: RunCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_config(&cmd.config)
        .with_context(|| format!("Failed to load configuration from {}", cmd.config.display()))?;
    init_logging(verbose, debug, &config.logging.level);

    info!(config = %cmd.config.display(), "Starting kingfisher");

    let wallet = Arc::new(load_wallet(&config)?);
    info!(wallet = %wallet.pubkey(), "Wallet loaded");

    let settings = config.orchestrator_settings()?;
    let commitment = config.commitment()?;
    let gateway = RpcGateway::new(config.rpc.resolve_http_url(), commitment);

    match gateway.get_balance(&wallet.pubkey()).await {
        Ok(balance) => {
            info!(
                balance_sol = balance as f64 / 1e9,
                "Wallet balance checked"
            );
            if balance < settings.quote_amount {
                warn!(
                    balance,
                    quote_amount = settings.quote_amount,
                    "Balance below configured buy amount, buys will fail"
                );
            }
        }
        Err(e) => warn!(error = %e, "Could not read wallet balance at startup"),
    }

    let executor = build_executor(
        config.executor.kind,
        gateway.clone(),
        config.standard_executor(),
        config.relay_executor(),
        config.bundle_executor()?,
    )?;
    let rpc = Arc::new(gateway);

    let filter_chain = build_filter_chain(&config, rpc.clone())?;

    let allow_list = match config.filters.resolve_allow_list_path() {
        Some(path) => {
            let list = Arc::new(AllowList::new(path));
            let count = list.refresh().await;
            info!(count, "Allow-list loaded");
            let _refresh = Arc::clone(&list)
                .spawn_refresh(Duration::from_secs(config.filters.allow_list_refresh_secs));
            Some(list)
        }
        None => None,
    };

    let (sender, events) = event_channel();
    let listener = AccountListener::new(
        config.rpc.resolve_ws_url(),
        commitment,
        programs::WSOL_MINT,
        wallet.pubkey(),
        sender,
    );
    let handles = listener.spawn();

    let services = OrchestratorServices {
        wallet,
        executor,
        blockhash: rpc.clone(),
        swap_builder: Arc::new(SwapBuilder::new(rpc.clone(), config.compute_budget())),
        pool_info: rpc.clone(),
        token_reader: rpc,
        filter_chain: Arc::new(filter_chain),
        pool_cache: PoolCache::new(),
        market_cache: MarketCache::new(),
        allow_list,
        trade_log: Arc::new(TracingTradeLog::new()),
    };
    let orchestrator = Arc::new(TradeOrchestrator::new(settings, services));

    // Ctrl+C tears down the subscriptions; the orchestrator drains the
    // event channel and returns once the senders are gone.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        handles.shutdown();
    });

    Arc::clone(&orchestrator).run(events).await;

    let status = orchestrator.status().await;
    info!(?status, "Kingfisher stopped");
    Ok(())
}

async fn check_config_command(cmd: CheckConfigCmd) -> Result<()> {
    let config = load_config(&cmd.config)
        .with_context(|| format!("Failed to load configuration from {}", cmd.config.display()))?;
    let settings = config.orchestrator_settings()?;

    println!("Configuration OK: {}", cmd.config.display());
    println!("  Executor:    {}", config.executor.kind);
    println!(
        "  Buy:         {} lamports, {} bps slippage, {} retries",
        settings.quote_amount, settings.buy_slippage_bps, settings.max_buy_retries
    );
    println!(
        "  Sell:        {} bps slippage, {} retries",
        settings.sell_slippage_bps, settings.max_sell_retries
    );
    println!(
        "  Filters:     {} mode, {} consecutive passes, {:?} window",
        config.filters.mode, settings.gate.consecutive_matches, settings.gate.duration
    );
    println!(
        "  Exit:        +{}% / -{}%, {:?} window",
        settings.take_profit_pct, settings.stop_loss_pct, settings.exit.duration
    );
    match config.filters.resolve_allow_list_path() {
        Some(path) => println!("  Allow-list:  {}", path.display()),
        None => println!("  Allow-list:  disabled"),
    }
    Ok(())
}

async fn wallet_command(cmd: WalletCmd, verbose: bool, debug: bool) -> Result<()> {
    let config = load_config(&cmd.config)
        .with_context(|| format!("Failed to load configuration from {}", cmd.config.display()))?;
    init_logging(verbose, debug, "warn");

    let wallet = load_wallet(&config)?;
    let gateway = RpcGateway::new(config.rpc.resolve_http_url(), config.commitment()?);
    let balance = gateway
        .get_balance(&wallet.pubkey())
        .await
        .context("Failed to get balance")?;

    println!("Wallet: {}", wallet.pubkey());
    println!(
        "Balance: {} lamports ({:.4} SOL)",
        balance,
        balance as f64 / 1e9
    );
    Ok(())
}

fn load_wallet(config: &Config) -> Result<WalletManager> {
    let secret = config.wallet.resolve_private_key();
    let path = config.wallet.resolve_keypair_path();
    WalletManager::resolve(secret.as_deref(), path.as_deref()).context(
        "Failed to load wallet: set KF_PRIVATE_KEY or wallet.keypair_path in the config",
    )
}

fn build_filter_chain(config: &Config, reader: Arc<RpcGateway>) -> Result<FilterChain> {
    let reader: Arc<dyn TokenStateReader> = reader;
    let mut chain = FilterChain::new(config.filters.mode);

    if config.filters.require_mint_renounced {
        chain = chain.push(Arc::new(MintAuthorityRenounced::new(reader.clone())));
    }
    if config.filters.require_freeze_revoked {
        chain = chain.push(Arc::new(FreezeAuthorityAbsent::new(reader.clone())));
    }
    if config.filters.require_burned {
        chain = chain.push(Arc::new(LiquidityBurned::new(reader.clone())));
    }
    let (min, max) = config.pool_size_bounds()?;
    if min.is_some() || max.is_some() {
        chain = chain.push(Arc::new(PoolSizeBounds::new(reader, min, max)));
    }

    Ok(chain)
}
