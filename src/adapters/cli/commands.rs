//! CLI argument definitions.
//!
//! Parsing only; command handlers live in main. Uses clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kingfisher - new-pool sniper for Raydium AMM v4
#[derive(Parser, Debug)]
#[command(
    name = "kingfisher",
    version = env!("CARGO_PKG_VERSION"),
    about = "New-pool sniper for Raydium AMM v4 on Solana",
    long_about = "Kingfisher watches for freshly created Raydium AMM v4 pools, runs \
                  configurable safety filters, buys with a fixed WSOL amount, and \
                  exits on take-profit or stop-loss."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start sniping new pools
    Run(RunCmd),

    /// Validate the configuration and print the resolved settings
    CheckConfig(CheckConfigCmd),

    /// Show the trading wallet address and SOL balance
    Wallet(WalletCmd),
}

/// Start the sniper loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/kingfisher.toml")]
    pub config: PathBuf,
}

/// Validate configuration
#[derive(Parser, Debug)]
pub struct CheckConfigCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/kingfisher.toml")]
    pub config: PathBuf,
}

/// Inspect the trading wallet
#[derive(Parser, Debug)]
pub struct WalletCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/kingfisher.toml")]
    pub config: PathBuf,
}
