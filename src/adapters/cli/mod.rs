//! CLI Adapter
//!
//! Command-line interface definitions, parsed with clap derive macros.

mod commands;

pub use commands::{CheckConfigCmd, CliApp, Command, RunCmd, WalletCmd};
