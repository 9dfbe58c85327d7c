#![allow(dead_code, unused_imports, unused_variables)]
//! Kingfisher - Raydium New-Pool Sniper Library
//!
//! Watches for freshly created Raydium AMM v4 pools, gates them through
//! configurable safety filters, buys with a fixed WSOL amount, and exits
//! on take-profit or stop-loss.
//!
//! # Modules
//!
//! - `domain`: Chain-format decoding, quote math, trade lifecycle types
//! - `ports`: Trait abstractions (executors, reserve reads, events, trade log)
//! - `cache`: Pool/market record stores and the file-backed allow-list
//! - `filters`: Pool safety checks and the debounced approval gate
//! - `swap`: Raydium swap instruction assembly and quoting
//! - `adapters`: External implementations (Solana RPC/WS, executors, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Trade orchestrator and exit monitor

pub mod adapters;
pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod filters;
pub mod ports;
pub mod swap;
