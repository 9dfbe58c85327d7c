use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::transaction::VersionedTransaction;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::domain::{programs, PoolKeys, ReserveSnapshot};

use super::executor::{BlockhashProvider, ExecutionReceipt, ExecutorError, TransactionExecutor};
use super::market_data::{MarketDataError, MintInfo, PoolInfoSource, TokenStateReader};
use super::trade_log::{TradeLogEntry, TradeLogKind, TradeLogSink};

/// Scripted outcome for one executor call
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Receipt with `confirmed = true`
    Confirm,
    /// Receipt with `confirmed = false` and the given error text
    Fail(String),
    /// Transport-level `ExecutorError::Rpc`
    Transport(String),
}

/// Entry/exit instants of one `execute_and_confirm` call
#[derive(Debug, Clone, Copy)]
pub struct ExecutionWindow {
    pub entered_at: Instant,
    pub exited_at: Instant,
}

impl ExecutionWindow {
    pub fn overlaps(&self, other: &ExecutionWindow) -> bool {
        self.entered_at < other.exited_at && other.entered_at < self.exited_at
    }
}

/// Mock executor that records call windows and plays back scripted
/// outcomes; once the script is exhausted it repeats its default outcome.
pub struct RecordingExecutor {
    script: Mutex<VecDeque<ScriptedOutcome>>,
    default_outcome: ScriptedOutcome,
    delay: Duration,
    windows: Arc<Mutex<Vec<ExecutionWindow>>>,
    priority_fee_managed: bool,
}

impl RecordingExecutor {
    /// Every call confirms
    pub fn confirming() -> Self {
        Self::with_default(ScriptedOutcome::Confirm)
    }

    /// Every call returns an unconfirmed receipt
    pub fn never_confirming() -> Self {
        Self::with_default(ScriptedOutcome::Fail("not confirmed".to_string()))
    }

    fn with_default(default_outcome: ScriptedOutcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_outcome,
            delay: Duration::ZERO,
            windows: Arc::new(Mutex::new(Vec::new())),
            priority_fee_managed: false,
        }
    }

    /// Builder: play these outcomes first, then fall back to the default
    pub fn with_script(self, outcomes: Vec<ScriptedOutcome>) -> Self {
        *self.script.lock().unwrap() = outcomes.into();
        self
    }

    /// Builder: hold each call open for `delay` (widens the recorded
    /// window so overlap checks are meaningful)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_priority_fee_managed(mut self, managed: bool) -> Self {
        self.priority_fee_managed = managed;
        self
    }

    pub fn call_count(&self) -> usize {
        self.windows.lock().unwrap().len()
    }

    pub fn windows(&self) -> Vec<ExecutionWindow> {
        self.windows.lock().unwrap().clone()
    }

    /// True when no two recorded call windows overlap
    pub fn windows_disjoint(&self) -> bool {
        let windows = self.windows();
        for (i, a) in windows.iter().enumerate() {
            for b in windows.iter().skip(i + 1) {
                if a.overlaps(b) {
                    return false;
                }
            }
        }
        true
    }
}

#[async_trait]
impl TransactionExecutor for RecordingExecutor {
    async fn execute_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        _wallet: &Keypair,
        _recent_blockhash: Hash,
    ) -> Result<ExecutionReceipt, ExecutorError> {
        let entered_at = Instant::now();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_outcome.clone());
        let exited_at = Instant::now();
        self.windows.lock().unwrap().push(ExecutionWindow {
            entered_at,
            exited_at,
        });

        let signature = transaction
            .signatures
            .first()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "mock-signature".to_string());

        match outcome {
            ScriptedOutcome::Confirm => Ok(ExecutionReceipt::confirmed(signature)),
            ScriptedOutcome::Fail(reason) => Ok(ExecutionReceipt::failed(signature, reason)),
            ScriptedOutcome::Transport(reason) => Err(ExecutorError::Rpc(reason)),
        }
    }

    fn supplies_priority_fee(&self) -> bool {
        self.priority_fee_managed
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Blockhash source handing out a distinct hash per call.
#[derive(Debug, Default)]
pub struct TestBlockhashes {
    issued: Arc<Mutex<usize>>,
}

impl TestBlockhashes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issued_count(&self) -> usize {
        *self.issued.lock().unwrap()
    }
}

#[async_trait]
impl BlockhashProvider for TestBlockhashes {
    async fn latest_blockhash(&self) -> Result<Hash, ExecutorError> {
        let mut issued = self.issued.lock().unwrap();
        *issued += 1;
        Ok(solana_sdk::hash::hash(&issued.to_le_bytes()))
    }
}

/// Mock reserve source that plays back a scripted sequence of reserve
/// pairs (or errors) and counts fetches; exhausted scripts repeat the
/// fallback pair.
pub struct ScriptedPoolInfo {
    script: Mutex<VecDeque<Result<(u64, u64), String>>>,
    fallback: (u64, u64),
    fetches: Arc<Mutex<usize>>,
}

impl ScriptedPoolInfo {
    pub fn fixed(base: u64, quote: u64) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: (base, quote),
            fetches: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_sequence(self, sequence: Vec<Result<(u64, u64), String>>) -> Self {
        *self.script.lock().unwrap() = sequence.into();
        self
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl PoolInfoSource for ScriptedPoolInfo {
    async fn fetch_pool_info(&self, _keys: &PoolKeys) -> Result<ReserveSnapshot, MarketDataError> {
        *self.fetches.lock().unwrap() += 1;
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.fallback));
        match next {
            Ok((base, quote)) => Ok(ReserveSnapshot {
                base,
                quote,
                taken_at: chrono::Utc::now().timestamp(),
            }),
            Err(reason) => Err(MarketDataError::Unavailable(reason)),
        }
    }
}

/// Reserve pair under which selling `held_amount` quotes to approximately
/// `target_out` (within a few raw units; callers compare against
/// thresholds far wider than that).
pub fn reserves_quoting(held_amount: u64, target_out: u64) -> (u64, u64) {
    let base = held_amount.saturating_mul(1_000);
    let after_fee = held_amount as u128 * 9_975 / 10_000;
    let quote = (target_out as u128 * (base as u128 + after_fee) / after_fee) as u64;
    (base, quote)
}

/// Mock token/mint reader with canned per-account answers.
#[derive(Debug, Default)]
pub struct MockTokenReader {
    mints: Mutex<HashMap<Pubkey, MintInfo>>,
    balances: Mutex<HashMap<Pubkey, u64>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockTokenReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mint(self, mint: Pubkey, info: MintInfo) -> Self {
        self.mints.lock().unwrap().insert(mint, info);
        self
    }

    pub fn with_balance(self, account: Pubkey, amount: u64) -> Self {
        self.balances.lock().unwrap().insert(account, amount);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenStateReader for MockTokenReader {
    async fn mint_info(&self, mint: &Pubkey) -> Result<MintInfo, MarketDataError> {
        self.calls.lock().unwrap().push(format!("mint_info:{}", mint));
        self.mints
            .lock()
            .unwrap()
            .get(mint)
            .copied()
            .ok_or(MarketDataError::AccountNotFound(*mint))
    }

    async fn token_balance(&self, token_account: &Pubkey) -> Result<u64, MarketDataError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("token_balance:{}", token_account));
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(token_account)
            .copied()
            .unwrap_or(0))
    }
}

/// Collecting trade-log sink for assertions.
#[derive(Debug, Default)]
pub struct MemoryTradeLog {
    entries: Arc<Mutex<Vec<TradeLogEntry>>>,
}

impl MemoryTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<TradeLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count_kind(&self, kind: TradeLogKind) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }
}

impl TradeLogSink for MemoryTradeLog {
    fn emit(&self, entry: TradeLogEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

/// Fully-populated key set for tests; addresses are unique per call.
pub fn test_pool_keys(token_mint: Pubkey) -> PoolKeys {
    PoolKeys {
        pool_account: Pubkey::new_unique(),
        authority: programs::RAYDIUM_AUTHORITY_V4,
        open_orders: Pubkey::new_unique(),
        target_orders: Pubkey::new_unique(),
        base_vault: Pubkey::new_unique(),
        quote_vault: Pubkey::new_unique(),
        base_mint: token_mint,
        quote_mint: programs::WSOL_MINT,
        lp_mint: Pubkey::new_unique(),
        base_decimals: 6,
        quote_decimals: 9,
        market_program: programs::OPENBOOK_PROGRAM,
        market_id: Pubkey::new_unique(),
        market_bids: Pubkey::new_unique(),
        market_asks: Pubkey::new_unique(),
        market_event_queue: Pubkey::new_unique(),
        market_base_vault: Pubkey::new_unique(),
        market_quote_vault: Pubkey::new_unique(),
        market_vault_signer: Pubkey::new_unique(),
    }
}
