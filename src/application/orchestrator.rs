//! Trade Orchestrator
//!
//! Consumes the decoded account-event feed and drives each token mint
//! through its lifecycle: filter gate, bounded buy retries, holding with a
//! concurrent exit monitor, and a sell path shared by monitor exits and
//! wallet-balance triggers. State is tracked per mint and `Closed` is
//! final, so a duplicate pool event can never double-buy.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use solana_sdk::message::{v0, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use spl_associated_token_account::get_associated_token_address;
use thiserror::Error;
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, error, info, warn};

use crate::adapters::solana::WalletManager;
use crate::cache::{AllowList, MarketCache, PoolCache};
use crate::domain::{
    programs, ExitThresholds, MarketRecord, MarketState, PoolKeys, PoolRecord, PoolState,
    TradeAttempt, TradeDirection, TradeState,
};
use crate::filters::{FilterChain, GateSettings};
use crate::ports::executor::{BlockhashProvider, ExecutionReceipt, ExecutorError};
use crate::ports::{
    AccountEvent, EventReceiver, PoolInfoSource, TokenStateReader, TradeLogEntry, TradeLogKind,
    TradeLogSink, TransactionExecutor,
};
use crate::swap::{SwapBuildError, SwapBuilder, SwapPlan};

use super::exit_monitor::{ExitMonitor, ExitMonitorSettings, MonitorOutcome};

/// Trade-loop knobs, resolved from config once at startup.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Lamports of quote token spent per buy
    pub quote_amount: u64,
    pub buy_slippage_bps: u64,
    pub sell_slippage_bps: u64,
    pub max_buy_retries: u32,
    pub max_sell_retries: u32,
    /// Serialize submissions so at most one swap is in flight at a time
    pub one_token_at_a_time: bool,
    pub gate: GateSettings,
    pub exit: ExitMonitorSettings,
    pub take_profit_pct: Decimal,
    pub stop_loss_pct: Decimal,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            quote_amount: 100_000_000,
            buy_slippage_bps: 1_500,
            sell_slippage_bps: 1_500,
            max_buy_retries: 3,
            max_sell_retries: 3,
            one_token_at_a_time: true,
            gate: GateSettings::default(),
            exit: ExitMonitorSettings::default(),
            take_profit_pct: Decimal::from(50),
            stop_loss_pct: Decimal::from(30),
        }
    }
}

/// Everything the orchestrator talks to, bundled so construction sites
/// stay readable.
pub struct OrchestratorServices {
    pub wallet: Arc<WalletManager>,
    pub executor: Arc<dyn TransactionExecutor>,
    pub blockhash: Arc<dyn BlockhashProvider>,
    pub swap_builder: Arc<SwapBuilder>,
    pub pool_info: Arc<dyn PoolInfoSource>,
    pub token_reader: Arc<dyn TokenStateReader>,
    pub filter_chain: Arc<FilterChain>,
    pub pool_cache: PoolCache,
    pub market_cache: MarketCache,
    pub allow_list: Option<Arc<AllowList>>,
    pub trade_log: Arc<dyn TradeLogSink>,
}

/// Why a single swap attempt failed. Every variant consumes one retry.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Build(#[from] SwapBuildError),

    #[error(transparent)]
    Execute(#[from] ExecutorError),

    #[error("Transaction assembly failed: {0}")]
    Assemble(String),

    #[error("Not confirmed: {0}")]
    Unconfirmed(String),

    #[error("Execution slot closed")]
    SlotClosed,
}

/// Per-mint state counts for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrchestratorStatus {
    pub tracked: usize,
    pub filtering: usize,
    pub buying: usize,
    pub holding: usize,
    pub selling: usize,
    pub closed: usize,
}

pub struct TradeOrchestrator {
    settings: OrchestratorSettings,
    wallet: Arc<WalletManager>,
    executor: Arc<dyn TransactionExecutor>,
    blockhash: Arc<dyn BlockhashProvider>,
    swap_builder: Arc<SwapBuilder>,
    pool_info: Arc<dyn PoolInfoSource>,
    token_reader: Arc<dyn TokenStateReader>,
    filter_chain: Arc<FilterChain>,
    pool_cache: PoolCache,
    market_cache: MarketCache,
    allow_list: Option<Arc<AllowList>>,
    trade_log: Arc<dyn TradeLogSink>,
    states: Arc<RwLock<HashMap<Pubkey, TradeState>>>,
    /// Present only when `one_token_at_a_time` is set; held strictly
    /// around submit-and-await so filtering and building stay concurrent
    execution_slot: Option<Arc<Semaphore>>,
}

impl TradeOrchestrator {
    pub fn new(settings: OrchestratorSettings, services: OrchestratorServices) -> Self {
        let execution_slot = settings
            .one_token_at_a_time
            .then(|| Arc::new(Semaphore::new(1)));
        Self {
            settings,
            wallet: services.wallet,
            executor: services.executor,
            blockhash: services.blockhash,
            swap_builder: services.swap_builder,
            pool_info: services.pool_info,
            token_reader: services.token_reader,
            filter_chain: services.filter_chain,
            pool_cache: services.pool_cache,
            market_cache: services.market_cache,
            allow_list: services.allow_list,
            trade_log: services.trade_log,
            states: Arc::new(RwLock::new(HashMap::new())),
            execution_slot,
        }
    }

    /// Drain the event feed until the channel closes. Pool and wallet
    /// events are handled on their own tasks because they block on filter
    /// windows and confirmation waits; market events are a cache write.
    pub async fn run(self: Arc<Self>, mut events: EventReceiver) {
        info!(
            executor = self.executor.name(),
            one_token_at_a_time = self.settings.one_token_at_a_time,
            "Trade orchestrator started"
        );
        while let Some(event) = events.recv().await {
            match event {
                AccountEvent::Market { account, state } => {
                    self.handle_market(account, state).await;
                }
                AccountEvent::Pool { account, state } => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        this.handle_new_pool(account, state).await;
                    });
                }
                AccountEvent::WalletToken {
                    account,
                    mint,
                    amount,
                } => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        this.handle_wallet_token(account, mint, amount).await;
                    });
                }
            }
        }
        info!("Event feed closed, orchestrator stopping");
    }

    async fn handle_market(&self, account: Pubkey, state: MarketState) {
        if self
            .market_cache
            .save(MarketRecord::from_state(account, &state))
            .await
        {
            debug!(market = %account, "Market cached");
        }
    }

    /// Full pipeline for one pool-creation event: claim the mint, run the
    /// sanity checks and the filter gate, then buy with bounded retries.
    pub async fn handle_new_pool(self: &Arc<Self>, account: Pubkey, state: PoolState) {
        let mint = state.base_mint;

        if mint == programs::WSOL_MINT {
            debug!(pool = %account, "Pool has WSOL on the base side, skipping");
            return;
        }

        if !self.claim_mint(&mint).await {
            debug!(%mint, "Pool event for an already-tracked mint, ignoring");
            return;
        }

        if !state.allows_swaps() {
            info!(%mint, status = state.status, "Pool status does not allow swaps");
            self.set_state(&mint, TradeState::Closed).await;
            return;
        }

        let now = Utc::now().timestamp().max(0) as u64;
        if !state.is_open_at(now) {
            info!(%mint, opens_at = state.pool_open_time, "Pool opens in the future, skipping");
            self.set_state(&mint, TradeState::Closed).await;
            return;
        }

        if let Some(allow_list) = &self.allow_list {
            if !allow_list.is_empty().await && !allow_list.is_allowed(&mint).await {
                info!(%mint, "Mint is not on the allow-list");
                self.set_state(&mint, TradeState::Closed).await;
                return;
            }
        }

        let Some(market) = self.market_cache.get(&state.market_id).await else {
            // without market keys no swap can be built; drop the claim so
            // a later pool event can retry once the market record arrives
            error!(%mint, market = %state.market_id, "Market data missing, buy aborted");
            self.trade_log.emit(
                TradeLogEntry::new(
                    TradeLogKind::Error,
                    format!("Market data missing for market {}", state.market_id),
                )
                .with_mint(&mint),
            );
            self.release_mint(&mint).await;
            return;
        };

        let keys = match PoolKeys::assemble(account, &state, &market) {
            Ok(keys) => keys,
            Err(e) => {
                error!(%mint, error = %e, "Pool key assembly failed");
                self.set_state(&mint, TradeState::Closed).await;
                return;
            }
        };

        info!(%mint, pool = %account, market = %state.market_id, "Evaluating new pool");
        self.trade_log
            .emit(TradeLogEntry::new(TradeLogKind::Info, "New pool detected").with_mint(&mint));

        let decision = self
            .filter_chain
            .await_approval(&keys, &self.settings.gate)
            .await;
        if !decision.is_approved() {
            info!(%mint, ?decision, "Filter gate denied pool");
            self.trade_log.emit(
                TradeLogEntry::new(TradeLogKind::Info, "Filter gate denied pool").with_mint(&mint),
            );
            self.set_state(&mint, TradeState::Closed).await;
            return;
        }

        self.set_state(&mint, TradeState::Buying).await;
        match self
            .run_swap_retries(
                &keys,
                TradeDirection::Buy,
                self.settings.quote_amount,
                self.settings.buy_slippage_bps,
                self.settings.max_buy_retries,
            )
            .await
        {
            Some((receipt, plan)) => {
                if !self
                    .pool_cache
                    .save(PoolRecord::new(keys.clone(), plan.reserves))
                    .await
                {
                    warn!(%mint, "Pool record already present, keeping the original");
                }
                self.set_state(&mint, TradeState::Holding).await;
                self.trade_log.emit(
                    TradeLogEntry::new(
                        TradeLogKind::Buy,
                        format!(
                            "Bought for {} lamports, expecting about {} tokens",
                            plan.amount_in, plan.quoted_out
                        ),
                    )
                    .with_mint(&mint)
                    .with_signature(receipt.signature.clone()),
                );
                self.spawn_exit_monitor(keys, plan.quoted_out);
            }
            None => {
                error!(%mint, retries = self.settings.max_buy_retries, "Buy retries exhausted");
                self.trade_log.emit(
                    TradeLogEntry::new(TradeLogKind::Error, "Buy retries exhausted")
                        .with_mint(&mint),
                );
                self.set_state(&mint, TradeState::Closed).await;
            }
        }
    }

    /// A balance change on one of the wallet's token accounts. Quote-side
    /// churn from our own swaps is ignored; a balance on a held mint
    /// triggers the sell path.
    pub async fn handle_wallet_token(self: &Arc<Self>, account: Pubkey, mint: Pubkey, amount: u64) {
        if mint == programs::WSOL_MINT {
            return;
        }
        if self.state_of(&mint).await != Some(TradeState::Holding) {
            debug!(%mint, token_account = %account, "Wallet event for a mint we do not hold, ignoring");
            return;
        }
        debug!(%mint, amount, token_account = %account, "Wallet balance event");
        self.initiate_sell(mint, Some(amount), "wallet event").await;
    }

    /// Shared sell path. `amount_hint` carries the balance reported by a
    /// wallet event; monitor-triggered sells re-read the token account.
    async fn initiate_sell(&self, mint: Pubkey, amount_hint: Option<u64>, trigger: &str) {
        let Some(record) = self.pool_cache.get(&mint).await else {
            debug!(%mint, "No pool record, nothing to sell");
            return;
        };

        let amount = match amount_hint {
            Some(amount) => amount,
            None => {
                let ata = get_associated_token_address(&self.wallet.pubkey(), &mint);
                match self.token_reader.token_balance(&ata).await {
                    Ok(amount) => amount,
                    Err(e) => {
                        error!(%mint, error = %e, "Balance read failed, sell postponed");
                        return;
                    }
                }
            }
        };

        if amount == 0 {
            debug!(%mint, trigger, "Zero balance, sell is a no-op");
            return;
        }

        if !self.try_transition(&mint, TradeState::Selling).await {
            debug!(%mint, trigger, "Sell already in flight or position closed");
            return;
        }

        info!(%mint, amount, trigger, "Starting sell");
        match self
            .run_swap_retries(
                &record.keys,
                TradeDirection::Sell,
                amount,
                self.settings.sell_slippage_bps,
                self.settings.max_sell_retries,
            )
            .await
        {
            Some((receipt, _plan)) => {
                self.trade_log.emit(
                    TradeLogEntry::new(
                        TradeLogKind::Sell,
                        format!("Sold {} tokens ({})", amount, trigger),
                    )
                    .with_mint(&mint)
                    .with_signature(receipt.signature.clone()),
                );
                self.set_state(&mint, TradeState::Closed).await;
            }
            None => {
                error!(%mint, retries = self.settings.max_sell_retries, "Sell retries exhausted, position stays open");
                self.trade_log.emit(
                    TradeLogEntry::new(
                        TradeLogKind::Error,
                        "Sell retries exhausted, position stays open",
                    )
                    .with_mint(&mint),
                );
                self.set_state(&mint, TradeState::Holding).await;
            }
        }
    }

    /// Bounded retry loop around [`Self::swap_attempt`]. Returns the first
    /// confirmed receipt, or `None` once the budget is spent.
    async fn run_swap_retries(
        &self,
        keys: &PoolKeys,
        direction: TradeDirection,
        amount_in: u64,
        slippage_bps: u64,
        max_retries: u32,
    ) -> Option<(ExecutionReceipt, SwapPlan)> {
        let mint = keys.base_mint;
        for retry_index in 0..max_retries {
            let attempt = TradeAttempt {
                direction,
                amount_in,
                slippage_bps,
                retry_index,
            };
            match self.swap_attempt(keys, &attempt).await {
                Ok((receipt, plan)) => {
                    info!(%mint, signature = %receipt.signature, "Confirmed {}", attempt);
                    return Some((receipt, plan));
                }
                Err(e) => {
                    warn!(%mint, error = %e, "Failed {}", attempt);
                    self.trade_log.emit(
                        TradeLogEntry::new(
                            TradeLogKind::Error,
                            format!("{} failed: {}", attempt, e),
                        )
                        .with_mint(&mint),
                    );
                }
            }
        }
        None
    }

    /// One attempt: quote and build against live reserves, sign with a
    /// fresh blockhash, submit, and wait for a terminal outcome. An
    /// unconfirmed receipt is an error here so the retry loop treats every
    /// non-confirmed outcome the same way.
    async fn swap_attempt(
        &self,
        keys: &PoolKeys,
        attempt: &TradeAttempt,
    ) -> Result<(ExecutionReceipt, SwapPlan), AttemptError> {
        let plan = self
            .swap_builder
            .build_swap(
                keys,
                attempt.direction,
                attempt.amount_in,
                attempt.slippage_bps,
                &self.wallet.pubkey(),
                self.executor.supplies_priority_fee(),
            )
            .await?;

        let blockhash = self.blockhash.latest_blockhash().await?;
        let message =
            v0::Message::try_compile(&self.wallet.pubkey(), &plan.instructions, &[], blockhash)
                .map_err(|e| AttemptError::Assemble(e.to_string()))?;
        let transaction =
            VersionedTransaction::try_new(VersionedMessage::V0(message), &[self.wallet.keypair()])
                .map_err(|e| AttemptError::Assemble(e.to_string()))?;

        let _slot = match &self.execution_slot {
            Some(slot) => Some(
                Arc::clone(slot)
                    .acquire_owned()
                    .await
                    .map_err(|_| AttemptError::SlotClosed)?,
            ),
            None => None,
        };
        let receipt = self
            .executor
            .execute_and_confirm(&transaction, self.wallet.keypair(), blockhash)
            .await?;

        if receipt.confirmed {
            Ok((receipt, plan))
        } else {
            let reason = receipt
                .error
                .unwrap_or_else(|| "no confirmation before expiry".to_string());
            Err(AttemptError::Unconfirmed(reason))
        }
    }

    /// Watch the position until a threshold crossing or budget exhaustion,
    /// then hand threshold crossings to the sell path.
    fn spawn_exit_monitor(self: &Arc<Self>, keys: PoolKeys, estimated_held: u64) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mint = keys.base_mint;
            let ata = get_associated_token_address(&this.wallet.pubkey(), &mint);
            let held = match this.token_reader.token_balance(&ata).await {
                Ok(amount) if amount > 0 => amount,
                Ok(_) => estimated_held,
                Err(e) => {
                    warn!(%mint, error = %e, "Balance read failed, monitoring the quoted buy amount");
                    estimated_held
                }
            };
            if held == 0 {
                debug!(%mint, "Nothing visible to monitor");
                return;
            }

            let thresholds = ExitThresholds::from_entry(
                this.settings.quote_amount,
                this.settings.take_profit_pct,
                this.settings.stop_loss_pct,
            );
            debug!(%mint, held, %thresholds, "Exit monitor started");
            let monitor = ExitMonitor::new(Arc::clone(&this.pool_info), this.settings.exit);
            match monitor.watch(&keys, held, &thresholds).await {
                MonitorOutcome::TakeProfit { quoted } => {
                    info!(%mint, quoted, "Take-profit threshold crossed");
                    this.initiate_sell(mint, None, "take profit").await;
                }
                MonitorOutcome::StopLoss { quoted } => {
                    info!(%mint, quoted, "Stop-loss threshold crossed");
                    this.initiate_sell(mint, None, "stop loss").await;
                }
                MonitorOutcome::Expired => {
                    info!(%mint, "Exit monitor budget exhausted, position stays open for wallet events");
                }
            }
        });
    }

    /// Reserve a mint for processing. Fails when the mint already has a
    /// lifecycle entry or a pool record from an earlier buy.
    async fn claim_mint(&self, mint: &Pubkey) -> bool {
        if self.pool_cache.contains(mint).await {
            return false;
        }
        let mut states = self.states.write().await;
        if states.contains_key(mint) {
            return false;
        }
        states.insert(*mint, TradeState::Filtering);
        true
    }

    async fn release_mint(&self, mint: &Pubkey) {
        self.states.write().await.remove(mint);
    }

    pub async fn state_of(&self, mint: &Pubkey) -> Option<TradeState> {
        self.states.read().await.get(mint).copied()
    }

    async fn set_state(&self, mint: &Pubkey, next: TradeState) {
        let mut states = self.states.write().await;
        let current = states.get(mint).copied();
        match current {
            Some(current) if current.can_transition(next) => {
                debug!(%mint, from = %current, to = %next, "Trade state transition");
                states.insert(*mint, next);
            }
            Some(current) => {
                warn!(%mint, from = %current, to = %next, "Illegal trade state transition ignored");
            }
            None => {
                warn!(%mint, to = %next, "State change for an untracked mint ignored");
            }
        }
    }

    /// Like [`Self::set_state`] but tells the caller whether the move was
    /// applied, which is how concurrent sell triggers stay idempotent.
    async fn try_transition(&self, mint: &Pubkey, next: TradeState) -> bool {
        let mut states = self.states.write().await;
        match states.get(mint).copied() {
            Some(current) if current.can_transition(next) => {
                debug!(%mint, from = %current, to = %next, "Trade state transition");
                states.insert(*mint, next);
                true
            }
            _ => false,
        }
    }

    pub async fn status(&self) -> OrchestratorStatus {
        let states = self.states.read().await;
        let mut status = OrchestratorStatus {
            tracked: states.len(),
            ..Default::default()
        };
        for state in states.values() {
            match state {
                TradeState::Idle | TradeState::Filtering => status.filtering += 1,
                TradeState::Buying => status.buying += 1,
                TradeState::Holding => status.holding += 1,
                TradeState::Selling => status.selling += 1,
                TradeState::Closed => status.closed += 1,
            }
        }
        status
    }
}
