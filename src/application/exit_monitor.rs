//! Exit Condition Monitor
//!
//! Polls the pool on a fixed interval after a buy confirms, re-quoting
//! what the held tokens would fetch and stopping on the first sample
//! past either exit threshold. The iteration budget is duration divided
//! by interval, floored; a failed quote burns an iteration but never
//! aborts the loop.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::quote::constant_product_out;
use crate::domain::{ExitSignal, ExitThresholds, PoolKeys};
use crate::ports::market_data::{MarketDataError, PoolInfoSource};

#[derive(Debug, Clone, Copy)]
pub struct ExitMonitorSettings {
    pub interval: Duration,
    pub duration: Duration,
}

impl ExitMonitorSettings {
    pub fn max_iterations(&self) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }
        (self.duration.as_millis() / self.interval.as_millis()) as u32
    }
}

impl Default for ExitMonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            duration: Duration::from_secs(600),
        }
    }
}

/// Why the monitor stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    TakeProfit { quoted: u64 },
    StopLoss { quoted: u64 },
    /// Budget exhausted with neither threshold crossed; the position
    /// stays open for wallet events or a later restart
    Expired,
}

impl MonitorOutcome {
    pub fn wants_sell(&self) -> bool {
        matches!(
            self,
            MonitorOutcome::TakeProfit { .. } | MonitorOutcome::StopLoss { .. }
        )
    }
}

pub struct ExitMonitor {
    pool_info: Arc<dyn PoolInfoSource>,
    settings: ExitMonitorSettings,
}

impl ExitMonitor {
    pub fn new(pool_info: Arc<dyn PoolInfoSource>, settings: ExitMonitorSettings) -> Self {
        Self {
            pool_info,
            settings,
        }
    }

    /// Watch one position until a threshold crossing or budget
    /// exhaustion.
    pub async fn watch(
        &self,
        keys: &PoolKeys,
        held_amount: u64,
        thresholds: &ExitThresholds,
    ) -> MonitorOutcome {
        let max_iterations = self.settings.max_iterations();

        for iteration in 1..=max_iterations {
            match self.quote_exit(keys, held_amount).await {
                Ok(quoted) => match thresholds.evaluate(quoted) {
                    ExitSignal::TakeProfit => {
                        debug!(mint = %keys.base_mint, quoted, iteration, "Take profit crossed");
                        return MonitorOutcome::TakeProfit { quoted };
                    }
                    ExitSignal::StopLoss => {
                        debug!(mint = %keys.base_mint, quoted, iteration, "Stop loss crossed");
                        return MonitorOutcome::StopLoss { quoted };
                    }
                    ExitSignal::Hold => {
                        debug!(
                            mint = %keys.base_mint,
                            quoted,
                            iteration,
                            of = max_iterations,
                            "Exit check"
                        );
                    }
                },
                Err(e) => {
                    // skipped sample, the budget still shrinks
                    warn!(
                        mint = %keys.base_mint,
                        iteration,
                        error = %e,
                        "Exit quote unavailable, skipping sample"
                    );
                }
            }

            if iteration < max_iterations {
                tokio::time::sleep(self.settings.interval).await;
            }
        }

        MonitorOutcome::Expired
    }

    async fn quote_exit(&self, keys: &PoolKeys, held_amount: u64) -> Result<u64, MarketDataError> {
        let reserves = self.pool_info.fetch_pool_info(keys).await?;
        constant_product_out(held_amount, reserves.base, reserves.quote)
            .ok_or_else(|| MarketDataError::Malformed("pool reserves are empty".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::{reserves_quoting, test_pool_keys, ScriptedPoolInfo};
    use rust_decimal_macros::dec;
    use solana_sdk::pubkey::Pubkey;

    const ONE_SOL: u64 = 1_000_000_000;
    const HELD: u64 = 1_000_000;

    fn settings(max_iterations: u32) -> ExitMonitorSettings {
        ExitMonitorSettings {
            interval: Duration::from_millis(2),
            duration: Duration::from_millis(2 * max_iterations as u64),
        }
    }

    /// take profit 50%, stop loss 30%, entry 1 SOL
    fn thresholds() -> ExitThresholds {
        ExitThresholds::from_entry(ONE_SOL, dec!(50), dec!(30))
    }

    fn scripted(targets: &[u64]) -> Arc<ScriptedPoolInfo> {
        let sequence = targets
            .iter()
            .map(|t| Ok(reserves_quoting(HELD, *t)))
            .collect();
        // fallback keeps quoting roughly the entry value
        let (base, quote) = reserves_quoting(HELD, ONE_SOL);
        Arc::new(ScriptedPoolInfo::fixed(base, quote).with_sequence(sequence))
    }

    #[test]
    fn test_iteration_budget_floors() {
        let settings = ExitMonitorSettings {
            interval: Duration::from_millis(300),
            duration: Duration::from_millis(1_000),
        };
        assert_eq!(settings.max_iterations(), 3);
    }

    #[tokio::test]
    async fn test_take_profit_stops_at_third_sample() {
        // quoted values 0.95, 1.1, 1.55 SOL against a 1.5 SOL take profit
        let source = scripted(&[
            950_000_000,
            1_100_000_000,
            1_550_000_000,
            2_000_000_000, // must never be sampled
        ]);
        let monitor = ExitMonitor::new(source.clone(), settings(10));
        let keys = test_pool_keys(Pubkey::new_unique());

        let outcome = monitor.watch(&keys, HELD, &thresholds()).await;
        assert!(matches!(outcome, MonitorOutcome::TakeProfit { quoted } if quoted > 1_500_000_000));
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_stop_loss_stops_at_second_sample() {
        // 0.95 then 0.65 SOL against a 0.7 SOL stop loss
        let source = scripted(&[950_000_000, 650_000_000, 2_000_000_000]);
        let monitor = ExitMonitor::new(source.clone(), settings(10));
        let keys = test_pool_keys(Pubkey::new_unique());

        let outcome = monitor.watch(&keys, HELD, &thresholds()).await;
        assert!(matches!(outcome, MonitorOutcome::StopLoss { quoted } if quoted < 700_000_000));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_returns_expired() {
        // every sample holds near entry, never crossing a threshold
        let source = scripted(&[]);
        let monitor = ExitMonitor::new(source.clone(), settings(4));
        let keys = test_pool_keys(Pubkey::new_unique());

        let outcome = monitor.watch(&keys, HELD, &thresholds()).await;
        assert_eq!(outcome, MonitorOutcome::Expired);
        assert!(!outcome.wants_sell());
        assert_eq!(source.fetch_count(), 4);
    }

    #[tokio::test]
    async fn test_quote_failures_consume_budget() {
        let (base, quote) = reserves_quoting(HELD, ONE_SOL);
        let source = Arc::new(ScriptedPoolInfo::fixed(base, quote).with_sequence(vec![
            Err("node down".to_string()),
            Err("node down".to_string()),
            Err("node down".to_string()),
        ]));
        let monitor = ExitMonitor::new(source.clone(), settings(3));
        let keys = test_pool_keys(Pubkey::new_unique());

        let outcome = monitor.watch(&keys, HELD, &thresholds()).await;
        assert_eq!(outcome, MonitorOutcome::Expired);
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_quote_then_crossing_still_exits() {
        let (tp_base, tp_quote) = reserves_quoting(HELD, 1_600_000_000);
        let source = Arc::new(ScriptedPoolInfo::fixed(1, 1).with_sequence(vec![
            Err("transient".to_string()),
            Ok((tp_base, tp_quote)),
        ]));
        let monitor = ExitMonitor::new(source.clone(), settings(5));
        let keys = test_pool_keys(Pubkey::new_unique());

        let outcome = monitor.watch(&keys, HELD, &thresholds()).await;
        assert!(outcome.wants_sell());
        assert_eq!(source.fetch_count(), 2);
    }
}
