//! Filter Chain
//!
//! Safety predicates over a candidate pool, combined with a
//! consecutive-match debounce: the gate re-evaluates the whole chain on a
//! fixed interval and only approves after N consecutive full passes inside
//! a bounded window. Bypass is an explicit, loudly-logged configuration
//! mode, never a silent default.

pub mod checks;

pub use checks::{FreezeAuthorityAbsent, LiquidityBurned, MintAuthorityRenounced, PoolSizeBounds};

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::PoolKeys;

/// Outcome of one predicate evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterVerdict {
    pub ok: bool,
    pub reason: Option<String>,
}

impl FilterVerdict {
    pub fn pass() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

/// A single safety predicate. Implementations that cannot read the data
/// they need return a failing verdict for that evaluation rather than an
/// error; the debounce loop absorbs transient read failures.
#[async_trait]
pub trait PoolFilter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, keys: &PoolKeys) -> FilterVerdict;
}

/// Whether the chain is live or explicitly disarmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Enforced,
    /// Every gate call approves immediately. For dry runs and debugging
    /// only; the gate logs a warning on every bypassed approval.
    Bypass,
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Enforced => f.write_str("enforced"),
            FilterMode::Bypass => f.write_str("bypass"),
        }
    }
}

/// Timing parameters for the consecutive-match gate
#[derive(Debug, Clone, Copy)]
pub struct GateSettings {
    pub interval: Duration,
    pub duration: Duration,
    pub consecutive_matches: u32,
}

impl GateSettings {
    /// Number of evaluations the window budgets for (floored)
    pub fn max_checks(&self) -> u32 {
        if self.interval.is_zero() {
            return 0;
        }
        (self.duration.as_millis() / self.interval.as_millis()) as u32
    }
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            duration: Duration::from_secs(60),
            consecutive_matches: 3,
        }
    }
}

/// Gate outcome; `checks_used` counts evaluations actually performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Approved { checks_used: u32 },
    Denied { checks_used: u32 },
}

impl GateDecision {
    pub fn is_approved(&self) -> bool {
        matches!(self, GateDecision::Approved { .. })
    }
}

/// Ordered set of predicates plus the bypass switch.
pub struct FilterChain {
    filters: Vec<Arc<dyn PoolFilter>>,
    mode: FilterMode,
}

impl FilterChain {
    pub fn new(mode: FilterMode) -> Self {
        Self {
            filters: Vec::new(),
            mode,
        }
    }

    pub fn push(mut self, filter: Arc<dyn PoolFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// One full evaluation: every predicate must pass. All failures are
    /// collected so the log shows the complete picture, not just the
    /// first miss.
    pub async fn evaluate(&self, keys: &PoolKeys) -> Vec<(&'static str, String)> {
        let mut failures = Vec::new();
        for filter in &self.filters {
            let verdict = filter.check(keys).await;
            if !verdict.ok {
                failures.push((
                    filter.name(),
                    verdict.reason.unwrap_or_else(|| "failed".to_string()),
                ));
            }
        }
        failures
    }

    /// Run the debounced gate: up to `max_checks` evaluations spaced
    /// `interval` apart, approving after `consecutive_matches` consecutive
    /// clean passes, denying when the window is exhausted. One failing
    /// evaluation resets the streak.
    pub async fn await_approval(&self, keys: &PoolKeys, settings: &GateSettings) -> GateDecision {
        if self.mode == FilterMode::Bypass {
            warn!(
                mint = %keys.base_mint,
                "Filter chain BYPASSED by configuration, no safety checks applied"
            );
            return GateDecision::Approved { checks_used: 0 };
        }
        if self.filters.is_empty() {
            debug!(mint = %keys.base_mint, "No filters configured, approving");
            return GateDecision::Approved { checks_used: 0 };
        }

        let max_checks = settings.max_checks();
        let mut streak = 0u32;

        for attempt in 1..=max_checks {
            let failures = self.evaluate(keys).await;
            if failures.is_empty() {
                streak += 1;
                debug!(
                    mint = %keys.base_mint,
                    streak,
                    needed = settings.consecutive_matches,
                    "Filter pass"
                );
                if streak >= settings.consecutive_matches {
                    return GateDecision::Approved {
                        checks_used: attempt,
                    };
                }
            } else {
                streak = 0;
                for (name, reason) in &failures {
                    debug!(mint = %keys.base_mint, filter = name, reason, "Filter fail");
                }
            }

            if attempt < max_checks {
                tokio::time::sleep(settings.interval).await;
            }
        }

        GateDecision::Denied {
            checks_used: max_checks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::test_pool_keys;
    use solana_sdk::pubkey::Pubkey;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Plays back a fixed pass/fail sequence, then passes forever
    struct ScriptedFilter {
        verdicts: Mutex<VecDeque<bool>>,
        evaluations: Mutex<u32>,
    }

    impl ScriptedFilter {
        fn new(sequence: &[bool]) -> Arc<Self> {
            Arc::new(Self {
                verdicts: Mutex::new(sequence.iter().copied().collect()),
                evaluations: Mutex::new(0),
            })
        }

        fn evaluations(&self) -> u32 {
            *self.evaluations.lock().unwrap()
        }
    }

    #[async_trait]
    impl PoolFilter for ScriptedFilter {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn check(&self, _keys: &PoolKeys) -> FilterVerdict {
            *self.evaluations.lock().unwrap() += 1;
            let pass = self.verdicts.lock().unwrap().pop_front().unwrap_or(true);
            if pass {
                FilterVerdict::pass()
            } else {
                FilterVerdict::fail("scripted fail")
            }
        }
    }

    fn fast_gate(max_checks: u32, consecutive: u32) -> GateSettings {
        GateSettings {
            interval: Duration::from_millis(2),
            duration: Duration::from_millis(2 * max_checks as u64),
            consecutive_matches: consecutive,
        }
    }

    #[test]
    fn test_max_checks_floors() {
        let settings = GateSettings {
            interval: Duration::from_millis(300),
            duration: Duration::from_millis(1_000),
            consecutive_matches: 1,
        };
        assert_eq!(settings.max_checks(), 3);
    }

    #[tokio::test]
    async fn test_fail_resets_streak_and_approves_only_at_final_pass() {
        // [pass, pass, fail, pass, pass, pass] with 3 required consecutive
        // passes approves exactly at the sixth evaluation
        let filter = ScriptedFilter::new(&[true, true, false, true, true, true]);
        let chain = FilterChain::new(FilterMode::Enforced).push(filter.clone());
        let keys = test_pool_keys(Pubkey::new_unique());

        let decision = chain.await_approval(&keys, &fast_gate(6, 3)).await;
        assert_eq!(decision, GateDecision::Approved { checks_used: 6 });
        assert_eq!(filter.evaluations(), 6);
    }

    #[tokio::test]
    async fn test_window_exhaustion_denies() {
        // streak can never reach 3 inside 4 checks with a fail at index 2
        let filter = ScriptedFilter::new(&[true, true, false, true]);
        let chain = FilterChain::new(FilterMode::Enforced).push(filter.clone());
        let keys = test_pool_keys(Pubkey::new_unique());

        let decision = chain.await_approval(&keys, &fast_gate(4, 3)).await;
        assert_eq!(decision, GateDecision::Denied { checks_used: 4 });
        assert_eq!(filter.evaluations(), 4);
    }

    #[tokio::test]
    async fn test_approves_as_soon_as_streak_reached() {
        let filter = ScriptedFilter::new(&[true, true]);
        let chain = FilterChain::new(FilterMode::Enforced).push(filter.clone());
        let keys = test_pool_keys(Pubkey::new_unique());

        let decision = chain.await_approval(&keys, &fast_gate(10, 2)).await;
        assert_eq!(decision, GateDecision::Approved { checks_used: 2 });
        // no further evaluations after approval
        assert_eq!(filter.evaluations(), 2);
    }

    #[tokio::test]
    async fn test_bypass_mode_skips_evaluation() {
        let filter = ScriptedFilter::new(&[false]);
        let chain = FilterChain::new(FilterMode::Bypass).push(filter.clone());
        let keys = test_pool_keys(Pubkey::new_unique());

        let decision = chain.await_approval(&keys, &fast_gate(3, 3)).await;
        assert!(decision.is_approved());
        assert_eq!(filter.evaluations(), 0);
    }

    #[tokio::test]
    async fn test_empty_chain_approves_immediately() {
        let chain = FilterChain::new(FilterMode::Enforced);
        let keys = test_pool_keys(Pubkey::new_unique());
        let decision = chain.await_approval(&keys, &fast_gate(3, 3)).await;
        assert_eq!(decision, GateDecision::Approved { checks_used: 0 });
    }

    #[tokio::test]
    async fn test_all_filters_must_pass_single_evaluation() {
        let good = ScriptedFilter::new(&[true]);
        let bad = ScriptedFilter::new(&[false]);
        let chain = FilterChain::new(FilterMode::Enforced)
            .push(good)
            .push(bad);
        let keys = test_pool_keys(Pubkey::new_unique());

        let failures = chain.evaluate(&keys).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "scripted");
    }
}
