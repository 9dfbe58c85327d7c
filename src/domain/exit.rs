//! Exit Thresholds
//!
//! Take-profit / stop-loss bounds derived once per position from the entry
//! amount, and the comparison applied on every monitor iteration.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;

/// Outcome of comparing a re-quoted exit value against the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitSignal {
    /// Quoted value rose above the take-profit bound
    TakeProfit,
    /// Quoted value fell below the stop-loss bound
    StopLoss,
    /// Neither bound crossed
    Hold,
}

impl ExitSignal {
    pub fn is_exit(&self) -> bool {
        !matches!(self, ExitSignal::Hold)
    }
}

/// Absolute exit bounds in raw quote-token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitThresholds {
    pub take_profit_amount: u64,
    pub stop_loss_amount: u64,
}

impl ExitThresholds {
    /// Scale the entry amount by the configured percentages. A stop-loss
    /// above 100% clamps to zero rather than going negative.
    pub fn from_entry(entry_amount: u64, take_profit_pct: Decimal, stop_loss_pct: Decimal) -> Self {
        let entry = Decimal::from(entry_amount);
        let hundred = Decimal::from(100u32);

        let take_profit = entry * (hundred + take_profit_pct) / hundred;
        let stop_loss = (entry * (hundred - stop_loss_pct) / hundred).max(Decimal::ZERO);

        Self {
            take_profit_amount: take_profit.trunc().to_u64().unwrap_or(u64::MAX),
            stop_loss_amount: stop_loss.trunc().to_u64().unwrap_or(0),
        }
    }

    /// Strict comparison: equality with either bound holds the position.
    pub fn evaluate(&self, quoted_out: u64) -> ExitSignal {
        if quoted_out > self.take_profit_amount {
            ExitSignal::TakeProfit
        } else if quoted_out < self.stop_loss_amount {
            ExitSignal::StopLoss
        } else {
            ExitSignal::Hold
        }
    }
}

impl fmt::Display for ExitThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tp={} sl={}",
            self.take_profit_amount, self.stop_loss_amount
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ONE_SOL: u64 = 1_000_000_000;

    #[test]
    fn test_thresholds_from_entry() {
        let t = ExitThresholds::from_entry(ONE_SOL, dec!(50), dec!(30));
        assert_eq!(t.take_profit_amount, 1_500_000_000);
        assert_eq!(t.stop_loss_amount, 700_000_000);
    }

    #[test]
    fn test_take_profit_sequence() {
        let t = ExitThresholds::from_entry(ONE_SOL, dec!(50), dec!(30));
        assert_eq!(t.evaluate(950_000_000), ExitSignal::Hold);
        assert_eq!(t.evaluate(1_100_000_000), ExitSignal::Hold);
        assert_eq!(t.evaluate(1_550_000_000), ExitSignal::TakeProfit);
    }

    #[test]
    fn test_stop_loss_sequence() {
        let t = ExitThresholds::from_entry(ONE_SOL, dec!(50), dec!(30));
        assert_eq!(t.evaluate(950_000_000), ExitSignal::Hold);
        assert_eq!(t.evaluate(650_000_000), ExitSignal::StopLoss);
    }

    #[test]
    fn test_bounds_are_strict() {
        let t = ExitThresholds::from_entry(ONE_SOL, dec!(50), dec!(30));
        assert_eq!(t.evaluate(1_500_000_000), ExitSignal::Hold);
        assert_eq!(t.evaluate(700_000_000), ExitSignal::Hold);
    }

    #[test]
    fn test_stop_loss_over_hundred_percent_clamps() {
        let t = ExitThresholds::from_entry(ONE_SOL, dec!(10), dec!(150));
        assert_eq!(t.stop_loss_amount, 0);
        // nothing quotes below zero, so the stop can never fire
        assert_eq!(t.evaluate(0), ExitSignal::Hold);
    }

    #[test]
    fn test_fractional_percentages() {
        let t = ExitThresholds::from_entry(ONE_SOL, dec!(12.5), dec!(7.5));
        assert_eq!(t.take_profit_amount, 1_125_000_000);
        assert_eq!(t.stop_loss_amount, 925_000_000);
    }

    #[test]
    fn test_is_exit() {
        assert!(ExitSignal::TakeProfit.is_exit());
        assert!(ExitSignal::StopLoss.is_exit());
        assert!(!ExitSignal::Hold.is_exit());
    }
}
