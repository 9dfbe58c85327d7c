use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the pool a swap trades into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    /// Quote (WSOL) in, token out
    Buy,
    /// Token in, quote (WSOL) out
    Sell,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::Buy => "buy",
            TradeDirection::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One swap attempt inside a retry loop. Ephemeral: built per attempt,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeAttempt {
    pub direction: TradeDirection,
    pub amount_in: u64,
    pub slippage_bps: u64,
    /// Zero-based index within the bounded retry loop
    pub retry_index: u32,
}

impl fmt::Display for TradeAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempt {} (amount_in={}, slippage={}bps)",
            self.direction,
            self.retry_index + 1,
            self.amount_in,
            self.slippage_bps
        )
    }
}

/// Lifecycle of one token mint inside the orchestrator.
///
/// `Closed` is terminal; a denied filter gate moves a mint straight from
/// `Idle`/`Filtering` to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeState {
    Idle,
    Filtering,
    Buying,
    Holding,
    Selling,
    Closed,
}

impl TradeState {
    /// Whether moving to `next` is a legal transition.
    pub fn can_transition(&self, next: TradeState) -> bool {
        use TradeState::*;
        matches!(
            (self, next),
            (Idle, Filtering)
                | (Idle, Closed)
                | (Filtering, Buying)
                | (Filtering, Closed)
                | (Buying, Holding)
                | (Buying, Closed)
                | (Holding, Selling)
                | (Holding, Closed)
                | (Selling, Closed)
                | (Selling, Holding)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeState::Closed)
    }
}

impl fmt::Display for TradeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeState::Idle => "idle",
            TradeState::Filtering => "filtering",
            TradeState::Buying => "buying",
            TradeState::Holding => "holding",
            TradeState::Selling => "selling",
            TradeState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_display() {
        assert_eq!(TradeDirection::Buy.to_string(), "buy");
        assert_eq!(TradeDirection::Sell.to_string(), "sell");
    }

    #[test]
    fn test_attempt_display_is_one_based() {
        let attempt = TradeAttempt {
            direction: TradeDirection::Buy,
            amount_in: 100,
            slippage_bps: 1500,
            retry_index: 0,
        };
        assert!(attempt.to_string().contains("attempt 1"));
    }

    #[test]
    fn test_happy_path_transitions() {
        use TradeState::*;
        assert!(Idle.can_transition(Filtering));
        assert!(Filtering.can_transition(Buying));
        assert!(Buying.can_transition(Holding));
        assert!(Holding.can_transition(Selling));
        assert!(Selling.can_transition(Closed));
    }

    #[test]
    fn test_denial_and_failure_transitions() {
        use TradeState::*;
        assert!(Idle.can_transition(Closed));
        assert!(Filtering.can_transition(Closed));
        assert!(Buying.can_transition(Closed));
        // a failed sell returns the mint to holding
        assert!(Selling.can_transition(Holding));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        use TradeState::*;
        assert!(!Idle.can_transition(Buying));
        assert!(!Filtering.can_transition(Holding));
        assert!(!Closed.can_transition(Filtering));
        assert!(!Holding.can_transition(Buying));
    }

    #[test]
    fn test_terminal_state() {
        assert!(TradeState::Closed.is_terminal());
        assert!(!TradeState::Holding.is_terminal());
    }
}
