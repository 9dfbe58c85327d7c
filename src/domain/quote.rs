//! Constant-Product Quote Math
//!
//! Pure integer math over raw token amounts. All intermediate products go
//! through u128 so reserve-scale values cannot overflow.

pub const BPS_DENOMINATOR: u64 = 10_000;

/// Raydium AMM v4 swap fee, charged on the input side
pub const SWAP_FEE_BPS: u64 = 25;

/// Quoted output for swapping `amount_in` against a constant-product pool,
/// after the pool's input-side fee. Returns `None` when either reserve is
/// zero (no price exists).
pub fn constant_product_out(amount_in: u64, reserve_in: u64, reserve_out: u64) -> Option<u64> {
    if reserve_in == 0 || reserve_out == 0 {
        return None;
    }
    let amount_in = amount_in as u128;
    let fee_kept = (BPS_DENOMINATOR - SWAP_FEE_BPS) as u128;
    let amount_in_after_fee = amount_in * fee_kept / BPS_DENOMINATOR as u128;

    let numerator = amount_in_after_fee * reserve_out as u128;
    let denominator = reserve_in as u128 + amount_in_after_fee;
    Some((numerator / denominator) as u64)
}

/// Minimum acceptable output after applying a slippage tolerance:
/// `quoted_out * (1 - slippage_bps / 10000)`, floored. Slippage at or
/// above 10000 bps floors to zero.
pub fn apply_slippage(quoted_out: u64, slippage_bps: u64) -> u64 {
    let bps = slippage_bps.min(BPS_DENOMINATOR);
    let kept = (BPS_DENOMINATOR - bps) as u128;
    (quoted_out as u128 * kept / BPS_DENOMINATOR as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_reserves_have_no_price() {
        assert_eq!(constant_product_out(100, 0, 1_000), None);
        assert_eq!(constant_product_out(100, 1_000, 0), None);
    }

    #[test]
    fn test_zero_input_quotes_zero() {
        assert_eq!(constant_product_out(0, 1_000, 1_000), Some(0));
    }

    #[test]
    fn test_small_swap_tracks_spot_price() {
        // 1000 units into a deep 1:2 pool should come out close to 2000,
        // less the 25 bps fee and negligible price impact
        let out = constant_product_out(1_000, 1_000_000_000, 2_000_000_000).unwrap();
        assert_relative_eq!(out as f64, 2_000.0 * 0.9975, max_relative = 1e-3);
    }

    #[test]
    fn test_large_swap_has_price_impact() {
        // swapping an amount equal to the input reserve must return far
        // less than the spot-price projection
        let out = constant_product_out(1_000_000, 1_000_000, 2_000_000).unwrap();
        assert!(out < 2_000_000);
        // bounded below by roughly half the output reserve
        assert!(out > 900_000);
    }

    #[test]
    fn test_output_monotonic_in_input() {
        let small = constant_product_out(1_000, 1_000_000, 1_000_000).unwrap();
        let large = constant_product_out(10_000, 1_000_000, 1_000_000).unwrap();
        assert!(large > small);
    }

    #[test]
    fn test_no_overflow_at_reserve_scale() {
        let out = constant_product_out(u64::MAX / 2, u64::MAX, u64::MAX);
        assert!(out.is_some());
    }

    #[test]
    fn test_slippage_zero_keeps_full_quote() {
        assert_eq!(apply_slippage(123_456_789, 0), 123_456_789);
    }

    #[test]
    fn test_slippage_full_floors_to_zero() {
        assert_eq!(apply_slippage(123_456_789, BPS_DENOMINATOR), 0);
        assert_eq!(apply_slippage(123_456_789, BPS_DENOMINATOR + 500), 0);
    }

    #[test]
    fn test_slippage_formula_midrange() {
        // 1% of 1_000_000 is 10_000
        assert_eq!(apply_slippage(1_000_000, 100), 990_000);
        // 25% tolerance
        assert_eq!(apply_slippage(1_000_000, 2_500), 750_000);
    }

    #[test]
    fn test_slippage_floors_not_rounds() {
        // 999 * (10000-1) / 10000 = 998.9001 -> 998
        assert_eq!(apply_slippage(999, 1), 998);
    }
}
