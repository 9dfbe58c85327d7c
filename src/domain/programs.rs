//! Known Program Addresses
//!
//! Mainnet constants for the programs and mints the sniper interacts with:
//! the Raydium AMM v4 program and its fixed pool authority, the OpenBook
//! market program, and wrapped SOL.

use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

/// Raydium AMM v4 program
pub const RAYDIUM_AMM_V4: Pubkey = pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");

/// Raydium AMM v4 pool authority (shared across all v4 pools)
pub const RAYDIUM_AUTHORITY_V4: Pubkey = pubkey!("5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1");

/// OpenBook central limit order book program (serum v3 fork)
pub const OPENBOOK_PROGRAM: Pubkey = pubkey!("srmqPvymJeFKQ4zGQed1GFppgkRHL9kaELCbyksJtPX");

/// Wrapped SOL mint
pub const WSOL_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");

/// Serialized size of a Raydium AMM v4 pool state account
pub const POOL_STATE_V4_LEN: usize = 752;

/// Serialized size of an OpenBook market state account
pub const MARKET_STATE_V3_LEN: usize = 388;

/// Whether a mint is wrapped SOL
pub fn is_wsol(mint: &Pubkey) -> bool {
    *mint == WSOL_MINT
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_constants_parse_to_expected_strings() {
        assert_eq!(
            RAYDIUM_AMM_V4,
            Pubkey::from_str("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8").unwrap()
        );
        assert_eq!(
            WSOL_MINT,
            Pubkey::from_str("So11111111111111111111111111111111111111112").unwrap()
        );
    }

    #[test]
    fn test_is_wsol() {
        assert!(is_wsol(&WSOL_MINT));
        assert!(!is_wsol(&RAYDIUM_AMM_V4));
        assert!(!is_wsol(&Pubkey::new_unique()));
    }
}
