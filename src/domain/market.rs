//! OpenBook Market State
//!
//! Fixed-offset view over the 388-byte serum v3 market account and the
//! cached market record kept until the matching pool shows up.

use solana_sdk::pubkey::Pubkey;

use super::pool::LayoutError;
use super::programs::MARKET_STATE_V3_LEN;

/// Byte offset of the quote mint inside the market state, used for
/// subscription memcmp filters
pub const QUOTE_MINT_OFFSET: usize = 85;

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&data[offset..offset + 32]);
    Pubkey::new_from_array(buf)
}

/// Decoded fields of an OpenBook market account.
///
/// The layout carries a 5-byte magic prefix and 7-byte suffix around the
/// packed struct; offsets below already account for the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketState {
    pub own_address: Pubkey,
    pub vault_signer_nonce: u64,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub event_queue: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
}

impl MarketState {
    /// Decode from raw account data (little-endian fixed offsets).
    pub fn decode(data: &[u8]) -> Result<Self, LayoutError> {
        if data.len() != MARKET_STATE_V3_LEN {
            return Err(LayoutError::Length {
                expected: MARKET_STATE_V3_LEN,
                actual: data.len(),
            });
        }

        Ok(Self {
            own_address: read_pubkey(data, 13),
            vault_signer_nonce: read_u64(data, 45),
            base_mint: read_pubkey(data, 53),
            quote_mint: read_pubkey(data, QUOTE_MINT_OFFSET),
            base_vault: read_pubkey(data, 117),
            quote_vault: read_pubkey(data, 165),
            event_queue: read_pubkey(data, 253),
            bids: read_pubkey(data, 285),
            asks: read_pubkey(data, 317),
        })
    }
}

/// Cached record for a market, written once per market id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRecord {
    pub market_id: Pubkey,
    pub bids: Pubkey,
    pub asks: Pubkey,
    pub event_queue: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub vault_signer_nonce: u64,
}

impl MarketRecord {
    /// Build the record from a decoded market account. `market_id` is the
    /// account address the update was delivered for; on well-formed
    /// accounts it matches `state.own_address`.
    pub fn from_state(market_id: Pubkey, state: &MarketState) -> Self {
        Self {
            market_id,
            bids: state.bids,
            asks: state.asks,
            event_queue: state.event_queue,
            base_vault: state.base_vault,
            quote_vault: state.quote_vault,
            vault_signer_nonce: state.vault_signer_nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_u64(data: &mut [u8], offset: usize, value: u64) {
        data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    fn write_pubkey(data: &mut [u8], offset: usize, value: &Pubkey) {
        data[offset..offset + 32].copy_from_slice(value.as_ref());
    }

    #[test]
    fn test_decode_round_trip() {
        let own = Pubkey::new_unique();
        let quote = Pubkey::new_unique();
        let bids = Pubkey::new_unique();
        let asks = Pubkey::new_unique();
        let event_queue = Pubkey::new_unique();

        let mut data = vec![0u8; MARKET_STATE_V3_LEN];
        write_pubkey(&mut data, 13, &own);
        write_u64(&mut data, 45, 3);
        write_pubkey(&mut data, 85, &quote);
        write_pubkey(&mut data, 253, &event_queue);
        write_pubkey(&mut data, 285, &bids);
        write_pubkey(&mut data, 317, &asks);

        let state = MarketState::decode(&data).unwrap();
        assert_eq!(state.own_address, own);
        assert_eq!(state.vault_signer_nonce, 3);
        assert_eq!(state.quote_mint, quote);
        assert_eq!(state.event_queue, event_queue);
        assert_eq!(state.bids, bids);
        assert_eq!(state.asks, asks);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let err = MarketState::decode(&[0u8; 400]).unwrap_err();
        assert!(matches!(err, LayoutError::Length { expected: 388, .. }));
    }

    #[test]
    fn test_record_from_state() {
        let mut data = vec![0u8; MARKET_STATE_V3_LEN];
        let bids = Pubkey::new_unique();
        write_pubkey(&mut data, 285, &bids);
        write_u64(&mut data, 45, 1);

        let state = MarketState::decode(&data).unwrap();
        let market_id = Pubkey::new_unique();
        let record = MarketRecord::from_state(market_id, &state);
        assert_eq!(record.market_id, market_id);
        assert_eq!(record.bids, bids);
        assert_eq!(record.vault_signer_nonce, 1);
    }
}
