//! Keyed Stores
//!
//! Process-lifetime caches for pool and market records plus the
//! file-backed allow-list. No eviction: volume is bounded by the actual
//! pool-creation rate upstream. Writes are insert-if-absent so concurrent
//! event delivery cannot clobber an existing record.

pub mod allow_list;

pub use allow_list::AllowList;

use std::collections::HashMap;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use tokio::sync::RwLock;

use crate::domain::{MarketRecord, PoolRecord};

/// Pool records keyed by token mint. Written at most once per mint.
#[derive(Debug, Clone, Default)]
pub struct PoolCache {
    pools: Arc<RwLock<HashMap<Pubkey, PoolRecord>>>,
}

impl PoolCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert if absent. Returns false (and leaves the existing record
    /// untouched) when the mint is already cached.
    pub async fn save(&self, record: PoolRecord) -> bool {
        let mut pools = self.pools.write().await;
        if pools.contains_key(&record.token_mint) {
            return false;
        }
        pools.insert(record.token_mint, record);
        true
    }

    pub async fn get(&self, token_mint: &Pubkey) -> Option<PoolRecord> {
        self.pools.read().await.get(token_mint).cloned()
    }

    pub async fn contains(&self, token_mint: &Pubkey) -> bool {
        self.pools.read().await.contains_key(token_mint)
    }

    pub async fn len(&self) -> usize {
        self.pools.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pools.read().await.is_empty()
    }
}

/// Market records keyed by market id. First write wins; records are
/// immutable once stored.
#[derive(Debug, Clone, Default)]
pub struct MarketCache {
    markets: Arc<RwLock<HashMap<Pubkey, MarketRecord>>>,
}

impl MarketCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert if absent. Returns false for an already-cached market id.
    pub async fn save(&self, record: MarketRecord) -> bool {
        let mut markets = self.markets.write().await;
        if markets.contains_key(&record.market_id) {
            return false;
        }
        markets.insert(record.market_id, record);
        true
    }

    pub async fn get(&self, market_id: &Pubkey) -> Option<MarketRecord> {
        self.markets.read().await.get(market_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.markets.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReserveSnapshot;
    use crate::ports::mocks::test_pool_keys;

    fn record_for(mint: Pubkey) -> PoolRecord {
        PoolRecord::new(
            test_pool_keys(mint),
            ReserveSnapshot {
                base: 1,
                quote: 2,
                taken_at: 0,
            },
        )
    }

    fn market_for(id: Pubkey) -> MarketRecord {
        MarketRecord {
            market_id: id,
            bids: Pubkey::new_unique(),
            asks: Pubkey::new_unique(),
            event_queue: Pubkey::new_unique(),
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            vault_signer_nonce: 1,
        }
    }

    #[test]
    fn test_pool_cache_save_and_get() {
        tokio_test::block_on(async {
            let cache = PoolCache::new();
            let mint = Pubkey::new_unique();
            assert!(cache.get(&mint).await.is_none());

            assert!(cache.save(record_for(mint)).await);
            let found = cache.get(&mint).await.unwrap();
            assert_eq!(found.token_mint, mint);
            assert_eq!(cache.len().await, 1);
        });
    }

    #[test]
    fn test_pool_cache_write_once() {
        tokio_test::block_on(async {
            let cache = PoolCache::new();
            let mint = Pubkey::new_unique();
            let first = record_for(mint);
            let first_pool = first.pool_account;
            assert!(cache.save(first).await);

            // second write for the same mint is refused
            assert!(!cache.save(record_for(mint)).await);
            assert_eq!(cache.len().await, 1);
            // and the original record survives
            assert_eq!(cache.get(&mint).await.unwrap().pool_account, first_pool);
        });
    }

    #[test]
    fn test_market_cache_first_write_wins() {
        tokio_test::block_on(async {
            let cache = MarketCache::new();
            let id = Pubkey::new_unique();
            let first = market_for(id);
            let first_bids = first.bids;

            assert!(cache.save(first).await);
            assert!(!cache.save(market_for(id)).await);
            assert_eq!(cache.get(&id).await.unwrap().bids, first_bids);
        });
    }

    #[tokio::test]
    async fn test_caches_are_independent_clones() {
        let cache = PoolCache::new();
        let view = cache.clone();
        let mint = Pubkey::new_unique();
        cache.save(record_for(mint)).await;
        // clone shares the underlying store
        assert!(view.contains(&mint).await);
    }
}
