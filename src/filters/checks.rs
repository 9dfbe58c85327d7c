//! Built-in safety predicates
//!
//! Each check reads token or vault state through the `TokenStateReader`
//! port and renders a verdict. Read failures deny the current evaluation
//! without aborting the gate; the debounce loop retries on its own
//! schedule.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::PoolKeys;
use crate::filters::{FilterVerdict, PoolFilter};
use crate::ports::market_data::TokenStateReader;

/// Passes when the base mint can no longer issue new supply.
pub struct MintAuthorityRenounced {
    reader: Arc<dyn TokenStateReader>,
}

impl MintAuthorityRenounced {
    pub fn new(reader: Arc<dyn TokenStateReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl PoolFilter for MintAuthorityRenounced {
    fn name(&self) -> &'static str {
        "mint_authority_renounced"
    }

    async fn check(&self, keys: &PoolKeys) -> FilterVerdict {
        match self.reader.mint_info(&keys.base_mint).await {
            Ok(info) if info.mint_authority.is_none() => FilterVerdict::pass(),
            Ok(_) => FilterVerdict::fail("mint authority still held"),
            Err(e) => FilterVerdict::fail(format!("mint read failed: {e}")),
        }
    }
}

/// Passes when token accounts cannot be frozen.
pub struct FreezeAuthorityAbsent {
    reader: Arc<dyn TokenStateReader>,
}

impl FreezeAuthorityAbsent {
    pub fn new(reader: Arc<dyn TokenStateReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl PoolFilter for FreezeAuthorityAbsent {
    fn name(&self) -> &'static str {
        "freeze_authority_absent"
    }

    async fn check(&self, keys: &PoolKeys) -> FilterVerdict {
        match self.reader.mint_info(&keys.base_mint).await {
            Ok(info) if info.freeze_authority.is_none() => FilterVerdict::pass(),
            Ok(_) => FilterVerdict::fail("freeze authority present"),
            Err(e) => FilterVerdict::fail(format!("mint read failed: {e}")),
        }
    }
}

/// Passes when the LP mint's circulating supply is zero, meaning the
/// creator burned their LP tokens and cannot pull liquidity.
pub struct LiquidityBurned {
    reader: Arc<dyn TokenStateReader>,
}

impl LiquidityBurned {
    pub fn new(reader: Arc<dyn TokenStateReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl PoolFilter for LiquidityBurned {
    fn name(&self) -> &'static str {
        "liquidity_burned"
    }

    async fn check(&self, keys: &PoolKeys) -> FilterVerdict {
        match self.reader.mint_info(&keys.lp_mint).await {
            Ok(info) if info.supply == 0 => FilterVerdict::pass(),
            Ok(info) => FilterVerdict::fail(format!("LP supply not burned: {}", info.supply)),
            Err(e) => FilterVerdict::fail(format!("LP mint read failed: {e}")),
        }
    }
}

/// Bounds the pool's quote-side deposit. Either bound may be absent.
pub struct PoolSizeBounds {
    reader: Arc<dyn TokenStateReader>,
    min_quote: Option<u64>,
    max_quote: Option<u64>,
}

impl PoolSizeBounds {
    pub fn new(
        reader: Arc<dyn TokenStateReader>,
        min_quote: Option<u64>,
        max_quote: Option<u64>,
    ) -> Self {
        Self {
            reader,
            min_quote,
            max_quote,
        }
    }
}

#[async_trait]
impl PoolFilter for PoolSizeBounds {
    fn name(&self) -> &'static str {
        "pool_size_bounds"
    }

    async fn check(&self, keys: &PoolKeys) -> FilterVerdict {
        let balance = match self.reader.token_balance(&keys.quote_vault).await {
            Ok(b) => b,
            Err(e) => return FilterVerdict::fail(format!("quote vault read failed: {e}")),
        };
        if let Some(min) = self.min_quote {
            if balance < min {
                return FilterVerdict::fail(format!("pool too small: {balance} < {min}"));
            }
        }
        if let Some(max) = self.max_quote {
            if balance > max {
                return FilterVerdict::fail(format!("pool too large: {balance} > {max}"));
            }
        }
        FilterVerdict::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::market_data::MintInfo;
    use crate::ports::mocks::{test_pool_keys, MockTokenReader};
    use solana_sdk::pubkey::Pubkey;

    fn renounced_mint() -> MintInfo {
        MintInfo {
            supply: 1_000_000,
            decimals: 6,
            mint_authority: None,
            freeze_authority: None,
        }
    }

    #[tokio::test]
    async fn test_mint_authority_renounced() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let reader = Arc::new(MockTokenReader::new().with_mint(keys.base_mint, renounced_mint()));

        let verdict = MintAuthorityRenounced::new(reader).check(&keys).await;
        assert!(verdict.ok);
    }

    #[tokio::test]
    async fn test_mint_authority_retained_fails() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let mut info = renounced_mint();
        info.mint_authority = Some(Pubkey::new_unique());
        let reader = Arc::new(MockTokenReader::new().with_mint(keys.base_mint, info));

        let verdict = MintAuthorityRenounced::new(reader).check(&keys).await;
        assert!(!verdict.ok);
        assert!(verdict.reason.unwrap().contains("authority"));
    }

    #[tokio::test]
    async fn test_freeze_authority_present_fails() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let mut info = renounced_mint();
        info.freeze_authority = Some(Pubkey::new_unique());
        let reader = Arc::new(MockTokenReader::new().with_mint(keys.base_mint, info));

        let verdict = FreezeAuthorityAbsent::new(reader).check(&keys).await;
        assert!(!verdict.ok);
    }

    #[tokio::test]
    async fn test_liquidity_burned_requires_zero_supply() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let mut lp = renounced_mint();
        lp.supply = 0;
        let reader = Arc::new(MockTokenReader::new().with_mint(keys.lp_mint, lp.clone()));
        assert!(LiquidityBurned::new(reader).check(&keys).await.ok);

        lp.supply = 5_000;
        let reader = Arc::new(MockTokenReader::new().with_mint(keys.lp_mint, lp));
        let verdict = LiquidityBurned::new(reader).check(&keys).await;
        assert!(!verdict.ok);
        assert!(verdict.reason.unwrap().contains("5000"));
    }

    #[tokio::test]
    async fn test_pool_size_within_bounds() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let reader =
            Arc::new(MockTokenReader::new().with_balance(keys.quote_vault, 50_000_000_000));

        let filter = PoolSizeBounds::new(reader, Some(10_000_000_000), Some(100_000_000_000));
        assert!(filter.check(&keys).await.ok);
    }

    #[tokio::test]
    async fn test_pool_size_out_of_bounds() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let reader = Arc::new(MockTokenReader::new().with_balance(keys.quote_vault, 5_000));

        let too_small = PoolSizeBounds::new(reader.clone(), Some(10_000), None);
        assert!(!too_small.check(&keys).await.ok);

        let too_large = PoolSizeBounds::new(reader, None, Some(1_000));
        assert!(!too_large.check(&keys).await.ok);
    }

    #[tokio::test]
    async fn test_pool_size_unbounded_when_no_limits() {
        let keys = test_pool_keys(Pubkey::new_unique());
        let reader = Arc::new(MockTokenReader::new().with_balance(keys.quote_vault, 1));
        let filter = PoolSizeBounds::new(reader, None, None);
        assert!(filter.check(&keys).await.ok);
    }

    #[tokio::test]
    async fn test_read_failure_denies_evaluation() {
        let keys = test_pool_keys(Pubkey::new_unique());
        // reader knows nothing, every mint_info call errors
        let reader = Arc::new(MockTokenReader::new());

        let verdict = MintAuthorityRenounced::new(reader).check(&keys).await;
        assert!(!verdict.ok);
        assert!(verdict.reason.unwrap().contains("read failed"));
    }
}
