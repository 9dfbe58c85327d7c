//! Async facade over the blocking Solana RPC client.
//!
//! Every call hops through `spawn_blocking`; the sync client stays behind
//! an `Arc` so clones share one connection pool. This is also where the
//! `PoolInfoSource` and `TokenStateReader` ports meet the chain.

use async_trait::async_trait;
use chrono::Utc;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use solana_transaction_status::TransactionStatus;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{PoolKeys, ReserveSnapshot};
use crate::ports::executor::{BlockhashProvider, ExecutorError};
use crate::ports::market_data::{MarketDataError, MintInfo, PoolInfoSource, TokenStateReader};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error("account not found: {0}")]
    NotFound(Pubkey),
    #[error("malformed account data: {0}")]
    Malformed(String),
}

/// Shared RPC gateway. Cloning is cheap and all clones hit the same
/// underlying client.
#[derive(Clone)]
pub struct RpcGateway {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcGateway {
    pub fn new(rpc_url: String, commitment: CommitmentConfig) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, commitment));
        Self { client, commitment }
    }

    pub async fn get_latest_blockhash(&self) -> Result<Hash, GatewayError> {
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .get_latest_blockhash()
                .map_err(|e| GatewayError::Rpc(e.to_string()))
        })
        .await
        .map_err(|e| GatewayError::Rpc(format!("Task join error: {}", e)))?
    }

    /// Whether the network still accepts transactions built on this
    /// blockhash.
    pub async fn is_blockhash_valid(&self, blockhash: &Hash) -> Result<bool, GatewayError> {
        let client = Arc::clone(&self.client);
        let commitment = self.commitment;
        let blockhash = *blockhash;
        tokio::task::spawn_blocking(move || {
            client
                .is_blockhash_valid(&blockhash, commitment)
                .map_err(|e| GatewayError::Rpc(e.to_string()))
        })
        .await
        .map_err(|e| GatewayError::Rpc(format!("Task join error: {}", e)))?
    }

    /// Broadcast without preflight; confirmation is polled separately.
    pub async fn send_transaction_skip_preflight(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, GatewayError> {
        let client = Arc::clone(&self.client);
        let tx = transaction.clone();
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            max_retries: Some(0),
            ..Default::default()
        };
        tokio::task::spawn_blocking(move || {
            client
                .send_transaction_with_config(&tx, config)
                .map_err(|e| GatewayError::Rpc(e.to_string()))
        })
        .await
        .map_err(|e| GatewayError::Rpc(format!("Task join error: {}", e)))?
    }

    pub async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> Result<Vec<Option<TransactionStatus>>, GatewayError> {
        let client = Arc::clone(&self.client);
        let signatures = signatures.to_vec();
        tokio::task::spawn_blocking(move || {
            client
                .get_signature_statuses(&signatures)
                .map(|response| response.value)
                .map_err(|e| GatewayError::Rpc(e.to_string()))
        })
        .await
        .map_err(|e| GatewayError::Rpc(format!("Task join error: {}", e)))?
    }

    /// Raw account data, or `NotFound` when the account does not exist.
    pub async fn get_account_data(&self, pubkey: &Pubkey) -> Result<Vec<u8>, GatewayError> {
        let client = Arc::clone(&self.client);
        let commitment = self.commitment;
        let pubkey = *pubkey;
        tokio::task::spawn_blocking(move || {
            let response = client
                .get_account_with_commitment(&pubkey, commitment)
                .map_err(|e| GatewayError::Rpc(e.to_string()))?;
            match response.value {
                Some(account) => Ok(account.data),
                None => Err(GatewayError::NotFound(pubkey)),
            }
        })
        .await
        .map_err(|e| GatewayError::Rpc(format!("Task join error: {}", e)))?
    }

    pub async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, GatewayError> {
        let client = Arc::clone(&self.client);
        let pubkey = *pubkey;
        tokio::task::spawn_blocking(move || {
            client
                .get_balance(&pubkey)
                .map_err(|e| GatewayError::Rpc(e.to_string()))
        })
        .await
        .map_err(|e| GatewayError::Rpc(format!("Task join error: {}", e)))?
    }

    /// SPL token account balance; a missing account reads as zero.
    pub async fn token_account_amount(&self, account: &Pubkey) -> Result<u64, GatewayError> {
        match self.get_account_data(account).await {
            Ok(data) => {
                let state = spl_token::state::Account::unpack(&data)
                    .map_err(|e| GatewayError::Malformed(e.to_string()))?;
                Ok(state.amount)
            }
            Err(GatewayError::NotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }
}

pub(crate) fn decode_mint(data: &[u8]) -> Result<MintInfo, GatewayError> {
    let mint =
        spl_token::state::Mint::unpack(data).map_err(|e| GatewayError::Malformed(e.to_string()))?;
    Ok(MintInfo {
        supply: mint.supply,
        decimals: mint.decimals,
        mint_authority: mint.mint_authority.into(),
        freeze_authority: mint.freeze_authority.into(),
    })
}

fn to_market_data_error(e: GatewayError) -> MarketDataError {
    match e {
        GatewayError::NotFound(pubkey) => MarketDataError::AccountNotFound(pubkey),
        GatewayError::Malformed(msg) => MarketDataError::Malformed(msg),
        GatewayError::Rpc(msg) => MarketDataError::Unavailable(msg),
    }
}

#[async_trait]
impl PoolInfoSource for RpcGateway {
    async fn fetch_pool_info(&self, keys: &PoolKeys) -> Result<ReserveSnapshot, MarketDataError> {
        let base = self
            .token_account_amount(&keys.base_vault)
            .await
            .map_err(to_market_data_error)?;
        let quote = self
            .token_account_amount(&keys.quote_vault)
            .await
            .map_err(to_market_data_error)?;
        Ok(ReserveSnapshot {
            base,
            quote,
            taken_at: Utc::now().timestamp(),
        })
    }
}

#[async_trait]
impl BlockhashProvider for RpcGateway {
    async fn latest_blockhash(&self) -> Result<Hash, ExecutorError> {
        self.get_latest_blockhash()
            .await
            .map_err(|e| ExecutorError::Rpc(e.to_string()))
    }
}

#[async_trait]
impl TokenStateReader for RpcGateway {
    async fn mint_info(&self, mint: &Pubkey) -> Result<MintInfo, MarketDataError> {
        let data = self
            .get_account_data(mint)
            .await
            .map_err(to_market_data_error)?;
        decode_mint(&data).map_err(to_market_data_error)
    }

    async fn token_balance(&self, account: &Pubkey) -> Result<u64, MarketDataError> {
        self.token_account_amount(account)
            .await
            .map_err(to_market_data_error)
    }
}
