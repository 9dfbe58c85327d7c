//! WebSocket account listener.
//!
//! Three program subscriptions feed the orchestrator through one event
//! channel: new AMM pools paired against the configured quote mint, the
//! OpenBook markets those pools reference, and the wallet's own token
//! accounts. Each subscription runs in its own task and reconnects with
//! exponential backoff when the stream drops.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures_util::StreamExt;
use solana_account_decoder::{UiAccountData, UiAccountEncoding};
use solana_client::nonblocking::pubsub_client::PubsubClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::pool::{MARKET_PROGRAM_OFFSET, QUOTE_MINT_OFFSET};
use crate::domain::programs::{
    MARKET_STATE_V3_LEN, OPENBOOK_PROGRAM, POOL_STATE_V4_LEN, RAYDIUM_AMM_V4,
};
use crate::domain::{market, MarketState, PoolState};
use crate::ports::events::{AccountEvent, EventSender};

const RECONNECT_BASE_DELAY: Duration = Duration::from_secs(1);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// SPL token account layout constants used by the wallet subscription
const TOKEN_ACCOUNT_LEN: u64 = 165;
const TOKEN_ACCOUNT_OWNER_OFFSET: usize = 32;

pub struct AccountListener {
    ws_url: String,
    commitment: CommitmentConfig,
    quote_mint: Pubkey,
    wallet: Pubkey,
    sender: EventSender,
}

/// Handles for the spawned subscription tasks
pub struct ListenerHandles {
    handles: Vec<JoinHandle<()>>,
}

impl ListenerHandles {
    pub fn shutdown(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

impl AccountListener {
    pub fn new(
        ws_url: String,
        commitment: CommitmentConfig,
        quote_mint: Pubkey,
        wallet: Pubkey,
        sender: EventSender,
    ) -> Self {
        Self {
            ws_url,
            commitment,
            quote_mint,
            wallet,
            sender,
        }
    }

    /// Spawn all three subscription tasks.
    pub fn spawn(self) -> ListenerHandles {
        let pools = spawn_subscription(
            self.ws_url.clone(),
            self.commitment,
            RAYDIUM_AMM_V4,
            pool_filters(&self.quote_mint),
            self.sender.clone(),
            decode_pool_event,
            "pools",
        );
        let markets = spawn_subscription(
            self.ws_url.clone(),
            self.commitment,
            OPENBOOK_PROGRAM,
            market_filters(&self.quote_mint),
            self.sender.clone(),
            decode_market_event,
            "markets",
        );
        let wallet = spawn_subscription(
            self.ws_url,
            self.commitment,
            spl_token::id(),
            wallet_filters(&self.wallet),
            self.sender,
            decode_wallet_event,
            "wallet",
        );

        ListenerHandles {
            handles: vec![pools, markets, wallet],
        }
    }
}

pub(crate) fn pool_filters(quote_mint: &Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::DataSize(POOL_STATE_V4_LEN as u64),
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
            QUOTE_MINT_OFFSET,
            quote_mint.to_bytes().to_vec(),
        )),
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
            MARKET_PROGRAM_OFFSET,
            OPENBOOK_PROGRAM.to_bytes().to_vec(),
        )),
    ]
}

pub(crate) fn market_filters(quote_mint: &Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::DataSize(MARKET_STATE_V3_LEN as u64),
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
            market::QUOTE_MINT_OFFSET,
            quote_mint.to_bytes().to_vec(),
        )),
    ]
}

pub(crate) fn wallet_filters(owner: &Pubkey) -> Vec<RpcFilterType> {
    vec![
        RpcFilterType::DataSize(TOKEN_ACCOUNT_LEN),
        RpcFilterType::Memcmp(Memcmp::new_raw_bytes(
            TOKEN_ACCOUNT_OWNER_OFFSET,
            owner.to_bytes().to_vec(),
        )),
    ]
}

fn spawn_subscription(
    ws_url: String,
    commitment: CommitmentConfig,
    program: Pubkey,
    filters: Vec<RpcFilterType>,
    sender: EventSender,
    decode: fn(Pubkey, &[u8]) -> Option<AccountEvent>,
    label: &'static str,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut attempts = 0u32;
        loop {
            match run_stream(&ws_url, commitment, &program, &filters, &sender, decode, label).await
            {
                Ok(()) => {
                    // receiver gone, orchestrator shut down
                    info!(label, "Subscription closed");
                    return;
                }
                Err(e) => {
                    let delay = RECONNECT_BASE_DELAY
                        .saturating_mul(2u32.saturating_pow(attempts))
                        .min(RECONNECT_MAX_DELAY);
                    attempts = attempts.saturating_add(1);
                    warn!(label, error = %e, ?delay, "Subscription dropped, reconnecting");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    })
}

/// One connect-subscribe-drain cycle. `Ok` means the event receiver went
/// away; any transport failure is an `Err` so the caller can back off.
async fn run_stream(
    ws_url: &str,
    commitment: CommitmentConfig,
    program: &Pubkey,
    filters: &[RpcFilterType],
    sender: &EventSender,
    decode: fn(Pubkey, &[u8]) -> Option<AccountEvent>,
    label: &'static str,
) -> Result<(), String> {
    let client = PubsubClient::new(ws_url)
        .await
        .map_err(|e| format!("connect failed: {e}"))?;

    let (mut notifications, unsubscribe) = client
        .program_subscribe(
            program,
            Some(RpcProgramAccountsConfig {
                filters: Some(filters.to_vec()),
                account_config: RpcAccountInfoConfig {
                    encoding: Some(UiAccountEncoding::Base64),
                    commitment: Some(commitment),
                    data_slice: None,
                    min_context_slot: None,
                },
                with_context: Some(true),
                ..Default::default()
            }),
        )
        .await
        .map_err(|e| format!("subscribe failed: {e}"))?;

    info!(label, program = %program, "Subscribed");

    while let Some(response) = notifications.next().await {
        let keyed = response.value;
        let account = match Pubkey::from_str(&keyed.pubkey) {
            Ok(pk) => pk,
            Err(e) => {
                warn!(label, pubkey = %keyed.pubkey, error = %e, "Bad account key in notification");
                continue;
            }
        };
        let Some(data) = account_bytes(keyed.account.data) else {
            warn!(label, %account, "Notification carried undecodable account data");
            continue;
        };
        let Some(event) = decode(account, &data) else {
            debug!(label, %account, "Skipping undecodable account");
            continue;
        };
        if sender.send(event).is_err() {
            unsubscribe().await;
            return Ok(());
        }
    }

    unsubscribe().await;
    Err("stream ended".to_string())
}

fn account_bytes(data: UiAccountData) -> Option<Vec<u8>> {
    match data {
        UiAccountData::Binary(encoded, _) => BASE64.decode(&encoded).ok(),
        UiAccountData::LegacyBinary(encoded) => BASE64.decode(&encoded).ok(),
        UiAccountData::Json(_) => None,
    }
}

fn decode_pool_event(account: Pubkey, data: &[u8]) -> Option<AccountEvent> {
    match PoolState::decode(data) {
        Ok(state) => Some(AccountEvent::Pool { account, state }),
        Err(e) => {
            error!(%account, error = %e, "Pool account failed to decode");
            None
        }
    }
}

fn decode_market_event(account: Pubkey, data: &[u8]) -> Option<AccountEvent> {
    match MarketState::decode(data) {
        Ok(state) => Some(AccountEvent::Market { account, state }),
        Err(e) => {
            error!(%account, error = %e, "Market account failed to decode");
            None
        }
    }
}

fn decode_wallet_event(account: Pubkey, data: &[u8]) -> Option<AccountEvent> {
    match spl_token::state::Account::unpack(data) {
        Ok(token) => Some(AccountEvent::WalletToken {
            account,
            mint: token.mint,
            amount: token.amount,
        }),
        Err(e) => {
            error!(%account, error = %e, "Token account failed to unpack");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::program_option::COption;

    #[test]
    fn test_pool_filters_pin_size_and_offsets() {
        let quote = Pubkey::new_unique();
        let filters = pool_filters(&quote);
        assert_eq!(filters.len(), 3);
        assert!(matches!(filters[0], RpcFilterType::DataSize(752)));
    }

    #[test]
    fn test_market_and_wallet_filter_sizes() {
        let filters = market_filters(&Pubkey::new_unique());
        assert!(matches!(filters[0], RpcFilterType::DataSize(388)));

        let filters = wallet_filters(&Pubkey::new_unique());
        assert!(matches!(filters[0], RpcFilterType::DataSize(165)));
    }

    #[test]
    fn test_account_bytes_decodes_base64() {
        let raw = vec![1u8, 2, 3, 4];
        let encoded = BASE64.encode(&raw);
        let decoded = account_bytes(UiAccountData::Binary(
            encoded,
            solana_account_decoder::UiAccountEncoding::Base64,
        ));
        assert_eq!(decoded, Some(raw));
    }

    #[test]
    fn test_account_bytes_rejects_json() {
        let json = solana_account_decoder::parse_account_data::ParsedAccount {
            program: "spl-token".to_string(),
            parsed: serde_json::json!({}),
            space: 0,
        };
        assert_eq!(account_bytes(UiAccountData::Json(json)), None);
    }

    #[test]
    fn test_decode_wallet_event_reads_mint_and_amount() {
        let mint = Pubkey::new_unique();
        let owner = Pubkey::new_unique();
        let token = spl_token::state::Account {
            mint,
            owner,
            amount: 123_456,
            delegate: COption::None,
            state: spl_token::state::AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        };
        let mut buf = vec![0u8; spl_token::state::Account::LEN];
        spl_token::state::Account::pack(token, &mut buf).unwrap();

        let event = decode_wallet_event(Pubkey::new_unique(), &buf);
        match event {
            Some(AccountEvent::WalletToken {
                mint: m, amount, ..
            }) => {
                assert_eq!(m, mint);
                assert_eq!(amount, 123_456);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decode_pool_event_rejects_short_data() {
        assert!(decode_pool_event(Pubkey::new_unique(), &[0u8; 10]).is_none());
    }
}
