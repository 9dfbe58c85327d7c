//! Allow-List Cache
//!
//! Optional flat-file list of token mints the sniper is allowed to trade,
//! one base58 mint per line. An empty or missing file disables allow-list
//! gating entirely. The file is re-read on demand and by a background
//! refresh task, so the list can be edited while the bot runs.

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct AllowList {
    path: PathBuf,
    entries: RwLock<HashSet<Pubkey>>,
}

impl AllowList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: RwLock::new(HashSet::new()),
        }
    }

    /// Re-read the backing file. A missing file is not an error: the list
    /// becomes empty. Returns the number of entries loaded.
    pub async fn refresh(&self) -> usize {
        let parsed = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Allow-list file unreadable, treating as empty");
                HashSet::new()
            }
        };
        let count = parsed.len();
        *self.entries.write().await = parsed;
        count
    }

    fn parse(contents: &str) -> HashSet<Pubkey> {
        let mut entries = HashSet::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match Pubkey::from_str(line) {
                Ok(mint) => {
                    entries.insert(mint);
                }
                Err(_) => {
                    warn!(line, "Skipping malformed allow-list entry");
                }
            }
        }
        entries
    }

    pub async fn is_allowed(&self, mint: &Pubkey) -> bool {
        self.entries.read().await.contains(mint)
    }

    /// Empty list means allow-list gating is off.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Keep the list fresh in the background.
    pub fn spawn_refresh(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let count = self.refresh().await;
                debug!(count, "Allow-list refreshed");
            }
        })
    }
}
