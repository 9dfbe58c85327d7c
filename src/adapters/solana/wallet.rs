//! Keypair loading and custody.
//!
//! Secrets come in as a base58 string from the environment or as the
//! standard JSON byte-array keypair file. Neither form is ever logged.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Failed to load keypair from file: {0}")]
    LoadError(String),
    #[error("Invalid base58 secret: {0}")]
    InvalidBase58(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
    #[error("No wallet source configured")]
    NoSource,
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Holds the signing keypair for the trading wallet
pub struct WalletManager {
    keypair: Keypair,
}

impl WalletManager {
    /// Load from a JSON byte-array keypair file (solana-keygen format)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| WalletError::LoadError(format!("Failed to read file: {}", e)))?;
        let bytes: Vec<u8> = serde_json::from_str(&contents)
            .map_err(|e| WalletError::LoadError(format!("Invalid JSON format: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Load from a base58-encoded 64-byte secret key string
    pub fn from_base58(secret: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidBase58(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let keypair =
            Keypair::try_from(bytes).map_err(|e| WalletError::InvalidKeypair(e.to_string()))?;
        Ok(Self { keypair })
    }

    /// Resolve the wallet from whichever source is configured: a base58
    /// secret takes precedence over a keypair file.
    pub fn resolve(
        base58_secret: Option<&str>,
        keypair_path: Option<&Path>,
    ) -> Result<Self, WalletError> {
        if let Some(secret) = base58_secret {
            if !secret.trim().is_empty() {
                return Self::from_base58(secret);
            }
        }
        if let Some(path) = keypair_path {
            return Self::from_file(path);
        }
        Err(WalletError::NoSource)
    }

    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.keypair.to_bytes().to_vec()
    }

    /// Write in solana-keygen JSON format
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), WalletError> {
        let json = serde_json::to_string(&self.to_bytes())
            .map_err(|e| WalletError::LoadError(format!("Failed to serialize: {}", e)))?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

impl Clone for WalletManager {
    fn clone(&self) -> Self {
        Self {
            // keypair bytes round-trip, Keypair itself is not Clone
            keypair: Keypair::try_from(&self.keypair.to_bytes()[..])
                .unwrap_or_else(|_| Keypair::new()),
        }
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_base58_roundtrip() {
        let wallet = WalletManager::new_random();
        let encoded = bs58::encode(wallet.to_bytes()).into_string();

        let restored = WalletManager::from_base58(&encoded).unwrap();
        assert_eq!(wallet.pubkey(), restored.pubkey());
    }

    #[test]
    fn test_base58_with_whitespace() {
        let wallet = WalletManager::new_random();
        let encoded = format!("  {}\n", bs58::encode(wallet.to_bytes()).into_string());
        assert_eq!(
            WalletManager::from_base58(&encoded).unwrap().pubkey(),
            wallet.pubkey()
        );
    }

    #[test]
    fn test_file_roundtrip() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let wallet = WalletManager::new_random();
        let json = serde_json::to_string(&wallet.to_bytes()).unwrap();
        temp_file.write_all(json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let loaded = WalletManager::from_file(temp_file.path()).unwrap();
        assert_eq!(wallet.pubkey(), loaded.pubkey());
    }

    #[test]
    fn test_resolve_prefers_env_secret() {
        let file_wallet = WalletManager::new_random();
        let temp_file = NamedTempFile::new().unwrap();
        file_wallet.save_to_file(temp_file.path()).unwrap();

        let env_wallet = WalletManager::new_random();
        let secret = bs58::encode(env_wallet.to_bytes()).into_string();

        let resolved = WalletManager::resolve(Some(&secret), Some(temp_file.path())).unwrap();
        assert_eq!(resolved.pubkey(), env_wallet.pubkey());
    }

    #[test]
    fn test_resolve_falls_back_to_file() {
        let file_wallet = WalletManager::new_random();
        let temp_file = NamedTempFile::new().unwrap();
        file_wallet.save_to_file(temp_file.path()).unwrap();

        let resolved = WalletManager::resolve(Some("   "), Some(temp_file.path())).unwrap();
        assert_eq!(resolved.pubkey(), file_wallet.pubkey());
    }

    #[test]
    fn test_resolve_without_sources_errors() {
        assert!(matches!(
            WalletManager::resolve(None, None),
            Err(WalletError::NoSource)
        ));
    }

    #[test]
    fn test_invalid_bytes_rejected() {
        assert!(WalletManager::from_bytes(&[0u8; 10]).is_err());
        assert!(WalletManager::from_base58("not base58 at all!").is_err());
    }

    #[test]
    fn test_clone_preserves_key() {
        let wallet = WalletManager::new_random();
        assert_eq!(wallet.pubkey(), wallet.clone().pubkey());
    }

    #[test]
    fn test_debug_hides_secret() {
        let wallet = WalletManager::new_random();
        let debug = format!("{:?}", wallet);
        let secret = bs58::encode(wallet.to_bytes()).into_string();
        assert!(!debug.contains(&secret));
        assert!(debug.contains(&wallet.pubkey().to_string()));
    }
}
