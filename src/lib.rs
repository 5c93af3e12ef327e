//! keygate - credential broker for blockchain transaction signing
//!
//! Holds or fetches the private key needed to sign a transaction on behalf
//! of a user identifier, and hands back a signing credential:
//! - Derives key pairs (fresh or imported) and caches their private keys
//! - Falls back to an ordered list of remote key services on a cache miss
//! - Optionally encrypts private keys crossing the broker boundary
//!
//! # Security
//!
//! - The cache holds plaintext keys for the lifetime of the process; AES
//!   protects keys in transit to and from callers and the key service only
//! - Plaintext key buffers are zeroed on drop
//! - Private keys are never logged

pub mod config;
pub mod crypto;
pub mod errors;
pub mod keystore;
pub mod security;
pub mod signer;

pub use crate::config::Config;
pub use crate::crypto::{EthKeyPair, KeyMaterial};
pub use crate::errors::{KeyGateError, Result};
pub use crate::keystore::{AesCipher, CredentialCache, RemoteKeyResolver};
pub use crate::signer::{CredentialBroker, SigningCredential};

use std::sync::Arc;

/// Wire up a broker from configuration with a fresh, empty cache
pub fn broker_from_config(config: &Config) -> Result<CredentialBroker> {
    let cache = Arc::new(CredentialCache::new());
    let resolver = RemoteKeyResolver::new(&config.key_service)?;
    let cipher = AesCipher::from_config(&config.encryption)?;
    Ok(CredentialBroker::new(cache, resolver, cipher))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broker_from_config() {
        let mut config = Config::default();
        config.encryption.aes_secret = Some("correct horse battery staple".to_string());
        let broker = broker_from_config(&config).unwrap();

        let material = broker.create_private_key(true).unwrap();
        let cached = broker.get_private_key(&material.address, false).await.unwrap();
        assert_ne!(cached.expose(), material.private_key);

        let cipher = AesCipher::from_config(&config.encryption).unwrap().unwrap();
        assert_eq!(cipher.decrypt(&material.private_key).unwrap(), cached);
    }

    #[test]
    fn test_broker_from_config_without_secret() {
        let broker = broker_from_config(&Config::default()).unwrap();
        assert!(matches!(
            broker.create_private_key(true),
            Err(KeyGateError::EncryptionNotConfigured)
        ));
        assert!(broker.create_private_key(false).is_ok());
    }
}
