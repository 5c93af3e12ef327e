//! Credential broker
//!
//! Entry point for transaction-building code that needs a private key or a
//! signing credential for a user. Composes the key codec, the credential
//! cache, the remote key resolver and the optional AES transform.
//!
//! Encryption boundary: the cache always holds plaintext. `use_aes` only
//! affects what crosses the broker boundary:
//! - on create/import, the returned `private_key` is encrypted;
//! - on a cache miss, the key service is assumed to return ciphertext,
//!   which is decrypted before being returned.
//!
//! A cache hit returns the cached plaintext whatever `use_aes` says.

use crate::crypto::{EthKeyPair, KeyMaterial};
use crate::errors::{KeyGateError, Result};
use crate::keystore::{AesCipher, CredentialCache, RemoteKeyResolver};
use crate::security::SecureString;
use crate::signer::SigningCredential;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hands out private keys and signing credentials by user identifier
#[derive(Debug)]
pub struct CredentialBroker {
    cache: Arc<CredentialCache>,
    resolver: RemoteKeyResolver,
    cipher: Option<AesCipher>,
}

impl CredentialBroker {
    /// Create a broker over an injected cache
    pub fn new(
        cache: Arc<CredentialCache>,
        resolver: RemoteKeyResolver,
        cipher: Option<AesCipher>,
    ) -> Self {
        if cipher.is_none() {
            info!("No AES key configured, use_aes requests will be rejected");
        }

        Self {
            cache,
            resolver,
            cipher,
        }
    }

    /// Shared cache backing this broker
    pub fn cache(&self) -> &Arc<CredentialCache> {
        &self.cache
    }

    /// Generate a new key pair and cache its private key
    pub fn create_private_key(&self, use_aes: bool) -> Result<KeyMaterial> {
        let keypair = EthKeyPair::generate().map_err(|e| {
            warn!("fail createPrivateKey: {}", e);
            e
        })?;

        self.publish(&keypair, use_aes)
    }

    /// Import a base64-wrapped hex private key and cache it
    pub fn import_private_key(&self, encoded: &str, use_aes: bool) -> Result<KeyMaterial> {
        let keypair = EthKeyPair::from_encoded_private_key(encoded).map_err(|e| {
            warn!("fail importPrivateKey: {}", e);
            e
        })?;

        self.publish(&keypair, use_aes)
    }

    /// Look up the plaintext private key for `user`.
    ///
    /// `user` is either a cached address or an identifier known to the key
    /// service. Returns an empty string when nothing was found.
    pub async fn get_private_key(&self, user: &str, use_aes: bool) -> Result<SecureString> {
        if let Some(private_key) = self.cache.get(user) {
            debug!("Key for {} served from cache", user);
            return Ok(private_key);
        }

        let Some(material) = self.resolver.resolve(user).await else {
            return Ok(SecureString::empty());
        };

        if use_aes {
            return self.cipher()?.decrypt(&material.private_key);
        }

        Ok(SecureString::new(material.private_key.clone()))
    }

    /// Build a signing credential for `user`
    pub async fn get_credential(&self, user: &str, use_aes: bool) -> Result<SigningCredential> {
        let private_key = self.get_private_key(user, use_aes).await?;
        if private_key.is_blank() {
            warn!("fail getCredential. user:{} privateKey is null", user);
            return Err(KeyGateError::PrivateKeyIsNull);
        }

        SigningCredential::from_private_key_hex(private_key.expose())
    }

    /// Throwaway credential for read-only calls; never cached
    pub fn credential_for_query(&self) -> Result<SigningCredential> {
        Ok(SigningCredential::from_keypair(EthKeyPair::generate()?))
    }

    /// Cache the plaintext key and shape the outgoing key material
    fn publish(&self, keypair: &EthKeyPair, use_aes: bool) -> Result<KeyMaterial> {
        // Resolve the cipher first so a failed request leaves the cache untouched
        let cipher = if use_aes { Some(self.cipher()?) } else { None };

        let mut material = keypair.key_material();
        let outgoing = match cipher {
            Some(cipher) => Some(cipher.encrypt(&material.private_key)?),
            None => None,
        };

        self.cache
            .put(&material.address, SecureString::new(material.private_key.clone()));

        if let Some(ciphertext) = outgoing {
            material.private_key = ciphertext;
        }

        debug!("Published key material for {} (aes: {})", material.address, use_aes);
        Ok(material)
    }

    fn cipher(&self) -> Result<&AesCipher> {
        self.cipher
            .as_ref()
            .ok_or(KeyGateError::EncryptionNotConfigured)
    }
}
