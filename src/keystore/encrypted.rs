//! At-rest encryption of private key strings
//!
//! Encrypts/decrypts hex private keys using AES-256-GCM. The key is derived
//! once from the configured passphrase with Argon2id and shared for the
//! lifetime of the process.
//!
//! Ciphertext format: base64(nonce || ciphertext || tag).

use crate::config::EncryptionConfig;
use crate::errors::{KeyGateError, Result};
use crate::security::SecureString;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use std::fmt;
use zeroize::Zeroize;

/// Nonce size for AES-GCM
const NONCE_SIZE: usize = 12;

/// Authentication tag size for AES-GCM
const TAG_SIZE: usize = 16;

/// Symmetric transform applied at the broker boundary
#[derive(Clone)]
pub struct AesCipher {
    cipher: Aes256Gcm,
}

impl AesCipher {
    /// Create from a raw 256-bit key
    pub fn from_key_bytes(key: &[u8; 32]) -> Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| KeyGateError::EncryptionFailed(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Derive the key from a passphrase and salt using Argon2id
    pub fn from_passphrase(passphrase: &str, salt: &[u8]) -> Result<Self> {
        let mut key = derive_key(passphrase, salt)?;
        let cipher = Self::from_key_bytes(&key);
        key.zeroize();
        cipher
    }

    /// Build from configuration; `None` when no secret is configured
    pub fn from_config(config: &EncryptionConfig) -> Result<Option<Self>> {
        match &config.aes_secret {
            Some(secret) if !secret.is_empty() => {
                Self::from_passphrase(secret, config.aes_salt.as_bytes()).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Encrypt a plaintext private key string
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| KeyGateError::EncryptionFailed(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(blob))
    }

    /// Decrypt a value produced by [`AesCipher::encrypt`]
    pub fn decrypt(&self, encoded: &str) -> Result<SecureString> {
        let blob = STANDARD
            .decode(encoded.trim())
            .map_err(|e| KeyGateError::DecryptionFailed(format!("Invalid ciphertext: {}", e)))?;

        if blob.len() < NONCE_SIZE + TAG_SIZE {
            return Err(KeyGateError::DecryptionFailed(format!(
                "Ciphertext too short: {} bytes",
                blob.len()
            )));
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_SIZE);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| {
                KeyGateError::DecryptionFailed("Decryption failed - wrong key?".to_string())
            })?;

        String::from_utf8(plaintext)
            .map(SecureString::new)
            .map_err(|e| {
                let mut bytes = e.into_bytes();
                bytes.zeroize();
                KeyGateError::DecryptionFailed("Plaintext is not UTF-8".to_string())
            })
    }
}

impl fmt::Debug for AesCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesCipher { .. }")
    }
}

/// Derive an encryption key from a passphrase using Argon2id
fn derive_key(passphrase: &str, salt: &[u8]) -> Result<[u8; 32]> {
    let params = Params::new(
        65536, // 64 MB memory
        3,     // 3 iterations
        4,     // 4 parallel lanes
        Some(32),
    )
    .map_err(|e| KeyGateError::EncryptionFailed(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut output)
        .map_err(|e| KeyGateError::EncryptionFailed(e.to_string()))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAINTEXT: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn cipher() -> AesCipher {
        AesCipher::from_key_bytes(&[7u8; 32]).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = cipher();
        let encrypted = cipher.encrypt(PLAINTEXT).unwrap();
        assert_ne!(encrypted, PLAINTEXT);
        assert_eq!(cipher.decrypt(&encrypted).unwrap().expose(), PLAINTEXT);
    }

    #[test]
    fn test_nonce_is_fresh() {
        let cipher = cipher();
        let a = cipher.encrypt(PLAINTEXT).unwrap();
        let b = cipher.encrypt(PLAINTEXT).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_key() {
        let encrypted = cipher().encrypt(PLAINTEXT).unwrap();
        let other = AesCipher::from_key_bytes(&[8u8; 32]).unwrap();

        let result = other.decrypt(&encrypted);
        assert!(matches!(result, Err(KeyGateError::DecryptionFailed(_))));
    }

    #[test]
    fn test_decrypt_garbage() {
        let cipher = cipher();

        // Plain hex is not a ciphertext
        assert!(matches!(
            cipher.decrypt(PLAINTEXT),
            Err(KeyGateError::DecryptionFailed(_))
        ));
        assert!(matches!(
            cipher.decrypt("%%%"),
            Err(KeyGateError::DecryptionFailed(_))
        ));
        assert!(matches!(
            cipher.decrypt(&STANDARD.encode([1u8; 10])),
            Err(KeyGateError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_passphrase_derivation_is_stable() {
        let a = AesCipher::from_passphrase("passphrase", b"keygate.aes.v1").unwrap();
        let b = AesCipher::from_passphrase("passphrase", b"keygate.aes.v1").unwrap();

        let encrypted = a.encrypt(PLAINTEXT).unwrap();
        assert_eq!(b.decrypt(&encrypted).unwrap().expose(), PLAINTEXT);
    }

    #[test]
    fn test_from_config_without_secret() {
        let config = EncryptionConfig::default();
        assert!(AesCipher::from_config(&config).unwrap().is_none());
    }
}
