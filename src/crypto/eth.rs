//! Ethereum-style secp256k1 key codec
//!
//! Provides:
//! - Random key generation
//! - Import from a raw scalar, a hex scalar, or a base64-wrapped hex scalar
//! - Public key / address derivation and fixed-width hex rendering
//! - Message signing (EIP-191)

use crate::errors::{KeyGateError, Result};
use crate::security::{SecureBytes, SecureString};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use k256::{ecdsa::SigningKey, SecretKey};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use zeroize::Zeroize;

/// Width of the hex-encoded public key (64 bytes, no `0x04` tag)
pub const PUBLIC_KEY_HEX_LEN: usize = 128;

/// Width of the hex-encoded private key scalar
pub const PRIVATE_KEY_HEX_LEN: usize = 64;

/// Attempts at drawing a valid scalar before giving up
const MAX_GENERATION_ATTEMPTS: usize = 8;

/// Public key / private key / address triple handed to callers.
///
/// `private_key` holds plaintext hex or an AES ciphertext depending on how
/// the value was requested; the field itself does not record which.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMaterial {
    #[serde(default)]
    pub public_key: String,

    #[serde(default)]
    pub private_key: String,

    #[serde(default)]
    pub address: String,
}

impl KeyMaterial {
    /// True when no private key is present
    pub fn is_empty(&self) -> bool {
        self.private_key.trim().is_empty()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .field("address", &self.address)
            .finish()
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

/// Ethereum key pair
#[derive(Clone)]
pub struct EthKeyPair {
    signing_key: SigningKey,
}

impl EthKeyPair {
    /// Create a new random key pair from OS entropy
    pub fn generate() -> Result<Self> {
        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let mut bytes = SecureBytes::new(vec![0u8; 32]);
            OsRng
                .try_fill_bytes(bytes.expose_mut())
                .map_err(|e| KeyGateError::KeyGenerationFailed(e.to_string()))?;

            // Zero or >= group order: draw again
            if let Ok(secret_key) = SecretKey::from_slice(bytes.expose()) {
                return Ok(Self {
                    signing_key: SigningKey::from(secret_key),
                });
            }
        }

        Err(KeyGateError::KeyGenerationFailed(
            "no valid scalar drawn from entropy source".to_string(),
        ))
    }

    /// Create from raw private key bytes (32 bytes)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(KeyGateError::PrivateKeyDecode(format!(
                "Expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|_| KeyGateError::PrivateKeyDecode("scalar out of range".to_string()))?;

        Ok(Self {
            signing_key: SigningKey::from(secret_key),
        })
    }

    /// Create from a hex scalar.
    ///
    /// Accepts an optional `0x` prefix and fewer than 64 digits, which are
    /// left-padded with zeros.
    pub fn from_scalar_hex(scalar_hex: &str) -> Result<Self> {
        let trimmed = scalar_hex.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(KeyGateError::PrivateKeyDecode("empty scalar".to_string()));
        }

        let digits = if digits.len() > PRIVATE_KEY_HEX_LEN {
            digits.trim_start_matches('0')
        } else {
            digits
        };
        if digits.len() > PRIVATE_KEY_HEX_LEN {
            return Err(KeyGateError::PrivateKeyDecode(format!(
                "scalar longer than {} hex digits",
                PRIVATE_KEY_HEX_LEN
            )));
        }

        let mut padded = format!("{:0>width$}", digits, width = PRIVATE_KEY_HEX_LEN);
        let decoded = hex::decode(&padded);
        padded.zeroize();

        let bytes = SecureBytes::new(decoded?);
        Self::from_bytes(bytes.expose())
    }

    /// Create from base64 of the UTF-8 hex scalar (external import format)
    pub fn from_encoded_private_key(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Err(KeyGateError::PrivateKeyIsNull);
        }

        let decoded = SecureBytes::new(STANDARD.decode(encoded)?);
        let scalar_hex = std::str::from_utf8(decoded.expose())?;
        Self::from_scalar_hex(scalar_hex)
    }

    /// Get the public key (uncompressed, 65 bytes with 0x04 prefix)
    pub fn public_key_uncompressed(&self) -> Vec<u8> {
        let verifying_key = self.signing_key.verifying_key();
        verifying_key.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Public key as 128 lowercase hex chars (x || y, no tag)
    pub fn public_key_hex(&self) -> String {
        let pubkey = self.public_key_uncompressed();
        format!(
            "{:0>width$}",
            hex::encode(&pubkey[1..]),
            width = PUBLIC_KEY_HEX_LEN
        )
    }

    /// Get the Ethereum address (20 bytes)
    pub fn address(&self) -> [u8; 20] {
        let pubkey = self.public_key_uncompressed();
        // Skip the 0x04 prefix and hash the remaining 64 bytes
        let hash = Keccak256::digest(&pubkey[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        address
    }

    /// Lowercase `0x`-prefixed address, the form used as the cache key
    pub fn address_hex(&self) -> String {
        format!("0x{}", hex::encode(self.address()))
    }

    /// Get the checksummed Ethereum address string
    pub fn address_checksum(&self) -> String {
        checksum_address(&self.address())
    }

    /// Private key as 64 lowercase hex chars
    pub fn private_key_hex(&self) -> SecureString {
        let bytes = SecureBytes::new(self.signing_key.to_bytes().to_vec());
        SecureString::new(hex::encode(bytes.expose()))
    }

    /// Render the pair as plaintext key material
    pub fn key_material(&self) -> KeyMaterial {
        KeyMaterial {
            public_key: self.public_key_hex(),
            private_key: self.private_key_hex().expose().to_string(),
            address: self.address_hex(),
        }
    }

    /// Sign a message hash (32 bytes)
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<EthSignature> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash)
            .map_err(|e| KeyGateError::SigningFailed(e.to_string()))?;

        let bytes = signature.to_bytes();

        Ok(EthSignature {
            r: bytes[..32].to_vec(),
            s: bytes[32..].to_vec(),
            v: recovery_id.to_byte(),
        })
    }

    /// Sign a message with EIP-191 personal sign
    pub fn sign_message(&self, message: &[u8]) -> Result<EthSignature> {
        let hash = hash_message(message);
        self.sign_hash(&hash)
    }
}

impl fmt::Debug for EthKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthKeyPair")
            .field("address", &self.address_hex())
            .finish_non_exhaustive()
    }
}

/// Ethereum signature with recovery id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EthSignature {
    pub r: Vec<u8>,
    pub s: Vec<u8>,
    pub v: u8,
}

impl EthSignature {
    /// Get the full signature bytes (65 bytes: r || s || v)
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut sig = [0u8; 65];
        sig[0..32].copy_from_slice(&self.r);
        sig[32..64].copy_from_slice(&self.s);
        sig[64] = self.v;
        sig
    }

    /// Get v for legacy transactions (27/28)
    pub fn v_legacy(&self) -> u8 {
        self.v + 27
    }

    /// Get v for EIP-155 transactions
    pub fn v_eip155(&self, chain_id: u64) -> u64 {
        self.v as u64 + 35 + chain_id * 2
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// Hash a message according to EIP-191 (personal sign)
pub fn hash_message(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Convert an address to checksummed format (EIP-55)
pub fn checksum_address(address: &[u8; 20]) -> String {
    let addr_hex = hex::encode(address);
    let hash = hex::encode(Keccak256::digest(addr_hex.as_bytes()));

    let mut result = String::with_capacity(42);
    result.push_str("0x");

    for (c, hash_char) in addr_hex.chars().zip(hash.chars()) {
        if c.is_ascii_alphabetic() && hash_char >= '8' {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALAR_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn test_generated_widths() {
        for _ in 0..16 {
            let material = EthKeyPair::generate().unwrap().key_material();
            assert_eq!(material.public_key.len(), PUBLIC_KEY_HEX_LEN);
            assert_eq!(material.private_key.len(), PRIVATE_KEY_HEX_LEN);
            assert_eq!(material.address.len(), 42);
            assert!(material.address.starts_with("0x"));
            assert_eq!(material.address, material.address.to_lowercase());
            assert!(hex::decode(&material.public_key).is_ok());
        }
    }

    #[test]
    fn test_known_vector_scalar_one() {
        let keypair = EthKeyPair::from_scalar_hex(SCALAR_ONE).unwrap();
        let material = keypair.key_material();

        assert_eq!(material.address, "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
        assert_eq!(
            material.public_key,
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
        assert_eq!(material.private_key, SCALAR_ONE);
    }

    #[test]
    fn test_short_and_prefixed_scalar() {
        let short = EthKeyPair::from_scalar_hex("0x1").unwrap();
        let full = EthKeyPair::from_scalar_hex(SCALAR_ONE).unwrap();
        assert_eq!(short.address_hex(), full.address_hex());
        assert_eq!(short.private_key_hex(), full.private_key_hex());
    }

    #[test]
    fn test_reimport_is_deterministic() {
        let original = EthKeyPair::generate().unwrap().key_material();
        let reimported = EthKeyPair::from_scalar_hex(&original.private_key)
            .unwrap()
            .key_material();

        assert_eq!(original.public_key, reimported.public_key);
        assert_eq!(original.address, reimported.address);
    }

    #[test]
    fn test_invalid_scalars() {
        assert!(matches!(
            EthKeyPair::from_scalar_hex("0x0"),
            Err(KeyGateError::PrivateKeyDecode(_))
        ));
        assert!(matches!(
            EthKeyPair::from_scalar_hex("not hex"),
            Err(KeyGateError::PrivateKeyDecode(_))
        ));
        // Group order n is not a valid scalar
        assert!(matches!(
            EthKeyPair::from_scalar_hex(
                "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141"
            ),
            Err(KeyGateError::PrivateKeyDecode(_))
        ));
        assert!(matches!(
            EthKeyPair::from_scalar_hex(&"1".repeat(65)),
            Err(KeyGateError::PrivateKeyDecode(_))
        ));
    }

    #[test]
    fn test_encoded_import() {
        let encoded = STANDARD.encode(SCALAR_ONE);
        let keypair = EthKeyPair::from_encoded_private_key(&encoded).unwrap();
        assert_eq!(keypair.address_hex(), "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf");
    }

    #[test]
    fn test_encoded_import_errors() {
        assert!(matches!(
            EthKeyPair::from_encoded_private_key(""),
            Err(KeyGateError::PrivateKeyIsNull)
        ));
        assert!(matches!(
            EthKeyPair::from_encoded_private_key("   "),
            Err(KeyGateError::PrivateKeyIsNull)
        ));
        assert!(matches!(
            EthKeyPair::from_encoded_private_key("not-base64"),
            Err(KeyGateError::PrivateKeyDecode(_))
        ));

        let not_utf8 = STANDARD.encode([0xffu8, 0xfe, 0xfd]);
        assert!(matches!(
            EthKeyPair::from_encoded_private_key(&not_utf8),
            Err(KeyGateError::PrivateKeyDecode(_))
        ));
    }

    #[test]
    fn test_address_checksum() {
        // Test vector from EIP-55
        let addr = hex::decode("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let mut address = [0u8; 20];
        address.copy_from_slice(&addr);

        let checksummed = checksum_address(&address);
        assert_eq!(checksummed, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }

    #[test]
    fn test_message_signing() {
        let keypair = EthKeyPair::generate().unwrap();
        let sig = keypair.sign_message(b"Hello, Ethereum!").unwrap();
        assert_eq!(sig.r.len(), 32);
        assert_eq!(sig.s.len(), 32);
        assert!(sig.v <= 1);
        assert_eq!(sig.to_hex().len(), 130);
    }

    #[test]
    fn test_recovery_id_encodings() {
        let sig = EthSignature {
            r: vec![0u8; 32],
            s: vec![0u8; 32],
            v: 1,
        };
        assert_eq!(sig.v_legacy(), 28);
        assert_eq!(sig.v_eip155(1), 38);
        assert_eq!(sig.v_eip155(56), 148);
        assert_eq!(sig.to_bytes()[64], 1);
    }

    #[test]
    fn test_debug_hides_private_key() {
        let material = EthKeyPair::from_scalar_hex(SCALAR_ONE).unwrap().key_material();
        assert!(!format!("{:?}", material).contains(SCALAR_ONE));
    }
}
