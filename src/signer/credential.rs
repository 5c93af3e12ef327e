//! Signing credential handed to transaction-building code

use crate::crypto::{EthKeyPair, EthSignature};
use crate::errors::Result;
use std::fmt;

/// A signing-capable credential built from a plaintext private key
#[derive(Clone)]
pub struct SigningCredential {
    keypair: EthKeyPair,
    address: String,
}

impl SigningCredential {
    /// Build from a plaintext hex private key
    pub fn from_private_key_hex(private_key: &str) -> Result<Self> {
        Ok(Self::from_keypair(EthKeyPair::from_scalar_hex(private_key)?))
    }

    pub fn from_keypair(keypair: EthKeyPair) -> Self {
        let address = keypair.address_hex();
        Self { keypair, address }
    }

    /// Lowercase `0x`-prefixed address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// 128-char hex public key
    pub fn public_key_hex(&self) -> String {
        self.keypair.public_key_hex()
    }

    /// Sign a 32-byte transaction hash
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<EthSignature> {
        self.keypair.sign_hash(hash)
    }

    /// Sign a message with EIP-191 personal sign
    pub fn sign_message(&self, message: &[u8]) -> Result<EthSignature> {
        self.keypair.sign_message(message)
    }
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredential")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
