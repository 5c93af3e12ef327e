//! Cryptographic utilities for secp256k1 / Ethereum-style keys

pub mod eth;

pub use eth::{
    checksum_address, hash_message, keccak256, EthKeyPair, EthSignature, KeyMaterial,
    PRIVATE_KEY_HEX_LEN, PUBLIC_KEY_HEX_LEN,
};
