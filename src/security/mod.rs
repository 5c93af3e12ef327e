//! Security utilities for secure handling of key material
//!
//! This module provides:
//! - Memory zeroization to securely erase plaintext private keys

pub mod zeroize;

pub use zeroize::{SecureBytes, SecureString};
