//! Key storage and resolution
//!
//! This module provides:
//! - In-memory credential cache for runtime access
//! - AES transform for private keys crossing the broker boundary
//! - Remote key service resolution with endpoint failover

pub mod encrypted;
pub mod memory;
pub mod remote;

pub use encrypted::AesCipher;
pub use memory::CredentialCache;
pub use remote::{KeyServiceResponse, RemoteKeyResolver};
