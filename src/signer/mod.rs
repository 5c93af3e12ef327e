//! Credential brokering for transaction signing
//!
//! This module provides the high-level entry points used by
//! transaction-building code, integrating key derivation, caching,
//! remote resolution and the AES transform.

pub mod broker;
pub mod credential;

pub use broker::CredentialBroker;
pub use credential::SigningCredential;
