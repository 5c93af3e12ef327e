//! In-memory credential cache
//!
//! Maps a canonical address (`0x` + 40 lowercase hex) to its plaintext
//! private key. Entries are written on every key derivation and live for
//! the lifetime of the owning cache: there is no eviction, expiry or
//! capacity bound, and nothing is persisted.
//!
//! Only plaintext is ever stored here. AES applies on the way out to the
//! caller, so anything with access to this process's memory sees
//! plaintext keys.

use crate::security::SecureString;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Concurrent address -> plaintext private key map
pub struct CredentialCache {
    keys: RwLock<HashMap<String, SecureString>>,
}

impl CredentialCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite the key for `address`
    pub fn put(&self, address: &str, private_key: SecureString) {
        let replaced = self
            .keys
            .write()
            .insert(address.to_string(), private_key)
            .is_some();

        debug!("Cached key for {} (replaced: {})", address, replaced);
    }

    /// Exact-match lookup; no case normalization is applied
    pub fn get(&self, address: &str) -> Option<SecureString> {
        self.keys.read().get(address).cloned()
    }

    /// Check if an address is cached
    pub fn contains(&self, address: &str) -> bool {
        self.keys.read().contains_key(address)
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const ADDR: &str = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";

    #[test]
    fn test_put_get() {
        let cache = CredentialCache::new();
        assert!(cache.get(ADDR).is_none());

        cache.put(ADDR, SecureString::from("aa"));
        assert_eq!(cache.get(ADDR).unwrap().expose(), "aa");
        assert!(cache.contains(ADDR));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_overwrites() {
        let cache = CredentialCache::new();
        cache.put(ADDR, SecureString::from("aa"));
        cache.put(ADDR, SecureString::from("bb"));

        assert_eq!(cache.get(ADDR).unwrap().expose(), "bb");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let cache = CredentialCache::new();
        cache.put(ADDR, SecureString::from("aa"));
        assert!(cache.get(&ADDR.to_uppercase()).is_none());
    }

    #[test]
    fn test_concurrent_puts() {
        let cache = Arc::new(CredentialCache::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("0x{:02x}{:038x}", t, i);
                        cache.put(&key, SecureString::from(key.as_str()));
                        assert!(cache.get(&key).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 800);
    }
}
