//! Configuration management for keygate
//!
//! Supports loading configuration from:
//! - Built-in defaults
//! - Config file (keygate.toml)
//! - Environment variables (KEYGATE_*)

use crate::errors::{KeyGateError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum salt length accepted by Argon2
const MIN_SALT_LEN: usize = 8;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote key service configuration
    pub key_service: KeyServiceConfig,

    /// At-rest encryption configuration
    pub encryption: EncryptionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote key service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyServiceConfig {
    /// Comma-separated `host:port` list, queried in order
    pub endpoints: String,

    /// URL scheme (http or https)
    pub scheme: String,

    /// Fixed path prefix; the user identifier is appended as the last segment
    pub path: String,

    /// Timeout for a single endpoint request
    pub request_timeout_ms: u64,

    /// Deadline for the whole failover loop (none = sum of request timeouts)
    pub overall_timeout_ms: Option<u64>,
}

impl Default for KeyServiceConfig {
    fn default() -> Self {
        Self {
            endpoints: String::new(),
            scheme: "http".to_string(),
            path: "key-manager/user/privateKey".to_string(),
            request_timeout_ms: 3_000,
            overall_timeout_ms: None,
        }
    }
}

impl KeyServiceConfig {
    /// Ordered endpoint list, blanks dropped
    pub fn endpoint_list(&self) -> Vec<String> {
        self.endpoints
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn overall_timeout(&self) -> Option<Duration> {
        self.overall_timeout_ms.map(Duration::from_millis)
    }
}

/// At-rest encryption configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    /// Passphrase the AES key is derived from (unset = encryption disabled)
    pub aes_secret: Option<String>,

    /// Salt for key derivation
    pub aes_salt: String,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            aes_secret: None,
            aes_salt: "keygate.aes.v1".to_string(),
        }
    }
}

impl std::fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("aes_secret", &self.aes_secret.as_ref().map(|_| "[REDACTED]"))
            .field("aes_salt", &self.aes_salt)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())
            .map_err(|e| KeyGateError::ConfigError(e.to_string()))?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        } else {
            builder = builder
                .add_source(config::File::with_name("keygate").required(false))
                .add_source(config::File::with_name("/etc/keygate/keygate").required(false));
        }

        // KEYGATE_KEY_SERVICE__ENDPOINTS, KEYGATE_ENCRYPTION__AES_SECRET, ...
        builder = builder.add_source(
            config::Environment::with_prefix("KEYGATE")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder
            .build()
            .map_err(|e| KeyGateError::ConfigError(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| KeyGateError::ConfigError(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let ks = &self.key_service;

        if ks.request_timeout_ms == 0 {
            return Err(KeyGateError::ConfigError(
                "key_service.request_timeout_ms must be positive".to_string(),
            ));
        }

        if let Some(overall) = ks.overall_timeout_ms {
            if overall < ks.request_timeout_ms {
                return Err(KeyGateError::ConfigError(format!(
                    "key_service.overall_timeout_ms ({}) is shorter than one request timeout ({})",
                    overall, ks.request_timeout_ms
                )));
            }
        }

        if ks.scheme != "http" && ks.scheme != "https" {
            return Err(KeyGateError::ConfigError(format!(
                "Unsupported key service scheme: {}",
                ks.scheme
            )));
        }

        for endpoint in ks.endpoint_list() {
            let port = endpoint.rsplit_once(':').map(|(_, port)| port);
            if port.map_or(true, |p| p.parse::<u16>().is_err()) {
                return Err(KeyGateError::ConfigError(format!(
                    "Key service endpoint must be host:port, got {}",
                    endpoint
                )));
            }
        }

        if self.encryption.aes_salt.len() < MIN_SALT_LEN {
            return Err(KeyGateError::ConfigError(format!(
                "encryption.aes_salt must be at least {} bytes",
                MIN_SALT_LEN
            )));
        }

        Ok(())
    }
}
