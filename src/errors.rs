//! Error types for keygate

use thiserror::Error;

/// Main error type for keygate operations
#[derive(Error, Debug)]
pub enum KeyGateError {
    // Key resolution errors
    #[error("Private key is null")]
    PrivateKeyIsNull,

    #[error("Private key decode failed: {0}")]
    PrivateKeyDecode(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    // Cryptographic errors
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("AES requested but no encryption key is configured")]
    EncryptionNotConfigured,

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    // Remote key service errors
    #[error("Key service unavailable: {0}")]
    KeyServiceUnavailable(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Internal errors
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl KeyGateError {
    /// Stable numeric code for mapping onto an API response
    pub fn code(&self) -> i32 {
        match self {
            KeyGateError::PrivateKeyIsNull => 201_001,
            KeyGateError::PrivateKeyDecode(_) => 201_002,
            KeyGateError::KeyGenerationFailed(_) => 201_003,
            KeyGateError::DecryptionFailed(_) => 201_010,
            KeyGateError::EncryptionFailed(_) => 201_011,
            KeyGateError::EncryptionNotConfigured => 201_012,
            KeyGateError::SigningFailed(_) => 201_020,
            KeyGateError::KeyServiceUnavailable(_) => 201_030,
            KeyGateError::ConfigError(_) => 201_040,
            KeyGateError::InternalError(_) => 201_050,
        }
    }

    /// Whether the caller can fix the request that produced this error
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            KeyGateError::PrivateKeyIsNull
                | KeyGateError::PrivateKeyDecode(_)
                | KeyGateError::DecryptionFailed(_)
        )
    }
}

impl From<serde_json::Error> for KeyGateError {
    fn from(err: serde_json::Error) -> Self {
        KeyGateError::InternalError(format!("JSON error: {}", err))
    }
}

impl From<hex::FromHexError> for KeyGateError {
    fn from(err: hex::FromHexError) -> Self {
        KeyGateError::PrivateKeyDecode(format!("Hex decode error: {}", err))
    }
}

impl From<base64::DecodeError> for KeyGateError {
    fn from(err: base64::DecodeError) -> Self {
        KeyGateError::PrivateKeyDecode(format!("Base64 decode error: {}", err))
    }
}

impl From<std::str::Utf8Error> for KeyGateError {
    fn from(err: std::str::Utf8Error) -> Self {
        KeyGateError::PrivateKeyDecode(format!("UTF-8 decode error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, KeyGateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            KeyGateError::PrivateKeyIsNull,
            KeyGateError::PrivateKeyDecode(String::new()),
            KeyGateError::KeyGenerationFailed(String::new()),
            KeyGateError::DecryptionFailed(String::new()),
            KeyGateError::EncryptionFailed(String::new()),
            KeyGateError::EncryptionNotConfigured,
            KeyGateError::SigningFailed(String::new()),
            KeyGateError::KeyServiceUnavailable(String::new()),
            KeyGateError::ConfigError(String::new()),
            KeyGateError::InternalError(String::new()),
        ];

        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_hex_error_maps_to_decode() {
        let err: KeyGateError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, KeyGateError::PrivateKeyDecode(_)));
        assert!(err.is_caller_error());
    }
}
