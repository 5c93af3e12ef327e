//! Remote key service resolver
//!
//! Resolves a user identifier to key material by querying the configured
//! key-service endpoints one after another. Any failure of a single endpoint
//! (transport error, timeout, HTTP error status, malformed body, non-zero
//! response code) is logged and the next endpoint is tried. Running out of
//! endpoints is reported as "nothing found", not as an error.

use crate::config::KeyServiceConfig;
use crate::crypto::KeyMaterial;
use crate::errors::{KeyGateError, Result};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Response envelope returned by a key service endpoint
#[derive(Debug, Deserialize)]
pub struct KeyServiceResponse {
    pub code: i64,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl KeyServiceResponse {
    /// Extract the key material, treating every non-success shape as a failure
    pub fn into_key_material(self) -> Result<KeyMaterial> {
        if self.code != 0 {
            return Err(KeyGateError::KeyServiceUnavailable(format!(
                "code {}: {}",
                self.code,
                self.message.unwrap_or_default()
            )));
        }

        let data = self
            .data
            .filter(|d| !d.is_null())
            .ok_or_else(|| KeyGateError::KeyServiceUnavailable("code 0 without data".to_string()))?;

        let material: KeyMaterial = serde_json::from_value(data).map_err(|e| {
            KeyGateError::KeyServiceUnavailable(format!("malformed key material: {}", e))
        })?;

        if material.is_empty() {
            return Err(KeyGateError::KeyServiceUnavailable(
                "key material without private key".to_string(),
            ));
        }

        Ok(material)
    }
}

/// Ordered failover client over the key service endpoints
#[derive(Debug, Clone)]
pub struct RemoteKeyResolver {
    client: Client,
    endpoints: Vec<String>,
    scheme: String,
    path: String,
    overall_timeout: Option<Duration>,
}

impl RemoteKeyResolver {
    /// Create a resolver from configuration
    pub fn new(config: &KeyServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| KeyGateError::ConfigError(format!("HTTP client: {}", e)))?;

        let endpoints = config.endpoint_list();
        info!("Key service resolver configured with {} endpoints", endpoints.len());

        Ok(Self {
            client,
            endpoints,
            scheme: config.scheme.clone(),
            path: config.path.trim_matches('/').to_string(),
            overall_timeout: config.overall_timeout(),
        })
    }

    /// Configured endpoints in query order
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Build `<scheme>://<endpoint>/<path>/<user>` with `user` as one encoded segment
    pub fn key_url(&self, endpoint: &str, user: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}://{}/", self.scheme, endpoint))
            .map_err(|e| KeyGateError::ConfigError(format!("endpoint {}: {}", endpoint, e)))?;

        url.path_segments_mut()
            .map_err(|_| KeyGateError::ConfigError(format!("endpoint {} cannot be a base", endpoint)))?
            .pop_if_empty()
            .extend(self.path.split('/').filter(|s| !s.is_empty()))
            .push(user);

        Ok(url)
    }

    /// Resolve `user` against the endpoints in order; `None` if none could help
    pub async fn resolve(&self, user: &str) -> Option<KeyMaterial> {
        let attempts = self.try_endpoints(user);

        match self.overall_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, attempts).await {
                Ok(found) => found,
                Err(_) => {
                    warn!(
                        "Key resolution for user {} exceeded overall deadline of {:?}",
                        user, deadline
                    );
                    None
                }
            },
            None => attempts.await,
        }
    }

    async fn try_endpoints(&self, user: &str) -> Option<KeyMaterial> {
        for endpoint in &self.endpoints {
            match self.fetch(endpoint, user).await {
                Ok(material) => {
                    info!("Resolved key for user {} from {}", user, endpoint);
                    return Some(material);
                }
                Err(e) => {
                    warn!("user:{} key lookup via {} failed: {}", user, endpoint, e);
                }
            }
        }

        warn!(
            "No key service endpoint resolved user {} ({} tried)",
            user,
            self.endpoints.len()
        );
        None
    }

    /// Single request against one endpoint
    async fn fetch(&self, endpoint: &str, user: &str) -> Result<KeyMaterial> {
        let url = self.key_url(endpoint, user)?;
        debug!("Requesting key from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| KeyGateError::KeyServiceUnavailable(e.to_string()))?;

        let envelope: KeyServiceResponse = response
            .json()
            .await
            .map_err(|e| KeyGateError::KeyServiceUnavailable(format!("invalid body: {}", e)))?;

        envelope.into_key_material()
    }
}
