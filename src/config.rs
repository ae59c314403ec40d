//! Configuration Management
//!
//! Resolved provider configuration and its validation.

use crate::error::{ProviderError, Result};
use std::time::Duration;
use url::Url;

/// Environment fallback for `address`
pub const ENV_ADDRESS: &str = "SERVICE_ADDRESS";
/// Environment fallback for `org`
pub const ENV_ORG: &str = "ORG_NAME";
/// Environment fallback for `token`
pub const ENV_TOKEN: &str = "SERVICE_TOKEN";

pub const DEFAULT_ORG: &str = "org";

/// Every request is bounded by this unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// How response payloads that don't match the expected shape are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Malformed payloads and missing fields are errors
    #[default]
    Strict,
    /// Malformed payloads degrade to an empty key / empty list
    Lenient,
}

/// Provider configuration after flag/env/default resolution
#[derive(Clone)]
pub struct ProviderConfig {
    pub address: String,
    pub org: String,
    pub token: String,
    pub timeout: Duration,
    pub decode: DecodePolicy,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("address", &self.address)
            .field("org", &self.org)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("decode", &self.decode)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(address: &str, org: &str, token: &str) -> Self {
        Self {
            address: address.to_string(),
            org: org.to_string(),
            token: token.to_string(),
            timeout: DEFAULT_TIMEOUT,
            decode: DecodePolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_decode_policy(mut self, decode: DecodePolicy) -> Self {
        self.decode = decode;
        self
    }

    /// Check the values the host handed us. Reachability is not checked;
    /// that surfaces on the first request.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(ProviderError::Config(format!(
                "address is required (set it or {})",
                ENV_ADDRESS
            )));
        }

        let url = Url::parse(self.address.trim())
            .map_err(|e| ProviderError::Config(format!("invalid address {:?}: {}", self.address, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProviderError::Config(format!(
                "address must use http or https, got {}",
                url.scheme()
            )));
        }

        if matches!(self.org.as_str(), "" | "." | "..") {
            return Err(ProviderError::Config(format!("invalid org {:?}", self.org)));
        }

        if self.token.is_empty() {
            return Err(ProviderError::Config(format!(
                "token is required (set it or {})",
                ENV_TOKEN
            )));
        }

        if self.timeout.is_zero() {
            return Err(ProviderError::Config("timeout must be positive".to_string()));
        }

        Ok(())
    }

    /// Address without trailing slashes, ready for path concatenation
    pub fn base_address(&self) -> &str {
        self.address.trim().trim_end_matches('/')
    }
}
