//! GreenOps API interaction module
//!
//! This module provides the pieces needed to talk to the GreenOps cluster API:
//! request signing, the HTTP wrapper, API key payloads and the client that
//! ties them together.
//!
//! # Module Structure
//!
//! - [`auth`] - Request signing with the provider token
//! - [`http`] - HTTP utilities for REST API calls
//! - [`apikeys`] - API key payloads and decoding
//! - [`client`] - Client implementing [`ClusterApi`] against the real service
//!
//! # Example
//!
//! ```ignore
//! use greenops_provider::config::ProviderConfig;
//! use greenops_provider::greenops::{ClusterApi, GreenOpsClient};
//!
//! async fn example() -> greenops_provider::Result<()> {
//!     let config = ProviderConfig::new("https://api.greenops.io", "acme", "token");
//!     let client = GreenOpsClient::new(&config)?;
//!     let keys = client.list_api_keys().await?;
//!     Ok(())
//! }
//! ```

pub mod apikeys;
pub mod auth;
pub mod client;
pub mod http;

use crate::error::Result;
use async_trait::async_trait;

pub use apikeys::ApiKeyRecord;
pub use client::GreenOpsClient;

/// The four calls the cluster resource needs from the remote service.
///
/// Implemented by [`GreenOpsClient`]; tests substitute an in-memory version.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Register the cluster and return the freshly generated key
    async fn generate_api_key(&self, cluster: &str) -> Result<String>;

    /// Replace the cluster's key and return the new one
    async fn rotate_api_key(&self, cluster: &str) -> Result<String>;

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>>;

    /// Revoke every key of the cluster
    async fn delete_api_keys(&self, cluster: &str) -> Result<()>;
}
