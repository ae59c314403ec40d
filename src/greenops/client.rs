//! GreenOps Client
//!
//! Main client for the GreenOps cluster API, combining request signing,
//! HTTP and payload decoding.

use super::apikeys::{decode_api_key, decode_api_key_list, ApiKeyRecord};
use super::auth::{BearerToken, RequestSigner};
use super::http::{sanitize_for_log, GreenOpsHttpClient};
use super::ClusterApi;
use crate::config::{DecodePolicy, ProviderConfig};
use crate::error::{ProviderError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;

/// Main GreenOps client. Immutable once built; cheap to clone.
#[derive(Clone)]
pub struct GreenOpsClient {
    http: GreenOpsHttpClient,
    address: String,
    org: String,
    decode: DecodePolicy,
}

impl std::fmt::Debug for GreenOpsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GreenOpsClient")
            .field("address", &self.address)
            .field("org", &self.org)
            .field("decode", &self.decode)
            .finish_non_exhaustive()
    }
}

/// Reject names that cannot be sent as one path segment. Percent-encoding
/// leaves `.` and `..` untouched and the URL parser then resolves them as
/// dot segments, escaping the cluster's path.
pub fn validate_cluster_name(cluster: &str) -> Result<()> {
    match cluster {
        "" | "." | ".." => Err(ProviderError::InvalidName(cluster.to_string())),
        _ => Ok(()),
    }
}

impl GreenOpsClient {
    /// Build a client from validated configuration, signing with a bearer token
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Self::with_signer(config, Arc::new(BearerToken::new(&config.token)))
    }

    /// Build a client from validated configuration with a custom signer
    pub fn with_signer(config: &ProviderConfig, signer: Arc<dyn RequestSigner>) -> Result<Self> {
        config.validate()?;
        let http = GreenOpsHttpClient::new(config.timeout, signer)?;
        Ok(Self::with_http_client(config, http))
    }

    /// Build a client around an injected HTTP client (custom signer, test transport)
    pub fn with_http_client(config: &ProviderConfig, http: GreenOpsHttpClient) -> Self {
        Self {
            http,
            address: config.base_address().to_string(),
            org: config.org.clone(),
            decode: config.decode,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build a URL under `/api/cluster/{org}`
    fn org_url(&self, path: &str) -> String {
        format!(
            "{}/api/cluster/{}/{}",
            self.address,
            urlencoding::encode(&self.org),
            path
        )
    }

    /// Build a URL under `/api/cluster/{org}/{cluster}`; the cluster name is
    /// always a single escaped path segment
    fn cluster_url(&self, cluster: &str, path: &str) -> String {
        self.org_url(&format!("{}/{}", urlencoding::encode(cluster), path))
    }

    pub fn generate_url(&self, cluster: &str) -> String {
        self.cluster_url(cluster, "apikeys/generate")
    }

    pub fn rotate_url(&self, cluster: &str) -> String {
        self.cluster_url(cluster, "apikeys/rotate")
    }

    pub fn delete_url(&self, cluster: &str) -> String {
        self.cluster_url(cluster, "apikeys")
    }

    pub fn list_url(&self) -> String {
        self.org_url("apikeys/cluster")
    }
}

#[async_trait]
impl ClusterApi for GreenOpsClient {
    async fn generate_api_key(&self, cluster: &str) -> Result<String> {
        validate_cluster_name(cluster)?;
        let body = self.http.post(&self.generate_url(cluster)).await?;
        decode_api_key(&body, self.decode)
    }

    async fn rotate_api_key(&self, cluster: &str) -> Result<String> {
        validate_cluster_name(cluster)?;
        let body = self.http.post(&self.rotate_url(cluster)).await?;
        decode_api_key(&body, self.decode)
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>> {
        let body = self.http.get(&self.list_url()).await?;
        decode_api_key_list(&body, self.decode)
    }

    async fn delete_api_keys(&self, cluster: &str) -> Result<()> {
        validate_cluster_name(cluster)?;
        let response = self.http.delete(&self.delete_url(cluster)).await?;

        if response.status == StatusCode::OK {
            return Ok(());
        }

        tracing::error!(
            "Delete of cluster {} rejected: {} - {}",
            cluster,
            response.status,
            sanitize_for_log(&response.body)
        );
        Err(ProviderError::Rejected(response.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(address: &str, org: &str) -> GreenOpsClient {
        GreenOpsClient::new(&ProviderConfig::new(address, org, "token")).unwrap()
    }

    #[test]
    fn test_url_templates() {
        let client = client("https://api.greenops.io/", "acme");
        assert_eq!(
            client.generate_url("team-a"),
            "https://api.greenops.io/api/cluster/acme/team-a/apikeys/generate"
        );
        assert_eq!(
            client.rotate_url("team-a"),
            "https://api.greenops.io/api/cluster/acme/team-a/apikeys/rotate"
        );
        assert_eq!(
            client.delete_url("team-a"),
            "https://api.greenops.io/api/cluster/acme/team-a/apikeys"
        );
        assert_eq!(
            client.list_url(),
            "https://api.greenops.io/api/cluster/acme/apikeys/cluster"
        );
    }

    #[test]
    fn test_cluster_name_is_escaped() {
        let client = client("http://localhost:8080", "my org");
        assert_eq!(
            client.delete_url("../admin?x=1#frag"),
            "http://localhost:8080/api/cluster/my%20org/..%2Fadmin%3Fx%3D1%23frag/apikeys"
        );
    }

    #[test]
    fn test_validate_cluster_name() {
        for name in ["", ".", ".."] {
            assert!(matches!(
                validate_cluster_name(name),
                Err(ProviderError::InvalidName(n)) if n == name
            ));
        }
        for name in ["team-a", "...", ".a", "a.", "a/.."] {
            assert!(validate_cluster_name(name).is_ok(), "{} should be accepted", name);
        }
    }

    #[tokio::test]
    async fn test_dot_segment_names_never_reach_the_wire() {
        // Nothing listens on this address; a request would be a transport error
        let client = client("http://127.0.0.1:9", "acme");

        for name in [".", ".."] {
            assert!(matches!(
                client.delete_api_keys(name).await,
                Err(ProviderError::InvalidName(_))
            ));
            assert!(matches!(
                client.generate_api_key(name).await,
                Err(ProviderError::InvalidName(_))
            ));
            assert!(matches!(
                client.rotate_api_key(name).await,
                Err(ProviderError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(matches!(
            GreenOpsClient::new(&ProviderConfig::new("", "org", "token")),
            Err(ProviderError::Config(_))
        ));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let client = client("http://localhost", "org");
        assert!(!format!("{:?}", client).contains("token"));
    }
}
