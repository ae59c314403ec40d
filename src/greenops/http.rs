//! HTTP utilities for GreenOps REST API calls

use super::auth::RequestSigner;
use crate::error::{ProviderError, Result};
use reqwest::{Client, Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const USER_AGENT: &str = concat!("terraform-provider-greenops/", env!("CARGO_PKG_VERSION"));

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// Status and body of a completed request
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    /// Turn any non-2xx answer into [`ProviderError::Api`]
    pub fn into_success_body(self) -> Result<String> {
        if !self.status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", self.status, sanitize_for_log(&self.body));
            return Err(ProviderError::Api {
                status: self.status,
                body: sanitize_for_log(&self.body),
            });
        }
        Ok(self.body)
    }
}

/// HTTP client wrapper for GreenOps API calls
#[derive(Clone)]
pub struct GreenOpsHttpClient {
    client: Client,
    signer: Arc<dyn RequestSigner>,
}

impl GreenOpsHttpClient {
    /// Create a new HTTP client whose requests give up after `timeout`
    pub fn new(timeout: Duration, signer: Arc<dyn RequestSigner>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, signer })
    }

    /// Wrap an already configured client, e.g. one pointed at a test server
    pub fn with_client(client: Client, signer: Arc<dyn RequestSigner>) -> Self {
        Self { client, signer }
    }

    /// Send a body-less request and read the whole response
    pub async fn send(&self, method: Method, url: &str) -> Result<RawResponse> {
        tracing::debug!("{} {}", method, url);

        let request = self.signer.sign(self.client.request(method, url));
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("-> {} ({} bytes)", status, body.len());

        Ok(RawResponse { status, body })
    }

    /// Make a GET request, failing on non-2xx
    pub async fn get(&self, url: &str) -> Result<String> {
        self.send(Method::GET, url).await?.into_success_body()
    }

    /// Make a POST request with an empty body, failing on non-2xx
    pub async fn post(&self, url: &str) -> Result<String> {
        self.send(Method::POST, url).await?.into_success_body()
    }

    /// Make a DELETE request; status interpretation is left to the caller
    pub async fn delete(&self, url: &str) -> Result<RawResponse> {
        self.send(Method::DELETE, url).await
    }
}
