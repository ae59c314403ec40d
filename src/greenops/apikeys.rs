//! GreenOps API keys
//!
//! Payloads returned by the key endpoints and how they are decoded.

use crate::config::DecodePolicy;
use crate::error::{ProviderError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the "list api keys" endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRecord {
    pub name: String,
    pub api_key: String,
}

/// Extract `apiKey` from a generate/rotate response body
pub fn decode_api_key(body: &str, policy: DecodePolicy) -> Result<String> {
    let parsed = serde_json::from_str::<Value>(body).map_err(ProviderError::from);

    let api_key = parsed.and_then(|value| match value.get("apiKey") {
        Some(Value::String(key)) => Ok(key.clone()),
        Some(other) => Err(ProviderError::Decode(serde::de::Error::custom(format!(
            "apiKey is not a string: {}",
            other
        )))),
        None => Err(ProviderError::MissingApiKey),
    });

    match (api_key, policy) {
        (Ok(key), _) => Ok(key),
        (Err(e), DecodePolicy::Lenient) => {
            tracing::warn!("Ignoring undecodable api key response: {}", e);
            Ok(String::new())
        }
        (Err(e), DecodePolicy::Strict) => Err(e),
    }
}

/// Decode the body of the "list api keys" endpoint
pub fn decode_api_key_list(body: &str, policy: DecodePolicy) -> Result<Vec<ApiKeyRecord>> {
    match serde_json::from_str::<Vec<ApiKeyRecord>>(body) {
        Ok(records) => Ok(records),
        Err(e) if policy == DecodePolicy::Lenient => {
            tracing::warn!("Treating undecodable api key list as empty: {}", e);
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Linear scan for the record belonging to `cluster`
pub fn find_by_name<'a>(records: &'a [ApiKeyRecord], cluster: &str) -> Option<&'a ApiKeyRecord> {
    records.iter().find(|record| record.name == cluster)
}
