//! Provider Registration
//!
//! Declares the provider configuration schema and the `cluster` resource
//! schema, resolves configuration from explicit values and environment
//! fallbacks, and wires the lifecycle adapter to a configured client.

use super::cluster::ClusterResource;
use super::data::ResourceData;
use crate::config::{ProviderConfig, DEFAULT_ORG, ENV_ADDRESS, ENV_ORG, ENV_TOKEN};
use crate::error::{ProviderError, Result};
use crate::greenops::auth::{BearerToken, RequestSigner};
use crate::greenops::GreenOpsClient;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Resource type name registered with the host
pub const CLUSTER_RESOURCE: &str = "cluster";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Bool,
}

/// Default value for a field, either a literal or read from the environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDefault {
    Literal(serde_json::Value),
    Env { var: &'static str, fallback: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub kind: FieldType,
    pub description: &'static str,
    pub required: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Changing the value replaces the resource
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldDefault>,
}

impl FieldSchema {
    fn new(kind: FieldType, description: &'static str) -> Self {
        Self {
            kind,
            description,
            required: false,
            computed: false,
            sensitive: false,
            force_new: false,
            default: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    fn env_default(mut self, var: &'static str, fallback: &str) -> Self {
        self.default = Some(FieldDefault::Env {
            var,
            fallback: fallback.to_string(),
        });
        self
    }

    fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = Some(FieldDefault::Literal(value));
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub fields: BTreeMap<&'static str, FieldSchema>,
    /// `terraform import` takes the id as the cluster name
    pub importable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchema {
    pub fields: BTreeMap<&'static str, FieldSchema>,
    pub resources: BTreeMap<&'static str, ResourceSchema>,
}

/// The provider as registered with the host
pub fn provider() -> ProviderSchema {
    let fields = BTreeMap::from([
        (
            "address",
            FieldSchema::new(FieldType::String, "Base address of the GreenOps API")
                .required()
                .env_default(ENV_ADDRESS, ""),
        ),
        (
            "org",
            FieldSchema::new(FieldType::String, "Organization owning the clusters")
                .env_default(ENV_ORG, DEFAULT_ORG),
        ),
        (
            "token",
            FieldSchema::new(FieldType::String, "Token used to authenticate API calls")
                .required()
                .sensitive()
                .env_default(ENV_TOKEN, ""),
        ),
    ]);

    ProviderSchema {
        fields,
        resources: BTreeMap::from([(CLUSTER_RESOURCE, cluster_schema())]),
    }
}

/// Schema of the `cluster` resource
pub fn cluster_schema() -> ResourceSchema {
    let fields = BTreeMap::from([
        (
            "name",
            FieldSchema::new(
                FieldType::String,
                "Name of the cluster where the GreenOps agent should be installed",
            )
            .required()
            .force_new(),
        ),
        (
            "rotate",
            FieldSchema::new(FieldType::Bool, "Set to true to rotate the apikey used by the agent")
                .default_value(serde_json::Value::Bool(false)),
        ),
        (
            "description",
            FieldSchema::new(FieldType::String, "Description or notes for the cluster"),
        ),
        (
            "apikey",
            FieldSchema::new(
                FieldType::String,
                "API key that is defined when the GreenOps agent is created",
            )
            .computed()
            .sensitive(),
        ),
    ]);

    ResourceSchema {
        fields,
        importable: true,
    }
}

impl ProviderSchema {
    /// Resolve provider configuration: explicit value, then the field's
    /// environment variable, then its fallback. Required fields that end up
    /// empty are rejected.
    pub fn resolve_config<F>(&self, explicit: &HashMap<&str, String>, env: F) -> Result<ProviderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut resolved = HashMap::new();

        for (name, field) in &self.fields {
            let value = explicit
                .get(name)
                .cloned()
                .or_else(|| match &field.default {
                    Some(FieldDefault::Env { var, fallback }) => {
                        Some(env(var).unwrap_or_else(|| fallback.clone()))
                    }
                    Some(FieldDefault::Literal(serde_json::Value::String(s))) => Some(s.clone()),
                    _ => None,
                })
                .unwrap_or_default();

            if field.required && value.is_empty() {
                return Err(ProviderError::Config(format!("{} is required", name)));
            }
            resolved.insert(*name, value);
        }

        let get = |name: &str| resolved.get(name).map(String::as_str).unwrap_or_default();
        let config = ProviderConfig::new(get("address"), get("org"), get("token"));
        config.validate()?;
        Ok(config)
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceSchema> {
        self.resources.get(name)
    }
}

impl ResourceSchema {
    /// True when moving from `old` to `new` touches a force-new field
    pub fn requires_replacement(&self, old: &ResourceData, new: &ResourceData) -> bool {
        self.fields
            .iter()
            .filter(|(_, field)| field.force_new)
            .any(|(name, _)| match *name {
                "name" => old.name != new.name,
                _ => false,
            })
    }
}

/// Build the configured `cluster` lifecycle adapter
pub fn configure(config: &ProviderConfig) -> Result<ClusterResource<GreenOpsClient>> {
    configure_with_signer(config, Arc::new(BearerToken::new(&config.token)))
}

/// Like [`configure`], for gateways that expect the token another way
pub fn configure_with_signer(
    config: &ProviderConfig,
    signer: Arc<dyn RequestSigner>,
) -> Result<ClusterResource<GreenOpsClient>> {
    let client = GreenOpsClient::with_signer(config, signer)?;
    tracing::info!(
        "Provider configured for {} (org {}), timeout {:?}",
        client.address(),
        client.org(),
        config.timeout
    );
    Ok(ClusterResource::new(client))
}
