//! Resource abstraction layer
//!
//! This module holds everything the host sees of the provider: the declared
//! schemas and the lifecycle callbacks of the `cluster` resource.
//!
//! # Architecture
//!
//! - [`schema`] - Provider registration, configuration resolution, wiring
//! - [`data`] - Per-instance field values tracked by the host
//! - [`cluster`] - Create/Read/Update/Delete/Exists/Import callbacks and apply
//!
//! # Example
//!
//! ```ignore
//! use greenops_provider::config::ProviderConfig;
//! use greenops_provider::resource::{configure, ResourceData};
//!
//! async fn register(config: &ProviderConfig) -> greenops_provider::Result<ResourceData> {
//!     let clusters = configure(config)?;
//!     let mut data = ResourceData::new("team-a");
//!     clusters.create(&mut data).await?;
//!     Ok(data)
//! }
//! ```

pub mod cluster;
pub mod data;
pub mod schema;

pub use cluster::{ApplyAction, ClusterResource};
pub use data::ResourceData;
pub use schema::{configure, configure_with_signer, provider, ProviderSchema, ResourceSchema, CLUSTER_RESOURCE};
