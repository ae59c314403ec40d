//! GreenOps provider
//!
//! Manages GreenOps `cluster` resources: registering a cluster generates an
//! agent API key, which can later be rotated, and deleting the resource
//! revokes the cluster's keys.
//!
//! - [`config`] - Provider configuration and validation
//! - [`greenops`] - Client for the GreenOps REST API
//! - [`resource`] - Provider registration and `cluster` lifecycle callbacks
//! - [`state`] - Local state used by the command-line driver

pub mod config;
pub mod error;
pub mod greenops;
pub mod resource;
pub mod state;

pub use error::{ProviderError, Result};
