//! Local resource state
//!
//! The command-line driver keeps the tracked `cluster` instances in a JSON
//! file, standing in for the state the host would normally own.

use crate::error::{ProviderError, Result};
use crate::resource::ResourceData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One tracked instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEntry {
    pub data: ResourceData,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    clusters: BTreeMap<String, StateEntry>,
}

/// Tracked instances keyed by resource address (the instance's label in the
/// host's configuration, which outlives a rename of the cluster)
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    file: StateFile,
}

impl StateStore {
    /// Directory holding the state file and the provider log
    pub fn default_dir() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            return config_dir.join("terraform-provider-greenops");
        }
        if let Some(home) = dirs::home_dir() {
            return home.join(".terraform-provider-greenops");
        }
        PathBuf::from(".")
    }

    pub fn default_path() -> PathBuf {
        Self::default_dir().join("state.json")
    }

    /// Load state from disk; a missing file is an empty state. A file that
    /// doesn't parse is an error rather than silently forgetting resources.
    pub fn load(path: &Path) -> Result<Self> {
        let file = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ProviderError::State(format!("reading {}: {}", path.display(), e)))?;
            serde_json::from_str(&content)
                .map_err(|e| ProviderError::State(format!("parsing {}: {}", path.display(), e)))?
        } else {
            StateFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Save state to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProviderError::State(format!("creating {}: {}", parent.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(&self.file)
            .map_err(|e| ProviderError::State(format!("serializing state: {}", e)))?;
        std::fs::write(&self.path, content)
            .map_err(|e| ProviderError::State(format!("writing {}: {}", self.path.display(), e)))?;

        tracing::debug!("Saved {} tracked clusters to {:?}", self.file.clusters.len(), self.path);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, address: &str) -> Option<&ResourceData> {
        self.file.clusters.get(address).map(|entry| &entry.data)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &StateEntry)> {
        self.file.clusters.iter()
    }

    /// Record `data` under `address`: kept while it has an identity,
    /// dropped once absent
    pub fn record(&mut self, address: &str, data: &ResourceData) {
        if data.is_present() {
            self.file.clusters.insert(
                address.to_string(),
                StateEntry {
                    data: data.clone(),
                    updated_at: Utc::now(),
                },
            );
        } else {
            self.file.clusters.remove(address);
        }
    }
}
