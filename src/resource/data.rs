//! Resource instance data
//!
//! The per-instance values the host tracks for a `cluster` resource.

use serde::{Deserialize, Serialize};

/// Fields of one `cluster` resource instance.
///
/// `id` is the tracked identity: `Some` while the host considers the resource
/// present. `apikey` caches the remote secret and is only written by create
/// and rotate.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub rotate: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub apikey: Option<String>,
}

impl std::fmt::Debug for ResourceData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceData")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("rotate", &self.rotate)
            .field("description", &self.description)
            .field("apikey", &self.apikey.as_ref().map(|_| "<sensitive>"))
            .finish()
    }
}

impl ResourceData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: &str) {
        self.id = Some(id.to_string());
    }

    /// Mark the resource absent
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn is_present(&self) -> bool {
        self.id.is_some()
    }
}
