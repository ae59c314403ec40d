//! `cluster` resource lifecycle
//!
//! Create, Read, Update, Delete and Exists callbacks for one resource
//! instance. Each callback issues exactly one request (Update with
//! `rotate = false` issues none) and mutates only the identity and `apikey`.
//! [`ClusterResource::apply`] chains them the way the host plans a change.

use super::data::ResourceData;
use super::schema::{cluster_schema, ResourceSchema};
use crate::error::Result;
use crate::greenops::apikeys::find_by_name;
use crate::greenops::client::validate_cluster_name;
use crate::greenops::ClusterApi;

/// What [`ClusterResource::apply`] did to reach the desired state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    Created,
    Updated,
    /// A force-new field changed: the old cluster was deleted first
    Replaced,
}

/// Lifecycle adapter for `cluster` resources
#[derive(Debug, Clone)]
pub struct ClusterResource<A> {
    api: A,
    schema: ResourceSchema,
}

impl<A: ClusterApi> ClusterResource<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            schema: cluster_schema(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Register the cluster and store the generated key.
    ///
    /// On failure the identity is left as it was.
    pub async fn create(&self, data: &mut ResourceData) -> Result<()> {
        validate_cluster_name(&data.name)?;
        let api_key = self.api.generate_api_key(&data.name).await?;

        let name = data.name.clone();
        data.set_id(&name);
        data.apikey = Some(api_key);
        tracing::info!("Created cluster {}", data.name);
        Ok(())
    }

    /// Confirm the cluster still exists remotely. Never touches `apikey`.
    pub async fn read(&self, data: &mut ResourceData) -> Result<()> {
        if self.exists(data).await? {
            let name = data.name.clone();
            data.set_id(&name);
        } else {
            tracing::info!("Cluster {} no longer exists remotely", data.name);
            data.clear_id();
        }
        Ok(())
    }

    /// Rotate the key when `rotate` is set, otherwise do nothing.
    ///
    /// `rotate` is left as configured, so every apply with `rotate = true`
    /// rotates again.
    pub async fn update(&self, data: &mut ResourceData) -> Result<()> {
        if !data.rotate {
            tracing::debug!("Cluster {} unchanged, rotate not requested", data.name);
            return Ok(());
        }
        self.rotate(data).await
    }

    /// One-shot rotation regardless of the `rotate` flag
    pub async fn rotate(&self, data: &mut ResourceData) -> Result<()> {
        validate_cluster_name(&data.name)?;
        let api_key = self.api.rotate_api_key(&data.name).await?;

        let name = data.name.clone();
        data.set_id(&name);
        data.apikey = Some(api_key);
        tracing::info!("Rotated api key of cluster {}", data.name);
        Ok(())
    }

    /// Revoke the cluster's keys and mark the resource absent
    pub async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        validate_cluster_name(&data.name)?;
        self.api.delete_api_keys(&data.name).await?;

        data.clear_id();
        tracing::info!("Deleted cluster {}", data.name);
        Ok(())
    }

    pub async fn exists(&self, data: &ResourceData) -> Result<bool> {
        let records = self.api.list_api_keys().await?;
        Ok(find_by_name(&records, &data.name).is_some())
    }

    /// Passthrough import: the id is the cluster name. Returns `None` when no
    /// such cluster exists remotely.
    pub async fn import(&self, id: &str) -> Result<Option<ResourceData>> {
        validate_cluster_name(id)?;
        let mut data = ResourceData::new(id);
        data.set_id(id);
        self.read(&mut data).await?;
        Ok(data.is_present().then_some(data))
    }

    /// Drive a tracked instance towards `desired` the way the host does.
    ///
    /// Without a present `prior`, or when it vanished remotely, the cluster
    /// is created. A change to a force-new field deletes the old cluster and
    /// creates the new one. Otherwise the prior state takes the desired
    /// `rotate`/`description` and goes through Update.
    pub async fn apply(
        &self,
        prior: Option<ResourceData>,
        desired: ResourceData,
    ) -> Result<(ResourceData, ApplyAction)> {
        validate_cluster_name(&desired.name)?;

        let Some(mut current) = prior.filter(ResourceData::is_present) else {
            return self.create_from(desired).await;
        };

        if self.schema.requires_replacement(&current, &desired) {
            if self.exists(&current).await? {
                self.delete(&mut current).await?;
            }
            let (data, _) = self.create_from(desired).await?;
            tracing::info!("Replaced cluster {} with {}", current.name, data.name);
            return Ok((data, ApplyAction::Replaced));
        }

        current.rotate = desired.rotate;
        if desired.description.is_some() {
            current.description = desired.description;
        }

        if !self.exists(&current).await? {
            return self.create_from(current).await;
        }

        self.update(&mut current).await?;
        Ok((current, ApplyAction::Updated))
    }

    async fn create_from(&self, mut data: ResourceData) -> Result<(ResourceData, ApplyAction)> {
        self.create(&mut data).await?;
        Ok((data, ApplyAction::Created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::greenops::ApiKeyRecord;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory stand-in for the GreenOps service
    #[derive(Default)]
    struct FakeApi {
        keys: Mutex<BTreeMap<String, String>>,
        counter: Mutex<u64>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn next_key(&self, cluster: &str) -> String {
            let mut counter = self.counter.lock().unwrap();
            *counter += 1;
            format!("{}-key-{}", cluster, counter)
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn remove(&self, cluster: &str) {
            self.keys.lock().unwrap().remove(cluster);
        }
    }

    #[async_trait]
    impl ClusterApi for FakeApi {
        async fn generate_api_key(&self, cluster: &str) -> Result<String> {
            self.record("generate");
            let key = self.next_key(cluster);
            self.keys
                .lock()
                .unwrap()
                .insert(cluster.to_string(), key.clone());
            Ok(key)
        }

        async fn rotate_api_key(&self, cluster: &str) -> Result<String> {
            self.record("rotate");
            let key = self.next_key(cluster);
            self.keys
                .lock()
                .unwrap()
                .insert(cluster.to_string(), key.clone());
            Ok(key)
        }

        async fn list_api_keys(&self) -> Result<Vec<ApiKeyRecord>> {
            self.record("list");
            Ok(self
                .keys
                .lock()
                .unwrap()
                .iter()
                .map(|(name, key)| ApiKeyRecord {
                    name: name.clone(),
                    api_key: key.clone(),
                })
                .collect())
        }

        async fn delete_api_keys(&self, cluster: &str) -> Result<()> {
            self.record("delete");
            match self.keys.lock().unwrap().remove(cluster) {
                Some(_) => Ok(()),
                None => Err(ProviderError::Rejected(format!("cluster {} not found", cluster))),
            }
        }
    }

    fn calls(resource: &ClusterResource<FakeApi>) -> Vec<String> {
        resource.api().calls.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_create_then_exists() {
        let resource = ClusterResource::new(FakeApi::default());
        let mut data = ResourceData::new("team-a");

        resource.create(&mut data).await.unwrap();

        assert_eq!(data.id(), Some("team-a"));
        assert_eq!(data.apikey.as_deref(), Some("team-a-key-1"));
        assert!(resource.exists(&data).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_false_for_unknown_cluster() {
        let resource = ClusterResource::new(FakeApi::default());
        assert!(!resource.exists(&ResourceData::new("ghost")).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_keeps_apikey_and_detects_removal() {
        let resource = ClusterResource::new(FakeApi::default());
        let mut data = ResourceData::new("team-a");
        resource.create(&mut data).await.unwrap();

        data.apikey = Some("stale".to_string());
        resource.read(&mut data).await.unwrap();
        assert_eq!(data.id(), Some("team-a"));
        assert_eq!(data.apikey.as_deref(), Some("stale"));

        resource.api().remove("team-a");
        resource.read(&mut data).await.unwrap();
        assert!(!data.is_present());
        assert_eq!(data.apikey.as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_update_without_rotate_is_noop() {
        let resource = ClusterResource::new(FakeApi::default());
        let mut data = ResourceData::new("team-a");
        resource.create(&mut data).await.unwrap();
        let before = data.clone();

        resource.update(&mut data).await.unwrap();

        assert_eq!(data, before);
        assert_eq!(calls(&resource), vec!["generate"]);
    }

    #[tokio::test]
    async fn test_update_with_rotate_replaces_key_every_time() {
        let resource = ClusterResource::new(FakeApi::default());
        let mut data = ResourceData::new("team-a").with_rotate(true);
        resource.create(&mut data).await.unwrap();
        let first = data.apikey.clone();

        resource.update(&mut data).await.unwrap();
        let second = data.apikey.clone();
        assert_ne!(first, second);
        assert!(data.rotate);

        resource.update(&mut data).await.unwrap();
        assert_ne!(second, data.apikey);
        assert_eq!(calls(&resource), vec!["generate", "rotate", "rotate"]);
    }

    #[tokio::test]
    async fn test_delete_then_exists() {
        let resource = ClusterResource::new(FakeApi::default());
        let mut data = ResourceData::new("team-a");
        resource.create(&mut data).await.unwrap();

        resource.delete(&mut data).await.unwrap();

        assert!(!data.is_present());
        assert!(!resource.exists(&data).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_identity() {
        let resource = ClusterResource::new(FakeApi::default());
        let mut data = ResourceData::new("team-a");
        data.set_id("team-a");

        let err = resource.delete(&mut data).await.unwrap_err();

        assert_eq!(err.to_string(), "cluster team-a not found");
        assert_eq!(data.id(), Some("team-a"));
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected_before_any_call() {
        let resource = ClusterResource::new(FakeApi::default());
        let mut data = ResourceData::new("");

        let err = resource.create(&mut data).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidName(_)));
        assert!(!data.is_present());
        assert!(data.apikey.is_none());

        data.rotate = true;
        assert!(resource.update(&mut data).await.is_err());
        assert!(resource.delete(&mut data).await.is_err());
        assert!(resource.import("").await.is_err());
        assert!(calls(&resource).is_empty());
    }

    #[tokio::test]
    async fn test_dot_names_are_rejected() {
        let resource = ClusterResource::new(FakeApi::default());

        for name in [".", ".."] {
            let mut data = ResourceData::new(name);
            assert!(matches!(
                resource.create(&mut data).await,
                Err(ProviderError::InvalidName(_))
            ));
            assert!(!data.is_present());
        }
        assert!(calls(&resource).is_empty());
    }

    #[tokio::test]
    async fn test_apply_creates_untracked_cluster() {
        let resource = ClusterResource::new(FakeApi::default());

        let (data, action) = resource
            .apply(None, ResourceData::new("team-a"))
            .await
            .unwrap();

        assert_eq!(action, ApplyAction::Created);
        assert_eq!(data.id(), Some("team-a"));
        assert_eq!(calls(&resource), vec!["generate"]);
    }

    #[tokio::test]
    async fn test_apply_updates_tracked_cluster() {
        let resource = ClusterResource::new(FakeApi::default());
        let (prior, _) = resource
            .apply(None, ResourceData::new("team-a"))
            .await
            .unwrap();

        let desired = ResourceData::new("team-a")
            .with_rotate(true)
            .with_description(Some("prod".to_string()));
        let (data, action) = resource.apply(Some(prior.clone()), desired).await.unwrap();

        assert_eq!(action, ApplyAction::Updated);
        assert_ne!(data.apikey, prior.apikey);
        assert_eq!(data.description.as_deref(), Some("prod"));
        assert_eq!(calls(&resource), vec!["generate", "list", "rotate"]);
    }

    #[tokio::test]
    async fn test_apply_recreates_cluster_removed_remotely() {
        let resource = ClusterResource::new(FakeApi::default());
        let (prior, _) = resource
            .apply(None, ResourceData::new("team-a"))
            .await
            .unwrap();
        resource.api().remove("team-a");

        let (data, action) = resource
            .apply(Some(prior), ResourceData::new("team-a"))
            .await
            .unwrap();

        assert_eq!(action, ApplyAction::Created);
        assert!(resource.exists(&data).await.unwrap());
    }

    #[tokio::test]
    async fn test_apply_name_change_replaces_cluster() {
        let resource = ClusterResource::new(FakeApi::default());
        let (prior, _) = resource
            .apply(None, ResourceData::new("team-a"))
            .await
            .unwrap();

        let (data, action) = resource
            .apply(Some(prior.clone()), ResourceData::new("team-b"))
            .await
            .unwrap();

        assert_eq!(action, ApplyAction::Replaced);
        assert_eq!(data.id(), Some("team-b"));
        assert!(!resource.exists(&prior).await.unwrap());
        assert!(resource.exists(&data).await.unwrap());
        assert_eq!(
            calls(&resource),
            vec!["generate", "list", "delete", "generate", "list", "list"]
        );
    }

    #[tokio::test]
    async fn test_import() {
        let resource = ClusterResource::new(FakeApi::default());
        let mut data = ResourceData::new("team-a");
        resource.create(&mut data).await.unwrap();

        let imported = resource.import("team-a").await.unwrap().unwrap();
        assert_eq!(imported.id(), Some("team-a"));
        assert_eq!(imported.name, "team-a");
        assert!(imported.apikey.is_none());

        assert!(resource.import("ghost").await.unwrap().is_none());
    }
}
