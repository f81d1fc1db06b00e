use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use stateforge_core::cloud::{BucketOps, Cloud, CloudConnector, ObjectVersion, TableOps};
use stateforge_core::config::Configuration;
use stateforge_core::error::CloudError;

/// Largest batch returned by one `list_object_versions` call, mirroring
/// the paged shape of the real API.
const LIST_PAGE_SIZE: usize = 1000;

/// State of one fake bucket.
#[derive(Debug, Clone, Default)]
pub struct BucketRecord {
    pub region: String,
    pub versioning: bool,
    pub encryption: bool,
    pub public_access_block: bool,
    pub objects: Vec<ObjectVersion>,
    /// Keys that batch deletion refuses to remove, reported as a
    /// per-object error the way S3 does for locked or denied keys.
    pub locked_keys: Vec<String>,
}

#[derive(Debug)]
struct TableRecord {
    /// Number of `table_active` probes that still report "creating".
    activations_remaining: u32,
}

/// In-memory cloud backend.
///
/// All state lives in [`DashMap`]s; the async trait methods return
/// immediately. Intended for tests and local development only.
#[derive(Debug, Default)]
pub struct MemoryCloud {
    buckets: DashMap<String, BucketRecord>,
    tables: DashMap<String, TableRecord>,
    calls: DashMap<&'static str, u64>,
    failures: DashMap<&'static str, CloudError>,
    /// Applied to tables created through [`TableOps::create_table`].
    activation_polls: AtomicU32,
}

impl MemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make newly created tables report "creating" for the first `polls`
    /// activation probes.
    pub fn set_activation_polls(&self, polls: u32) {
        self.activation_polls.store(polls, Ordering::SeqCst);
    }

    /// Seed an existing, active bucket.
    pub fn seed_bucket(&self, name: &str, region: &str) {
        self.buckets.insert(
            name.to_owned(),
            BucketRecord {
                region: region.to_owned(),
                versioning: true,
                encryption: true,
                public_access_block: true,
                objects: Vec::new(),
                locked_keys: Vec::new(),
            },
        );
    }

    /// Seed an object version into an existing bucket.
    pub fn seed_object(&self, bucket: &str, key: &str, version_id: Option<&str>) {
        if let Some(mut record) = self.buckets.get_mut(bucket) {
            record.objects.push(ObjectVersion {
                key: key.to_owned(),
                version_id: version_id.map(str::to_owned),
            });
        }
    }

    /// Seed an object version that batch deletion refuses to remove.
    pub fn seed_locked_object(&self, bucket: &str, key: &str, version_id: Option<&str>) {
        self.seed_object(bucket, key, version_id);
        if let Some(mut record) = self.buckets.get_mut(bucket) {
            record.locked_keys.push(key.to_owned());
        }
    }

    /// Seed an existing, already-active table.
    pub fn seed_table(&self, name: &str) {
        self.tables.insert(
            name.to_owned(),
            TableRecord {
                activations_remaining: 0,
            },
        );
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_op(&self, op: &'static str, error: CloudError) {
        self.failures.insert(op, error);
    }

    /// How many times `op` was called.
    pub fn calls(&self, op: &str) -> u64 {
        self.calls.get(op).map_or(0, |count| *count)
    }

    /// Total capability calls across all operations.
    pub fn total_calls(&self) -> u64 {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Snapshot of a bucket's state, for assertions.
    pub fn bucket(&self, name: &str) -> Option<BucketRecord> {
        self.buckets.get(name).map(|record| record.clone())
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Record the call and pop a pending injected failure, if any.
    fn enter(&self, op: &'static str) -> Result<(), CloudError> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.failures.remove(op) {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }

    fn no_such_bucket(bucket: &str) -> CloudError {
        CloudError::Service {
            code: "NoSuchBucket".to_owned(),
            message: format!("bucket '{bucket}' does not exist"),
        }
    }
}

#[async_trait]
impl BucketOps for MemoryCloud {
    async fn bucket_region(&self, bucket: &str) -> Result<Option<String>, CloudError> {
        self.enter("bucket_exists")?;
        Ok(self.buckets.get(bucket).map(|record| record.region.clone()))
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), CloudError> {
        self.enter("create_bucket")?;
        if self.buckets.contains_key(bucket) {
            return Err(CloudError::Service {
                code: "BucketAlreadyOwnedByYou".to_owned(),
                message: format!("bucket '{bucket}' already exists"),
            });
        }
        self.buckets.insert(
            bucket.to_owned(),
            BucketRecord {
                region: region.to_owned(),
                ..BucketRecord::default()
            },
        );
        Ok(())
    }

    async fn enable_versioning(&self, bucket: &str) -> Result<(), CloudError> {
        self.enter("enable_versioning")?;
        let mut record = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        record.versioning = true;
        Ok(())
    }

    async fn enable_encryption(&self, bucket: &str) -> Result<(), CloudError> {
        self.enter("enable_encryption")?;
        let mut record = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        record.encryption = true;
        Ok(())
    }

    async fn block_public_access(&self, bucket: &str) -> Result<(), CloudError> {
        self.enter("block_public_access")?;
        let mut record = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        record.public_access_block = true;
        Ok(())
    }

    async fn list_object_versions(&self, bucket: &str) -> Result<Vec<ObjectVersion>, CloudError> {
        self.enter("list_object_versions")?;
        let record = self
            .buckets
            .get(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        Ok(record
            .objects
            .iter()
            .take(LIST_PAGE_SIZE)
            .cloned()
            .collect())
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        versions: &[ObjectVersion],
    ) -> Result<(), CloudError> {
        self.enter("delete_objects")?;
        let mut record = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        let locked = record.locked_keys.clone();
        record
            .objects
            .retain(|object| !versions.contains(object) || locked.contains(&object.key));
        // Like S3, the deletable part of the batch is removed before the
        // per-object failure is reported.
        if let Some(key) = versions
            .iter()
            .map(|version| &version.key)
            .find(|&key| locked.contains(key))
        {
            return Err(CloudError::Service {
                code: "AccessDenied".to_owned(),
                message: format!("object '{key}' not deleted: access denied"),
            });
        }
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), CloudError> {
        self.enter("delete_bucket")?;
        let Some(record) = self.buckets.get(bucket) else {
            return Err(Self::no_such_bucket(bucket));
        };
        if !record.objects.is_empty() {
            return Err(CloudError::Service {
                code: "BucketNotEmpty".to_owned(),
                message: format!("bucket '{bucket}' is not empty"),
            });
        }
        drop(record);
        self.buckets.remove(bucket);
        Ok(())
    }
}

#[async_trait]
impl TableOps for MemoryCloud {
    async fn table_exists(&self, table: &str) -> Result<bool, CloudError> {
        self.enter("table_exists")?;
        Ok(self.tables.contains_key(table))
    }

    async fn create_table(&self, table: &str) -> Result<(), CloudError> {
        self.enter("create_table")?;
        if self.tables.contains_key(table) {
            return Err(CloudError::Service {
                code: "ResourceInUseException".to_owned(),
                message: format!("table '{table}' already exists"),
            });
        }
        self.tables.insert(
            table.to_owned(),
            TableRecord {
                activations_remaining: self.activation_polls.load(Ordering::SeqCst),
            },
        );
        Ok(())
    }

    async fn table_active(&self, table: &str) -> Result<bool, CloudError> {
        self.enter("describe_table")?;
        let mut record = self.tables.get_mut(table).ok_or_else(|| CloudError::Service {
            code: "ResourceNotFoundException".to_owned(),
            message: format!("table '{table}' does not exist"),
        })?;
        if record.activations_remaining > 0 {
            record.activations_remaining -= 1;
            Ok(false)
        } else {
            Ok(true)
        }
    }

    async fn delete_table(&self, table: &str) -> Result<(), CloudError> {
        self.enter("delete_table")?;
        if self.tables.remove(table).is_none() {
            return Err(CloudError::Service {
                code: "ResourceNotFoundException".to_owned(),
                message: format!("table '{table}' does not exist"),
            });
        }
        Ok(())
    }
}

/// [`CloudConnector`] handing out the same shared [`MemoryCloud`] for
/// every request.
#[derive(Clone)]
pub struct MemoryConnector {
    cloud: Arc<MemoryCloud>,
}

impl MemoryConnector {
    pub fn new(cloud: Arc<MemoryCloud>) -> Self {
        Self { cloud }
    }
}

#[async_trait]
impl CloudConnector for MemoryConnector {
    async fn connect(&self, _config: &Configuration) -> Result<Cloud, CloudError> {
        if let Some((_, error)) = self.cloud.failures.remove("connect") {
            return Err(error);
        }
        Ok(Cloud {
            buckets: Arc::clone(&self.cloud) as Arc<dyn BucketOps>,
            tables: Arc::clone(&self.cloud) as Arc<dyn TableOps>,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_probe_bucket() {
        let cloud = MemoryCloud::new();
        assert_eq!(cloud.bucket_region("b-1").await.unwrap(), None);
        cloud.create_bucket("b-1", "eu-west-1").await.unwrap();
        assert_eq!(
            cloud.bucket_region("b-1").await.unwrap().as_deref(),
            Some("eu-west-1")
        );
        assert_eq!(cloud.calls("bucket_exists"), 2);
    }

    #[tokio::test]
    async fn duplicate_create_bucket_fails() {
        let cloud = MemoryCloud::new();
        cloud.create_bucket("b-1", "eu-west-1").await.unwrap();
        let err = cloud.create_bucket("b-1", "eu-west-1").await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::Service { ref code, .. } if code == "BucketAlreadyOwnedByYou"
        ));
    }

    #[tokio::test]
    async fn non_empty_bucket_refuses_deletion() {
        let cloud = MemoryCloud::new();
        cloud.seed_bucket("b-1", "eu-west-1");
        cloud.seed_object("b-1", "state.tf", Some("v1"));
        let err = cloud.delete_bucket("b-1").await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::Service { ref code, .. } if code == "BucketNotEmpty"
        ));
    }

    #[tokio::test]
    async fn locked_object_survives_batch_delete_with_error() {
        let cloud = MemoryCloud::new();
        cloud.seed_bucket("b-1", "eu-west-1");
        cloud.seed_object("b-1", "state.tf", Some("v1"));
        cloud.seed_locked_object("b-1", "retained.tf", Some("v1"));

        let batch = cloud.list_object_versions("b-1").await.unwrap();
        let err = cloud.delete_objects("b-1", &batch).await.unwrap_err();
        assert!(matches!(
            err,
            CloudError::Service { ref code, .. } if code == "AccessDenied"
        ));

        // The deletable key went away, the locked one did not.
        let record = cloud.bucket("b-1").unwrap();
        assert_eq!(record.objects.len(), 1);
        assert_eq!(record.objects[0].key, "retained.tf");
    }

    #[tokio::test]
    async fn table_activation_counts_down() {
        let cloud = MemoryCloud::new();
        cloud.set_activation_polls(2);
        cloud.create_table("locks").await.unwrap();
        assert!(!cloud.table_active("locks").await.unwrap());
        assert!(!cloud.table_active("locks").await.unwrap());
        assert!(cloud.table_active("locks").await.unwrap());
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let cloud = MemoryCloud::new();
        cloud.seed_bucket("b-1", "eu-west-1");
        cloud.fail_op("enable_versioning", CloudError::Throttled);
        assert!(matches!(
            cloud.enable_versioning("b-1").await.unwrap_err(),
            CloudError::Throttled
        ));
        cloud.enable_versioning("b-1").await.unwrap();
    }
}
