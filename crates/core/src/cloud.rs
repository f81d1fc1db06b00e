use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Configuration;
use crate::error::CloudError;

/// One object version (or delete marker) within a bucket.
///
/// S3 requires a bucket to be empty before deletion, and a versioned
/// bucket is only empty once every version and delete marker is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    pub key: String,
    /// `None` for objects in unversioned buckets.
    pub version_id: Option<String>,
}

/// Bucket capability interface.
///
/// Implementations translate each operation into a single provider call
/// and classify failures into [`CloudError`]; they perform no retries and
/// no orchestration of their own; ordering and idempotence live in the
/// workflow.
#[async_trait]
pub trait BucketOps: Send + Sync {
    /// Existence probe. Returns the bucket's region when it exists,
    /// `None` when it does not.
    async fn bucket_region(&self, bucket: &str) -> Result<Option<String>, CloudError>;

    /// Create the bucket in the given region.
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), CloudError>;

    /// Enable object versioning.
    async fn enable_versioning(&self, bucket: &str) -> Result<(), CloudError>;

    /// Enable default server-side encryption (AES-256).
    async fn enable_encryption(&self, bucket: &str) -> Result<(), CloudError>;

    /// Block all public access to the bucket.
    async fn block_public_access(&self, bucket: &str) -> Result<(), CloudError>;

    /// List one page of object versions and delete markers.
    async fn list_object_versions(&self, bucket: &str) -> Result<Vec<ObjectVersion>, CloudError>;

    /// Delete the given object versions.
    async fn delete_objects(
        &self,
        bucket: &str,
        versions: &[ObjectVersion],
    ) -> Result<(), CloudError>;

    /// Delete the (empty) bucket.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), CloudError>;
}

/// Lock-table capability interface.
#[async_trait]
pub trait TableOps: Send + Sync {
    /// Existence probe.
    async fn table_exists(&self, table: &str) -> Result<bool, CloudError>;

    /// Create the lock table: primary key `LockID` (string), on-demand
    /// billing. Creation is asynchronous on the provider side; pair with
    /// [`table_active`](Self::table_active) polling.
    async fn create_table(&self, table: &str) -> Result<(), CloudError>;

    /// Describe-table probe: `true` once the table reports active.
    async fn table_active(&self, table: &str) -> Result<bool, CloudError>;

    /// Delete the table.
    async fn delete_table(&self, table: &str) -> Result<(), CloudError>;
}

/// A connected pair of capability handles for one request.
#[derive(Clone)]
pub struct Cloud {
    pub buckets: Arc<dyn BucketOps>,
    pub tables: Arc<dyn TableOps>,
}

/// Builds capability handles for a validated configuration.
///
/// Region and credentials vary per request, so clients are constructed
/// through this seam rather than held as process-wide state; tests inject
/// a fake connector without touching the environment.
#[async_trait]
pub trait CloudConnector: Send + Sync {
    async fn connect(&self, config: &Configuration) -> Result<Cloud, CloudError>;
}
