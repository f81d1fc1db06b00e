use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::cloud::{CloudConnector, TableOps};
use crate::config::{Configuration, LockingMechanism};
use crate::error::{CloudError, ProvisionError, ProvisionFailure, ResourceKind};
use crate::result::{ProvisionAction, ProvisioningResult, ResourceStatus};

/// Budget for the bounded table-activation poll.
#[derive(Debug, Clone, Copy)]
pub struct TableWaitConfig {
    /// Fixed delay between describe-table probes.
    pub delay: Duration,
    /// Number of probes before giving up with a timeout error.
    pub max_attempts: u32,
}

impl Default for TableWaitConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_attempts: 20,
        }
    }
}

/// The provisioning workflow: ordered, idempotent create/delete of the
/// bucket/table pair behind a Terraform backend.
///
/// Each action runs its remote operations sequentially; correctness
/// depends on ordering (table before bucket on delete), not throughput.
/// There are no internal retries apart from the bounded activation poll;
/// the idempotent `already_exists` / `not_found` branches make a re-run
/// the retry mechanism.
pub struct Provisioner {
    connector: Arc<dyn CloudConnector>,
    wait: TableWaitConfig,
}

impl Provisioner {
    pub fn new(connector: Arc<dyn CloudConnector>) -> Self {
        Self {
            connector,
            wait: TableWaitConfig::default(),
        }
    }

    /// Override the activation poll budget.
    #[must_use]
    pub fn with_wait(mut self, wait: TableWaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Create the backend resources described by `config`.
    ///
    /// Existing resources are reported `already_exists`, never recreated.
    /// The bucket hardening steps (versioning, encryption, public-access
    /// block) are applied for fresh buckets and re-applied for existing
    /// ones, so a re-run after a partial hardening failure converges.
    #[instrument(skip_all, fields(bucket = %config.bucket_name(), region = %config.region()))]
    pub async fn create(
        &self,
        config: &Configuration,
    ) -> Result<ProvisioningResult, ProvisionFailure> {
        let fail = |error, bucket_status, table_status| ProvisionFailure {
            error,
            partial: ProvisioningResult {
                action: ProvisionAction::Create,
                bucket_status,
                table_status,
            },
        };

        let cloud = self.connector.connect(config).await.map_err(|source| {
            fail(
                ProvisionError::Connect { source },
                ResourceStatus::Skipped,
                None,
            )
        })?;

        let bucket = config.bucket_name();

        let existing = cloud.buckets.bucket_region(bucket).await.map_err(|e| {
            fail(
                bucket_error(bucket, "bucket_exists", e),
                ResourceStatus::Failed,
                None,
            )
        })?;

        let bucket_status = match existing {
            Some(ref region) if region != config.region() => {
                warn!(existing_region = %region, "bucket exists in a different region");
                return Err(fail(
                    ProvisionError::ResourceConflict {
                        resource: ResourceKind::Bucket,
                        name: bucket.to_owned(),
                        message: format!(
                            "exists in region '{region}', requested '{}'",
                            config.region()
                        ),
                    },
                    ResourceStatus::Failed,
                    None,
                ));
            }
            Some(_) => {
                info!("bucket already exists, skipping creation");
                ResourceStatus::AlreadyExists
            }
            None => {
                cloud
                    .buckets
                    .create_bucket(bucket, config.region())
                    .await
                    .map_err(|e| {
                        fail(
                            bucket_error(bucket, "create_bucket", e),
                            ResourceStatus::Failed,
                            None,
                        )
                    })?;
                info!("bucket created");
                ResourceStatus::Created
            }
        };

        // Hardening. Not retried individually; the bucket is left in place
        // on failure and reported with the status it reached, so a re-run
        // can finish the job.
        cloud
            .buckets
            .enable_versioning(bucket)
            .await
            .map_err(|e| fail(bucket_error(bucket, "enable_versioning", e), bucket_status, None))?;
        debug!("versioning enabled");

        cloud
            .buckets
            .enable_encryption(bucket)
            .await
            .map_err(|e| fail(bucket_error(bucket, "enable_encryption", e), bucket_status, None))?;
        debug!("server-side encryption enabled");

        cloud
            .buckets
            .block_public_access(bucket)
            .await
            .map_err(|e| {
                fail(
                    bucket_error(bucket, "block_public_access", e),
                    bucket_status,
                    None,
                )
            })?;
        debug!("public access blocked");

        let table_status = match config.locking_mechanism() {
            LockingMechanism::S3 => {
                debug!("s3 locking mechanism, no lock table needed");
                ResourceStatus::Skipped
            }
            LockingMechanism::DynamoDb => {
                // Validation guarantees a table name for this mechanism.
                let Some(table) = config.table_name() else {
                    return Err(fail(
                        ProvisionError::Validation(
                            crate::config::ValidationError::MissingTableName,
                        ),
                        bucket_status,
                        None,
                    ));
                };

                let exists = cloud.tables.table_exists(table).await.map_err(|e| {
                    fail(
                        table_error(table, "table_exists", e),
                        bucket_status,
                        Some(ResourceStatus::Failed),
                    )
                })?;

                if exists {
                    info!(table, "lock table already exists, skipping creation");
                    ResourceStatus::AlreadyExists
                } else {
                    cloud.tables.create_table(table).await.map_err(|e| {
                        fail(
                            table_error(table, "create_table", e),
                            bucket_status,
                            Some(ResourceStatus::Failed),
                        )
                    })?;
                    self.wait_for_active(cloud.tables.as_ref(), table)
                        .await
                        .map_err(|e| fail(e, bucket_status, Some(ResourceStatus::Failed)))?;
                    info!(table, "lock table created and active");
                    ResourceStatus::Created
                }
            }
        };

        Ok(ProvisioningResult {
            action: ProvisionAction::Create,
            bucket_status,
            table_status: Some(table_status),
        })
    }

    /// Delete the backend resources described by `config`.
    ///
    /// The lock table goes first: a partially completed delete must never
    /// leave an orphaned table locking a bucket that no longer exists. If
    /// the table delete fails, the bucket is not touched and is reported
    /// `skipped`. Missing resources are `not_found`, not errors.
    #[instrument(skip_all, fields(bucket = %config.bucket_name(), region = %config.region()))]
    pub async fn delete(
        &self,
        config: &Configuration,
    ) -> Result<ProvisioningResult, ProvisionFailure> {
        let fail = |error, bucket_status, table_status| ProvisionFailure {
            error,
            partial: ProvisioningResult {
                action: ProvisionAction::Delete,
                bucket_status,
                table_status,
            },
        };

        let cloud = self.connector.connect(config).await.map_err(|source| {
            fail(
                ProvisionError::Connect { source },
                ResourceStatus::Skipped,
                None,
            )
        })?;

        let table_status = match config.table_name() {
            None => ResourceStatus::Skipped,
            Some(table) => {
                let exists = cloud.tables.table_exists(table).await.map_err(|e| {
                    fail(
                        table_error(table, "table_exists", e),
                        ResourceStatus::Skipped,
                        Some(ResourceStatus::Failed),
                    )
                })?;
                if exists {
                    cloud.tables.delete_table(table).await.map_err(|e| {
                        fail(
                            table_error(table, "delete_table", e),
                            ResourceStatus::Skipped,
                            Some(ResourceStatus::Failed),
                        )
                    })?;
                    info!(table, "lock table deleted");
                    ResourceStatus::Deleted
                } else {
                    info!(table, "lock table does not exist, skipping deletion");
                    ResourceStatus::NotFound
                }
            }
        };

        let bucket = config.bucket_name();
        let existing = cloud.buckets.bucket_region(bucket).await.map_err(|e| {
            fail(
                bucket_error(bucket, "bucket_exists", e),
                ResourceStatus::Failed,
                Some(table_status),
            )
        })?;

        let bucket_status = if existing.is_some() {
            self.empty_and_delete_bucket(&cloud, bucket)
                .await
                .map_err(|e| fail(e, ResourceStatus::Failed, Some(table_status)))?;
            ResourceStatus::Deleted
        } else {
            info!("bucket does not exist, skipping deletion");
            ResourceStatus::NotFound
        };

        Ok(ProvisioningResult {
            action: ProvisionAction::Delete,
            bucket_status,
            table_status: Some(table_status),
        })
    }

    /// Drain every object version and delete marker, then delete the
    /// bucket itself (S3 refuses to delete a non-empty bucket).
    async fn empty_and_delete_bucket(
        &self,
        cloud: &crate::cloud::Cloud,
        bucket: &str,
    ) -> Result<(), ProvisionError> {
        let mut removed: u64 = 0;
        loop {
            let batch = cloud
                .buckets
                .list_object_versions(bucket)
                .await
                .map_err(|e| bucket_error(bucket, "list_object_versions", e))?;
            if batch.is_empty() {
                break;
            }
            removed += batch.len() as u64;
            cloud
                .buckets
                .delete_objects(bucket, &batch)
                .await
                .map_err(|e| bucket_error(bucket, "delete_objects", e))?;
        }
        if removed > 0 {
            info!(removed, "bucket emptied");
        }

        cloud
            .buckets
            .delete_bucket(bucket)
            .await
            .map_err(|e| bucket_error(bucket, "delete_bucket", e))?;
        info!("bucket deleted");
        Ok(())
    }

    /// Bounded poll until the table reports active.
    async fn wait_for_active(
        &self,
        tables: &dyn TableOps,
        table: &str,
    ) -> Result<(), ProvisionError> {
        for attempt in 1..=self.wait.max_attempts {
            let active = tables
                .table_active(table)
                .await
                .map_err(|e| table_error(table, "describe_table", e))?;
            if active {
                return Ok(());
            }
            debug!(attempt, "table not active yet");
            tokio::time::sleep(self.wait.delay).await;
        }
        Err(ProvisionError::ActivationTimeout {
            table: table.to_owned(),
            attempts: self.wait.max_attempts,
        })
    }
}

fn bucket_error(name: &str, operation: &'static str, source: CloudError) -> ProvisionError {
    ProvisionError::Provider {
        resource: ResourceKind::Bucket,
        name: name.to_owned(),
        operation,
        source,
    }
}

fn table_error(name: &str, operation: &'static str, source: CloudError) -> ProvisionError {
    ProvisionError::Provider {
        resource: ResourceKind::Table,
        name: name.to_owned(),
        operation,
        source,
    }
}
