use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration, Delete,
    ObjectIdentifier, PublicAccessBlockConfiguration, ServerSideEncryption,
    ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration, ServerSideEncryptionRule,
    VersioningConfiguration,
};
use tracing::{debug, info, instrument};

use stateforge_core::cloud::{BucketOps, ObjectVersion};
use stateforge_core::error::CloudError;

use crate::error::classify_sdk_error;

/// Classify any S3 SDK failure into a [`CloudError`].
fn cloud_error<E, R>(err: SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata,
{
    let message = err
        .message()
        .map(str::to_owned)
        .unwrap_or_else(|| err.to_string());
    classify_sdk_error(err.code(), &message)
}

/// S3-backed implementation of [`BucketOps`].
pub struct S3Buckets {
    client: aws_sdk_s3::Client,
}

impl std::fmt::Debug for S3Buckets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Buckets")
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3Buckets {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BucketOps for S3Buckets {
    #[instrument(skip(self))]
    async fn bucket_region(&self, bucket: &str) -> Result<Option<String>, CloudError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(output) => {
                if let Some(region) = output.bucket_region() {
                    return Ok(Some(region.to_owned()));
                }
                // Older S3-compatible endpoints omit the region header;
                // fall back to GetBucketLocation, where a null constraint
                // means us-east-1.
                let location = self
                    .client
                    .get_bucket_location()
                    .bucket(bucket)
                    .send()
                    .await
                    .map_err(cloud_error)?;
                let region = location
                    .location_constraint()
                    .map(|constraint| constraint.as_str().to_owned())
                    .filter(|region| !region.is_empty())
                    .unwrap_or_else(|| "us-east-1".to_owned());
                Ok(Some(region))
            }
            Err(err) => {
                if let SdkError::ServiceError(ref context) = err {
                    if context.err().is_not_found() {
                        debug!("bucket does not exist");
                        return Ok(None);
                    }
                }
                Err(cloud_error(err))
            }
        }
    }

    #[instrument(skip(self))]
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), CloudError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 is the default location and must not be passed as a
        // LocationConstraint; S3 rejects the request if it is.
        if region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!("bucket created");
                Ok(())
            }
            Err(err) => {
                if let SdkError::ServiceError(ref context) = err {
                    // Tolerated so a create racing a parallel create of the
                    // same bucket by the same account converges.
                    if context.err().is_bucket_already_owned_by_you() {
                        info!("bucket already owned by this account");
                        return Ok(());
                    }
                }
                Err(cloud_error(err))
            }
        }
    }

    #[instrument(skip(self))]
    async fn enable_versioning(&self, bucket: &str) -> Result<(), CloudError> {
        self.client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                VersioningConfiguration::builder()
                    .status(BucketVersioningStatus::Enabled)
                    .build(),
            )
            .send()
            .await
            .map_err(cloud_error)?;
        info!("versioning enabled");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn enable_encryption(&self, bucket: &str) -> Result<(), CloudError> {
        let rule = ServerSideEncryptionRule::builder()
            .apply_server_side_encryption_by_default(
                ServerSideEncryptionByDefault::builder()
                    .sse_algorithm(ServerSideEncryption::Aes256)
                    .build()
                    .expect("valid SSE default"),
            )
            .build();
        self.client
            .put_bucket_encryption()
            .bucket(bucket)
            .server_side_encryption_configuration(
                ServerSideEncryptionConfiguration::builder()
                    .rules(rule)
                    .build()
                    .expect("valid SSE configuration"),
            )
            .send()
            .await
            .map_err(cloud_error)?;
        info!("server-side encryption (AES256) enabled");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn block_public_access(&self, bucket: &str) -> Result<(), CloudError> {
        self.client
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(
                PublicAccessBlockConfiguration::builder()
                    .block_public_acls(true)
                    .ignore_public_acls(true)
                    .block_public_policy(true)
                    .restrict_public_buckets(true)
                    .build(),
            )
            .send()
            .await
            .map_err(cloud_error)?;
        info!("public access blocked");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_object_versions(&self, bucket: &str) -> Result<Vec<ObjectVersion>, CloudError> {
        let output = self
            .client
            .list_object_versions()
            .bucket(bucket)
            .send()
            .await
            .map_err(cloud_error)?;

        let mut versions: Vec<ObjectVersion> = output
            .versions()
            .iter()
            .filter_map(|version| {
                version.key().map(|key| ObjectVersion {
                    key: key.to_owned(),
                    version_id: version.version_id().map(str::to_owned),
                })
            })
            .collect();
        versions.extend(output.delete_markers().iter().filter_map(|marker| {
            marker.key().map(|key| ObjectVersion {
                key: key.to_owned(),
                version_id: marker.version_id().map(str::to_owned),
            })
        }));

        debug!(count = versions.len(), "listed object versions");
        Ok(versions)
    }

    #[instrument(skip(self, versions), fields(count = versions.len()))]
    async fn delete_objects(
        &self,
        bucket: &str,
        versions: &[ObjectVersion],
    ) -> Result<(), CloudError> {
        let objects: Vec<ObjectIdentifier> = versions
            .iter()
            .map(|version| {
                let mut builder = ObjectIdentifier::builder().key(&version.key);
                if let Some(ref id) = version.version_id {
                    builder = builder.version_id(id);
                }
                builder.build().expect("object identifier with key")
            })
            .collect();

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(
                Delete::builder()
                    .set_objects(Some(objects))
                    .quiet(true)
                    .build()
                    .expect("delete request with objects"),
            )
            .send()
            .await
            .map_err(cloud_error)?;

        // Batch delete reports per-object failures inside a 200 response.
        // Surfacing the first one keeps the drain loop from re-listing a
        // key that will never go away.
        if let Some(failure) = output.errors().first() {
            return Err(CloudError::Service {
                code: failure.code().unwrap_or("DeleteError").to_owned(),
                message: format!(
                    "object '{}' not deleted: {}",
                    failure.key().unwrap_or("<unknown>"),
                    failure.message().unwrap_or("no detail provided"),
                ),
            });
        }

        debug!("object versions deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_bucket(&self, bucket: &str) -> Result<(), CloudError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(cloud_error)?;
        info!("bucket deleted");
        Ok(())
    }
}
