use async_trait::async_trait;
use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, TableStatus,
};
use tracing::{debug, info, instrument};

use stateforge_core::cloud::TableOps;
use stateforge_core::error::CloudError;

use crate::error::classify_sdk_error;

/// Partition key Terraform uses for its lock entries.
const LOCK_KEY_ATTRIBUTE: &str = "LockID";

/// Classify any DynamoDB SDK failure into a [`CloudError`].
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

/// DynamoDB-backed implementation of [`TableOps`].
pub struct DynamoTables {
    client: aws_sdk_dynamodb::Client,
}

impl std::fmt::Debug for DynamoTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoTables")
            .field("client", &"<DynamoDbClient>")
            .finish()
    }
}

impl DynamoTables {
    pub fn new(client: aws_sdk_dynamodb::Client) -> Self {
        Self { client }
    }

    /// Describe the table, mapping "not found" to `None`.
    async fn describe_status(&self, table: &str) -> Result<Option<TableStatus>, CloudError> {
        match self.client.describe_table().table_name(table).send().await {
            Ok(output) => Ok(output
                .table()
                .and_then(|description| description.table_status())
                .cloned()),
            Err(err) => {
                if let SdkError::ServiceError(ref context) = err {
                    if context.err().is_resource_not_found_exception() {
                        return Ok(None);
                    }
                }
                Err(cloud_error(err))
            }
        }
    }
}

#[async_trait]
impl TableOps for DynamoTables {
    #[instrument(skip(self))]
    async fn table_exists(&self, table: &str) -> Result<bool, CloudError> {
        Ok(self.describe_status(table).await?.is_some())
    }

    /// Create the lock table: `LockID` (string) hash key, on-demand
    /// billing. Creation is asynchronous; callers poll
    /// [`table_active`](TableOps::table_active) until the table reports
    /// active.
    #[instrument(skip(self))]
    async fn create_table(&self, table: &str) -> Result<(), CloudError> {
        let result = self
            .client
            .create_table()
            .table_name(table)
            .attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(LOCK_KEY_ATTRIBUTE)
                    .attribute_type(ScalarAttributeType::S)
                    .build()
                    .expect("valid attribute definition"),
            )
            .key_schema(
                KeySchemaElement::builder()
                    .attribute_name(LOCK_KEY_ATTRIBUTE)
                    .key_type(KeyType::Hash)
                    .build()
                    .expect("valid key schema"),
            )
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!("lock table creation started");
                Ok(())
            }
            Err(err) => {
                if let SdkError::ServiceError(ref context) = err {
                    // Tolerated so a create racing a parallel create of the
                    // same table converges.
                    if context.err().is_resource_in_use_exception() {
                        info!("lock table already exists");
                        return Ok(());
                    }
                }
                Err(cloud_error(err))
            }
        }
    }

    #[instrument(skip(self))]
    async fn table_active(&self, table: &str) -> Result<bool, CloudError> {
        let status = self.describe_status(table).await?;
        let active = matches!(status, Some(TableStatus::Active));
        debug!(?status, active, "table status probed");
        Ok(active)
    }

    #[instrument(skip(self))]
    async fn delete_table(&self, table: &str) -> Result<(), CloudError> {
        match self.client.delete_table().table_name(table).send().await {
            Ok(_) => {
                info!("lock table deleted");
                Ok(())
            }
            Err(err) => {
                if let SdkError::ServiceError(ref context) = err {
                    // A table deleted between probe and delete is fine;
                    // the re-run contract maps it to not_found.
                    if context.err().is_resource_not_found_exception() {
                        info!("lock table already gone");
                        return Ok(());
                    }
                }
                Err(cloud_error(err))
            }
        }
    }
}
