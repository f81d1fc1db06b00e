use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use stateforge_core::cloud::{Cloud, CloudConnector};
use stateforge_core::config::Configuration;
use stateforge_core::error::CloudError;

use crate::auth::build_sdk_config;
use crate::dynamodb::DynamoTables;
use crate::s3::S3Buckets;
use crate::settings::AwsSettings;

/// Builds AWS-backed capability handles per request.
///
/// Region and credentials come from the request's configuration; the
/// optional endpoint URL override (e.g. `LocalStack`) is fixed when the
/// connector is constructed.
#[derive(Debug, Clone, Default)]
pub struct AwsConnector {
    endpoint_url: Option<String>,
}

impl AwsConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route all SDK calls to a custom endpoint.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }
}

#[async_trait]
impl CloudConnector for AwsConnector {
    async fn connect(&self, config: &Configuration) -> Result<Cloud, CloudError> {
        let mut settings = AwsSettings::new(config.region());
        if let Some(endpoint) = &self.endpoint_url {
            settings = settings.with_endpoint_url(endpoint);
        }
        if let Some(credentials) = config.credentials() {
            settings = settings.with_credentials(credentials.clone());
        }

        debug!(region = %config.region(), "building AWS clients");
        let sdk_config = build_sdk_config(&settings).await;

        Ok(Cloud {
            buckets: Arc::new(S3Buckets::new(aws_sdk_s3::Client::new(&sdk_config))),
            tables: Arc::new(DynamoTables::new(aws_sdk_dynamodb::Client::new(&sdk_config))),
        })
    }
}
