//! AWS backend for Stateforge.
//!
//! Implements the capability traits from `stateforge-core` on top of the
//! official AWS SDKs: [`S3Buckets`] for bucket operations,
//! [`DynamoTables`] for lock-table operations, and [`AwsConnector`] to
//! build both per request from a validated configuration.
//!
//! SDK failures are classified into `stateforge_core::CloudError` by
//! [`error::classify_sdk_error`], so the rest of the system never handles
//! provider-specific error types.

pub mod auth;
pub mod connector;
pub mod dynamodb;
pub mod error;
pub mod s3;
pub mod settings;

pub use connector::AwsConnector;
pub use dynamodb::DynamoTables;
pub use s3::S3Buckets;
pub use settings::AwsSettings;
