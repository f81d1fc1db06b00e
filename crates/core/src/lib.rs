//! Core types and shared abstractions for Stateforge.
//!
//! Stateforge provisions the AWS resource pair backing a Terraform remote
//! state backend: an S3 bucket for state storage and, depending on the
//! chosen locking mechanism, a DynamoDB table for state locking.
//!
//! This crate holds everything the front ends (CLI and HTTP server) share:
//!
//! - [`config`]: the raw request shape and its validated [`Configuration`]
//! - [`result`]: per-resource statuses and the [`ProvisioningResult`]
//! - [`error`]: the error taxonomy surfaced identically by both front ends
//! - [`cloud`]: the capability traits a cloud backend must implement
//! - [`workflow`]: the ordered, idempotent create/delete orchestration

pub mod cloud;
pub mod config;
pub mod error;
pub mod result;
pub mod workflow;

pub use cloud::{BucketOps, Cloud, CloudConnector, ObjectVersion, TableOps};
pub use config::{Configuration, Credentials, LockingMechanism, ProvisionRequest, ValidationError};
pub use error::{CloudError, ProvisionError, ProvisionFailure, ResourceKind};
pub use result::{ProvisionAction, ProvisioningResult, ResourceStatus};
pub use workflow::{Provisioner, TableWaitConfig};
