use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use stateforge_core::ResourceStatus;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Server version.
    #[schema(example = "0.1.0")]
    pub version: String,
}

/// Error payload returned for failed provisioning requests.
///
/// When a workflow aborted mid-action, the per-resource statuses show what
/// the partial run left behind so the caller can re-run safely.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description of the failure.
    #[schema(example = "create_table failed for table 'tf-locks': request throttled")]
    pub error: String,
    /// Stable machine-readable error kind.
    #[schema(example = "provider")]
    pub kind: String,
    /// Status the bucket reached before the action aborted, if any work ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_status: Option<ResourceStatus>,
    /// Status the lock table reached before the action aborted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_status: Option<ResourceStatus>,
}
