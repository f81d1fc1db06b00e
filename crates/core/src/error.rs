use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ValidationError;
use crate::result::ProvisioningResult;

/// The resource a failed operation was acting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Bucket,
    Table,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bucket => "bucket",
            Self::Table => "table",
        })
    }
}

/// A failure reported by the cloud backend for a single capability call.
///
/// Capability implementations classify raw SDK failures into this shape so
/// the workflow and front ends never see provider-specific error types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CloudError {
    /// The service rejected the call with a coded error.
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The caller lacks permission for the operation.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The request was throttled by the service.
    #[error("request throttled")]
    Throttled,

    /// The request timed out in transit.
    #[error("request timed out")]
    Timeout,

    /// A network or connection failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// Credential resolution failed.
    #[error("credential error: {0}")]
    Credentials(String),
}

/// Why a provisioning action failed.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Malformed input, detected before any remote call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Cloud client construction failed before any resource was touched.
    #[error("failed to initialize cloud clients: {source}")]
    Connect { source: CloudError },

    /// A resource exists in a state incompatible with the request.
    #[error("{resource} '{name}' conflict: {message}")]
    ResourceConflict {
        resource: ResourceKind,
        name: String,
        message: String,
    },

    /// A capability call failed; carries the resource, the attempted
    /// operation, and the classified provider failure.
    #[error("{operation} failed for {resource} '{name}': {source}")]
    Provider {
        resource: ResourceKind,
        name: String,
        operation: &'static str,
        source: CloudError,
    },

    /// The bounded poll for table activation spent its attempt budget.
    #[error("timed out waiting for table '{table}' to become active after {attempts} attempts")]
    ActivationTimeout { table: String, attempts: u32 },
}

impl ProvisionError {
    /// Stable machine-readable error kind, used by the API error body and
    /// the CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Connect { .. } => "connect",
            Self::ResourceConflict { .. } => "conflict",
            Self::Provider { .. } => "provider",
            Self::ActivationTimeout { .. } => "timeout",
        }
    }

    /// The underlying cloud failure, when there is one.
    pub fn cloud(&self) -> Option<&CloudError> {
        match self {
            Self::Provider { source, .. } | Self::Connect { source } => Some(source),
            _ => None,
        }
    }
}

/// A provisioning failure together with the per-resource statuses reached
/// before the action aborted.
///
/// The snapshot lets a caller see what a partially completed action left
/// behind (e.g. table deleted, bucket still present) and re-run safely.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ProvisionFailure {
    pub error: ProvisionError,
    pub partial: ProvisioningResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ProvisionAction, ResourceStatus};

    #[test]
    fn kinds_are_stable() {
        assert_eq!(
            ProvisionError::Validation(ValidationError::EmptyRegion).kind(),
            "validation"
        );
        assert_eq!(
            ProvisionError::ActivationTimeout {
                table: "locks".into(),
                attempts: 20
            }
            .kind(),
            "timeout"
        );
        assert_eq!(
            ProvisionError::ResourceConflict {
                resource: ResourceKind::Bucket,
                name: "b".into(),
                message: "wrong region".into()
            }
            .kind(),
            "conflict"
        );
    }

    #[test]
    fn provider_error_display_names_resource_and_operation() {
        let err = ProvisionError::Provider {
            resource: ResourceKind::Table,
            name: "my-lock".into(),
            operation: "create_table",
            source: CloudError::Throttled,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("create_table"));
        assert!(rendered.contains("table 'my-lock'"));
        assert!(rendered.contains("throttled"));
    }

    #[test]
    fn cloud_accessor_exposes_source() {
        let err = ProvisionError::Provider {
            resource: ResourceKind::Bucket,
            name: "b".into(),
            operation: "create_bucket",
            source: CloudError::AccessDenied("no s3:CreateBucket".into()),
        };
        assert!(matches!(err.cloud(), Some(CloudError::AccessDenied(_))));
        assert!(
            ProvisionError::Validation(ValidationError::EmptyRegion)
                .cloud()
                .is_none()
        );
    }

    #[test]
    fn failure_display_delegates_to_error() {
        let failure = ProvisionFailure {
            error: ProvisionError::ActivationTimeout {
                table: "locks".into(),
                attempts: 3,
            },
            partial: ProvisioningResult {
                action: ProvisionAction::Create,
                bucket_status: ResourceStatus::Created,
                table_status: Some(ResourceStatus::Failed),
            },
        };
        assert!(failure.to_string().contains("after 3 attempts"));
        assert_eq!(failure.partial.bucket_status, ResourceStatus::Created);
    }
}
