use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use stateforge_core::{CloudError, ProvisionError, ProvisionFailure, ValidationError};

use crate::api::schemas::ErrorResponse;

/// Errors that can occur when running the Stateforge server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced through the provisioning API.
///
/// Maps the workflow error taxonomy onto HTTP status codes: validation
/// failures are the caller's fault (400), conflicts report an existing
/// incompatible resource (409), and provider failures map by cause
/// (403 access denied, 429 throttled, 504 timed out, 502 otherwise).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provision(#[from] ProvisionFailure),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Provision(failure) => match &failure.error {
                ProvisionError::Validation(_) => StatusCode::BAD_REQUEST,
                ProvisionError::ResourceConflict { .. } => StatusCode::CONFLICT,
                ProvisionError::ActivationTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ProvisionError::Connect { .. } | ProvisionError::Provider { .. } => {
                    match failure.error.cloud() {
                        Some(CloudError::AccessDenied(_) | CloudError::Credentials(_)) => {
                            StatusCode::FORBIDDEN
                        }
                        Some(CloudError::Throttled) => StatusCode::TOO_MANY_REQUESTS,
                        Some(CloudError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
                        _ => StatusCode::BAD_GATEWAY,
                    }
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            Self::Validation(e) => ErrorResponse {
                error: e.to_string(),
                kind: "validation".to_owned(),
                bucket_status: None,
                table_status: None,
            },
            Self::Provision(failure) => ErrorResponse {
                error: failure.error.to_string(),
                kind: failure.error.kind().to_owned(),
                bucket_status: Some(failure.partial.bucket_status),
                table_status: failure.partial.table_status,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stateforge_core::{ProvisionAction, ProvisioningResult, ResourceKind, ResourceStatus};

    fn failure(error: ProvisionError) -> ApiError {
        ApiError::Provision(ProvisionFailure {
            error,
            partial: ProvisioningResult {
                action: ProvisionAction::Create,
                bucket_status: ResourceStatus::Failed,
                table_status: None,
            },
        })
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::Validation(ValidationError::EmptyRegion);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = failure(ProvisionError::ResourceConflict {
            resource: ResourceKind::Bucket,
            name: "b".into(),
            message: "exists in eu-west-1".into(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn activation_timeout_maps_to_504() {
        let err = failure(ProvisionError::ActivationTimeout {
            table: "locks".into(),
            attempts: 20,
        });
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn provider_errors_map_by_cloud_cause() {
        let provider = |source| {
            failure(ProvisionError::Provider {
                resource: ResourceKind::Bucket,
                name: "b".into(),
                operation: "create_bucket",
                source,
            })
        };
        assert_eq!(
            provider(CloudError::AccessDenied("denied".into())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            provider(CloudError::Throttled).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            provider(CloudError::Timeout).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            provider(CloudError::Service {
                code: "InternalError".into(),
                message: "oops".into()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
