use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::info;

use stateforge_core::{Configuration, ProvisionRequest, Provisioner, ProvisioningResult};

use crate::error::ApiError;

use super::AppState;
use super::schemas::ErrorResponse;

/// `POST /v1/resources/create` -- provision the backend resource set.
///
/// Creates the S3 state bucket (versioned, AES256-encrypted, public access
/// blocked) and, when the locking mechanism is `dynamodb`, the lock table.
/// Safe to re-run: resources that already exist report `already_exists`.
#[utoipa::path(
    post,
    path = "/v1/resources/create",
    tag = "Resources",
    summary = "Create backend resources",
    description = "Provisions the S3 state bucket and optional DynamoDB lock table. Idempotent: re-running against existing resources succeeds.",
    request_body(content = ProvisionRequest, description = "Backend resources to provision"),
    responses(
        (status = 200, description = "Resources provisioned", body = ProvisioningResult),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Cloud credentials rejected", body = ErrorResponse),
        (status = 409, description = "Resource exists in an incompatible state", body = ErrorResponse),
        (status = 429, description = "Throttled by the cloud provider", body = ErrorResponse),
        (status = 502, description = "Cloud provider error", body = ErrorResponse),
        (status = 504, description = "Timed out waiting on the cloud provider", body = ErrorResponse)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<ProvisionRequest>,
) -> Result<Json<ProvisioningResult>, ApiError> {
    let config = Configuration::validate(request)?;
    info!(
        bucket = config.bucket_name(),
        region = config.region(),
        locking = config.locking_mechanism().as_str(),
        "create requested"
    );

    let provisioner = Provisioner::new(Arc::clone(&state.connector)).with_wait(state.wait);
    let result = provisioner.create(&config).await?;
    Ok(Json(result))
}

/// `POST /v1/resources/delete` -- tear down the backend resource set.
///
/// Deletes the lock table first, then drains all object versions from the
/// bucket and deletes it. Resources already gone report `not_found`.
#[utoipa::path(
    post,
    path = "/v1/resources/delete",
    tag = "Resources",
    summary = "Delete backend resources",
    description = "Deletes the DynamoDB lock table and then the emptied S3 state bucket. Idempotent: missing resources report not_found.",
    request_body(content = ProvisionRequest, description = "Backend resources to tear down"),
    responses(
        (status = 200, description = "Resources deleted", body = ProvisioningResult),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Cloud credentials rejected", body = ErrorResponse),
        (status = 429, description = "Throttled by the cloud provider", body = ErrorResponse),
        (status = 502, description = "Cloud provider error", body = ErrorResponse),
        (status = 504, description = "Timed out waiting on the cloud provider", body = ErrorResponse)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Json(request): Json<ProvisionRequest>,
) -> Result<Json<ProvisioningResult>, ApiError> {
    let config = Configuration::validate(request)?;
    info!(
        bucket = config.bucket_name(),
        region = config.region(),
        "delete requested"
    );

    let provisioner = Provisioner::new(Arc::clone(&state.connector)).with_wait(state.wait);
    let result = provisioner.delete(&config).await?;
    Ok(Json(result))
}
