use stateforge_core::{LockingMechanism, ProvisionAction, ProvisionRequest, ProvisioningResult, ResourceStatus};

use super::schemas::{ErrorResponse, HealthResponse};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Stateforge API",
        version = "0.1.0",
        description = "HTTP API for provisioning Terraform remote state backends: an S3 bucket for state storage and an optional DynamoDB table for state locking.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Resources", description = "Backend resource provisioning and teardown")
    ),
    paths(
        super::health::health,
        super::resources::create,
        super::resources::delete,
    ),
    components(schemas(
        ProvisionRequest, LockingMechanism,
        ProvisioningResult, ProvisionAction, ResourceStatus,
        HealthResponse, ErrorResponse,
    ))
)]
pub struct ApiDoc;
