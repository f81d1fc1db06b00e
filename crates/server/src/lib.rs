//! HTTP server for the Stateforge Terraform backend provisioner.
//!
//! Exposes the create/delete provisioning workflow over an Axum HTTP API
//! with OpenAPI documentation served through Swagger UI. The binary entry
//! point lives in `main.rs`; this library holds the router, handlers, and
//! configuration so integration tests can drive the API in-process.

pub mod api;
pub mod config;
pub mod error;
pub mod telemetry;

pub use config::StateforgeConfig;
pub use error::ServerError;
