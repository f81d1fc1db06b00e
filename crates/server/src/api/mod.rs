pub mod health;
pub mod openapi;
pub mod resources;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use stateforge_core::{CloudConnector, TableWaitConfig};

use self::openapi::ApiDoc;

/// Shared state handed to every request handler.
///
/// The connector builds fresh cloud clients from the region and credentials
/// carried in each request body, so no AWS client lives in the state itself.
#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn CloudConnector>,
    pub wait: TableWaitConfig,
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health))
        // Provisioning
        .route("/v1/resources/create", post(resources::create))
        .route("/v1/resources/delete", post(resources::delete))
        .with_state(state)
        // Swagger UI
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
