//! HTTP router configuration

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use revtrack_api::{HealthResponse, PhonehomeRequest, PhonehomeResponse};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api::{phonehome, system};
use crate::state::AppState;

/// OpenAPI document for the server
#[derive(OpenApi)]
#[openapi(
    info(title = "revtrack", description = "Revision resolution for phonehome clients"),
    paths(phonehome::phonehome, system::health),
    components(schemas(PhonehomeRequest, PhonehomeResponse, HealthResponse)),
    tags(
        (name = "phonehome", description = "Client reports and target revisions"),
        (name = "system", description = "Server status")
    )
)]
pub struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Client endpoints
        .route("/phonehome", post(phonehome::phonehome))
        // System endpoints
        .route("/health", get(system::health))
        .route("/openapi.json", get(openapi))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        // State
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_endpoints() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();

        assert!(doc["paths"]["/phonehome"]["post"].is_object());
        assert!(doc["paths"]["/health"]["get"].is_object());
        assert!(doc["components"]["schemas"]["PhonehomeRequest"].is_object());
    }

    #[tokio::test]
    async fn test_health() {
        let Json(health) = system::health().await;
        assert_eq!(health.status, "ok");
    }
}
