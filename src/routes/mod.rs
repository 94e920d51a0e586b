use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::{RecommendationStore, VisitLedger},
    middleware::{make_span_with_request_id, request_id_middleware},
    services::providers::VenueProvider,
};

pub mod recommendations;
pub mod search;
pub mod visits;

/// Shared handles used by the request handlers
pub struct AppState {
    pub visit_ledger: Arc<dyn VisitLedger>,
    pub recommendation_store: Arc<dyn RecommendationStore>,
    pub venue_provider: Arc<dyn VenueProvider>,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            // request id first, so the trace span can carry it
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", get(recommendations::latest))
        .route("/visits", get(visits::list).post(visits::create))
        .route("/visits/:uuid", get(visits::show))
        .route("/search", post(search::search))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
