use axum::{extract::State, Extension, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::{Caller, RequestId},
    models::EnrichedRecommendation,
    routes::AppState,
    services::recommendations,
};

/// Latest recommendations of the calling user, with venue metadata
pub async fn latest(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Caller(user_id): Caller,
) -> AppResult<Json<Vec<EnrichedRecommendation>>> {
    let served = recommendations::latest_enriched(
        state.recommendation_store.as_ref(),
        state.venue_provider.clone(),
        user_id,
        Utc::now(),
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        served = served.len(),
        "Recommendations served"
    );

    Ok(Json(served))
}
