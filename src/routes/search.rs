use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::Caller,
    models::VenueDetails,
    routes::AppState,
    services::search::search_venues,
};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    q: String,
    location: String,
}

/// Handler searching venues through the venue provider
pub async fn search(
    State(state): State<Arc<AppState>>,
    Caller(_): Caller,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> AppResult<Json<Vec<VenueDetails>>> {
    let Json(request) = payload?;
    let venues = search_venues(state.venue_provider.as_ref(), &request.q, &request.location).await?;
    Ok(Json(venues))
}
