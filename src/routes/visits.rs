use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    middleware::Caller,
    models::{NewVisit, Visit, VisitWithVenue},
    routes::AppState,
    services::visits,
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// Page number, falling back to the first page when absent or malformed
    fn page(&self) -> u32 {
        self.page
            .as_deref()
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1)
    }
}

/// Handler recording a visit of the calling user
pub async fn create(
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    payload: Result<Json<NewVisit>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Visit>)> {
    let Json(visit) = payload?;
    let stored = visits::record_visit(state.visit_ledger.as_ref(), user_id, visit).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Handler listing the calling user's visits, ten per page
pub async fn list(
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Vec<VisitWithVenue>>> {
    let history = visits::visit_history(
        state.visit_ledger.as_ref(),
        state.venue_provider.clone(),
        user_id,
        query.page(),
    )
    .await?;
    Ok(Json(history))
}

/// Handler returning one visit by uuid
pub async fn show(
    State(state): State<Arc<AppState>>,
    Caller(_): Caller,
    Path(uuid): Path<Uuid>,
) -> AppResult<Json<Visit>> {
    let visit = visits::visit_by_uuid(state.visit_ledger.as_ref(), uuid).await?;
    Ok(Json(visit))
}
