use std::sync::Arc;

use futures::future::join_all;
use uuid::Uuid;

use crate::{
    db::VisitLedger,
    error::{AppError, AppResult},
    models::{NewVisit, Visit, VisitWithVenue},
    services::{providers::VenueProvider, recommendations::venue_or_none},
};

/// Venue fields attached to each entry of a visit listing
const LISTING_FIELDS: [&str; 2] = ["id", "name"];

/// Lowest and highest satisfaction a visit may carry
pub const SATISFACTION_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

/// Validates and stores a visit for `user_id`
pub async fn record_visit(
    ledger: &dyn VisitLedger,
    user_id: i64,
    visit: NewVisit,
) -> AppResult<Visit> {
    if visit.yelp_id.trim().is_empty() {
        return Err(AppError::InvalidInput("yelp_id cannot be empty".to_string()));
    }
    if !SATISFACTION_RANGE.contains(&visit.satisfaction) {
        return Err(AppError::InvalidInput(format!(
            "satisfaction must be between {} and {}",
            SATISFACTION_RANGE.start(),
            SATISFACTION_RANGE.end()
        )));
    }

    ledger.record_visit(visit.into_visit(user_id)).await
}

/// A single visit, whoever recorded it
pub async fn visit_by_uuid(ledger: &dyn VisitLedger, uuid: Uuid) -> AppResult<Visit> {
    ledger
        .visit_by_uuid(uuid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Visit {} not found", uuid)))
}

/// One page of a user's visits, each with the venue id and name
pub async fn visit_history(
    ledger: &dyn VisitLedger,
    provider: Arc<dyn VenueProvider>,
    user_id: i64,
    page: u32,
) -> AppResult<Vec<VisitWithVenue>> {
    let visits = ledger.visits_for_user(user_id, page).await?;
    if visits.is_empty() {
        return Err(AppError::NotFound(format!("No visits on page {}", page)));
    }

    let fields: Vec<String> = LISTING_FIELDS.iter().map(|f| f.to_string()).collect();
    let lookups = visits.iter().map(|visit| {
        let provider = provider.clone();
        let fields = &fields;
        async move { venue_or_none(provider.as_ref(), &visit.yelp_id, fields).await }
    });
    let venues = join_all(lookups).await;

    Ok(visits
        .into_iter()
        .zip(venues)
        .map(|(visit, data)| VisitWithVenue { visit, data })
        .collect())
}
