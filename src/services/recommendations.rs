use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;

use crate::{
    db::RecommendationStore,
    error::{AppResult, RecommendationError},
    models::{EnrichedRecommendation, FreshnessWindow, Recommendation, VenueDetails},
    services::providers::VenueProvider,
};

/// Most recommendations served per request
pub const SERVED_RECOMMENDATIONS: usize = 5;

/// Today's recommendations for a user, oldest first, at most five.
///
/// Rows from an earlier window stay in storage but are never returned.
pub async fn latest(
    store: &dyn RecommendationStore,
    user_id: i64,
    now: DateTime<Utc>,
) -> AppResult<Vec<Recommendation>> {
    store
        .query_latest(user_id, FreshnessWindow::day_of(now), SERVED_RECOMMENDATIONS)
        .await
}

/// Latest recommendations with venue metadata attached.
///
/// Lookups run concurrently. A failed lookup leaves that entry's `venue`
/// empty instead of failing the request.
pub async fn latest_enriched(
    store: &dyn RecommendationStore,
    provider: Arc<dyn VenueProvider>,
    user_id: i64,
    now: DateTime<Utc>,
) -> AppResult<Vec<EnrichedRecommendation>> {
    let recommendations = latest(store, user_id, now).await?;

    let lookups = recommendations.iter().map(|rec| {
        let provider = provider.clone();
        async move { venue_or_none(provider.as_ref(), &rec.item_id, &[]).await }
    });
    let venues = join_all(lookups).await;

    Ok(recommendations
        .into_iter()
        .zip(venues)
        .map(|(rec, venue)| EnrichedRecommendation::new(rec, venue))
        .collect())
}

/// Looks up a venue, logging and swallowing provider failures
pub async fn venue_or_none(
    provider: &dyn VenueProvider,
    item_id: &str,
    fields: &[String],
) -> Option<serde_json::Value> {
    match enrich(provider, item_id, fields).await {
        Ok(details) => Some(serde_json::Value::Object(details)),
        Err(e) => {
            tracing::warn!(
                error = %e,
                provider = provider.name(),
                "Serving recommendation without venue metadata"
            );
            None
        }
    }
}

async fn enrich(
    provider: &dyn VenueProvider,
    item_id: &str,
    fields: &[String],
) -> Result<VenueDetails, RecommendationError> {
    provider
        .lookup(item_id, fields)
        .await
        .map_err(|e| RecommendationError::EnrichmentUnavailable {
            item_id: item_id.to_string(),
            reason: e.to_string(),
        })
}
