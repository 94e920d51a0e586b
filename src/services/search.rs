use crate::{
    error::{AppError, AppResult},
    models::VenueDetails,
    services::providers::VenueProvider,
};

/// Most venues returned by one search
pub const SEARCH_LIMIT: usize = 10;

/// Venues matching `term` around `location`, straight from the provider
pub async fn search_venues(
    provider: &dyn VenueProvider,
    term: &str,
    location: &str,
) -> AppResult<Vec<VenueDetails>> {
    let term = term.trim();
    let location = location.trim();
    if term.is_empty() || location.is_empty() {
        return Err(AppError::InvalidInput(
            "q and location cannot be empty".to_string(),
        ));
    }

    provider.search(term, location, SEARCH_LIMIT).await
}
