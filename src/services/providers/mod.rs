//! Venue metadata provider abstraction
//!
//! Recommendations and visits only store the external venue id. Anything a
//! client wants to display (name, address, rating...) is looked up through a
//! provider at serving time.

use crate::{error::AppResult, models::VenueDetails};

pub mod yelp_fusion;

pub use yelp_fusion::YelpFusionProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VenueProvider: Send + Sync {
    /// Fetches metadata of one venue
    ///
    /// Only the requested `fields` are returned; an empty slice returns the
    /// full payload. Fields the provider does not know are omitted.
    async fn lookup(&self, item_id: &str, fields: &[String]) -> AppResult<VenueDetails>;

    /// Venues matching `term` around `location`, at most `limit` of them
    async fn search(&self, term: &str, location: &str, limit: usize) -> AppResult<Vec<VenueDetails>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Venue payloads listed under `businesses` in a search response. A response
/// without that list has no matches.
pub fn search_results(response: serde_json::Value) -> Vec<VenueDetails> {
    let serde_json::Value::Object(mut object) = response else {
        return Vec::new();
    };

    match object.remove("businesses") {
        Some(serde_json::Value::Array(businesses)) => businesses
            .into_iter()
            .filter_map(|business| match business {
                serde_json::Value::Object(details) => Some(details),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Keeps only `fields` of a venue payload, or all of it when `fields` is empty
pub fn project_fields(payload: serde_json::Value, fields: &[String]) -> VenueDetails {
    let serde_json::Value::Object(mut object) = payload else {
        return VenueDetails::new();
    };

    if fields.is_empty() {
        return object;
    }

    fields
        .iter()
        .filter_map(|field| object.remove(field).map(|value| (field.clone(), value)))
        .collect()
}
