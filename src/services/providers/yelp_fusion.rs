//! Yelp Fusion API provider
//!
//! Looks up business details via `GET /v3/businesses/{id}` with a bearer
//! token. The raw payload is cached per venue so repeated lookups of the
//! same recommendation do not hit the API again.

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::VenueDetails,
    services::providers::{project_fields, search_results, VenueProvider},
};
use reqwest::Client as HttpClient;

const BUSINESS_PATH: &str = "/v3/businesses/";
const SEARCH_PATH: &str = "/v3/businesses/search";
const VENUE_CACHE_TTL: u64 = 86_400; // 1 day

#[derive(Clone)]
pub struct YelpFusionProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl YelpFusionProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    /// Business payload, served from cache when present
    async fn business(&self, item_id: &str) -> AppResult<serde_json::Value> {
        cached!(
            self.cache,
            CacheKey::Venue(item_id.to_string()),
            VENUE_CACHE_TTL,
            self.fetch_business(item_id)
        )
    }

    async fn fetch_business(&self, item_id: &str) -> AppResult<serde_json::Value> {
        let url = business_url(&self.api_url, item_id)?;
        let business = self.get_json(url).await?;

        tracing::debug!(yelp_id = %item_id, provider = "yelp_fusion", "Business fetched");

        Ok(business)
    }

    async fn get_json(&self, url: reqwest::Url) -> AppResult<serde_json::Value> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Yelp Fusion API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

/// Builds the business URL, percent-encoding the id as one path segment
fn business_url(api_url: &str, item_id: &str) -> AppResult<reqwest::Url> {
    if item_id.trim().is_empty() {
        return Err(AppError::InvalidInput("Venue id cannot be empty".to_string()));
    }

    let mut url = reqwest::Url::parse(&format!("{}{}", api_url.trim_end_matches('/'), BUSINESS_PATH))
        .map_err(|e| AppError::Internal(format!("Invalid Yelp API URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| AppError::Internal("Yelp API URL cannot be a base".to_string()))?
        .pop_if_empty()
        .push(item_id);

    Ok(url)
}

/// Builds the search URL; the query string is form-encoded
fn search_url(api_url: &str, term: &str, location: &str, limit: usize) -> AppResult<reqwest::Url> {
    let mut url = reqwest::Url::parse(&format!("{}{}", api_url.trim_end_matches('/'), SEARCH_PATH))
        .map_err(|e| AppError::Internal(format!("Invalid Yelp API URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair("term", term)
        .append_pair("location", location)
        .append_pair("limit", &limit.to_string());

    Ok(url)
}

#[async_trait::async_trait]
impl VenueProvider for YelpFusionProvider {
    async fn lookup(&self, item_id: &str, fields: &[String]) -> AppResult<VenueDetails> {
        let business = self.business(item_id).await?;
        Ok(project_fields(business, fields))
    }

    async fn search(&self, term: &str, location: &str, limit: usize) -> AppResult<Vec<VenueDetails>> {
        let url = search_url(&self.api_url, term, location, limit)?;
        let results = search_results(self.get_json(url).await?);

        tracing::debug!(term, location, results = results.len(), provider = "yelp_fusion", "Search completed");

        Ok(results)
    }

    fn name(&self) -> &'static str {
        "yelp_fusion"
    }
}
