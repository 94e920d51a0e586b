use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::json;

use scout_api::{
    db::{InMemoryRecommendationStore, InMemoryVisitLedger, RecommendationStore, VisitLedger},
    error::{AppError, AppResult, RecommendationError},
    models::{FreshnessWindow, Rating, Recommendation, VenueDetails},
    routes::{create_router, AppState},
    services::{providers::VenueProvider, RecommenderSettings, RefreshScheduler},
};

/// Venue provider answering from the venue id alone, failing for ids
/// starting with "down-"
struct StubVenueProvider;

#[async_trait::async_trait]
impl VenueProvider for StubVenueProvider {
    async fn lookup(&self, item_id: &str, fields: &[String]) -> AppResult<VenueDetails> {
        if item_id.starts_with("down-") {
            return Err(AppError::ExternalApi("provider unavailable".to_string()));
        }
        let payload = json!({
            "id": item_id,
            "name": format!("Venue {}", item_id),
            "rating": 4.5,
        });
        Ok(scout_api::services::providers::project_fields(payload, fields))
    }

    async fn search(&self, term: &str, location: &str, limit: usize) -> AppResult<Vec<VenueDetails>> {
        let response = json!({
            "businesses": (0..limit.min(2))
                .map(|i| json!({ "id": format!("{}-{}-{}", term, location, i) }))
                .collect::<Vec<_>>(),
        });
        Ok(scout_api::services::providers::search_results(response))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

struct Harness {
    server: TestServer,
    ledger: Arc<InMemoryVisitLedger>,
    store: Arc<InMemoryRecommendationStore>,
}

impl Harness {
    fn new(ratings: Vec<Rating>) -> Self {
        let ledger = Arc::new(InMemoryVisitLedger::with_ratings(ratings));
        let store = Arc::new(InMemoryRecommendationStore::new());
        let state = Arc::new(AppState {
            visit_ledger: ledger.clone(),
            recommendation_store: store.clone(),
            venue_provider: Arc::new(StubVenueProvider),
        });
        let server = TestServer::new(create_router(state)).unwrap();
        Self {
            server,
            ledger,
            store,
        }
    }

    fn scheduler(&self, settings: RecommenderSettings) -> RefreshScheduler {
        RefreshScheduler::new(
            self.ledger.clone(),
            self.store.clone(),
            settings,
            Duration::from_secs(86_400),
        )
    }
}

fn user(id: i64) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&id.to_string()).unwrap(),
    )
}

fn small_ledger() -> Vec<Rating> {
    vec![
        Rating::new(1, "a", 5),
        Rating::new(1, "b", 1),
        Rating::new(2, "a", 4),
        Rating::new(2, "c", 5),
        Rating::new(3, "b", 2),
    ]
}

#[tokio::test]
async fn test_health_check() {
    let harness = Harness::new(Vec::new());
    let response = harness.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let harness = Harness::new(Vec::new());
    let id = "6f1c2a9e-3b7d-4f7a-9c1e-2d4b5a6c7e8f";
    let response = harness
        .server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(id),
        )
        .await;
    assert_eq!(response.header("x-request-id"), id);
}

#[tokio::test]
async fn test_recommendations_require_caller() {
    let harness = Harness::new(small_ledger());
    let response = harness.server.get("/api/v1/recommendations").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = harness
        .server
        .get("/api/v1/recommendations")
        .add_header(
            HeaderName::from_static("x-user-id"),
            HeaderValue::from_static("not-a-number"),
        )
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cycle_then_serve_unrated_venue() {
    let harness = Harness::new(small_ledger());
    harness
        .scheduler(RecommenderSettings { rank: 1, count: 2 })
        .run_cycle()
        .await
        .unwrap();

    let (name, value) = user(1);
    let response = harness
        .server
        .get("/api/v1/recommendations")
        .add_header(name, value)
        .await;
    response.assert_status_ok();

    let served: Vec<serde_json::Value> = response.json();
    assert_eq!(served.len(), 1);
    assert_eq!(served[0]["item_id"], "c");
    assert_eq!(served[0]["venue"]["name"], "Venue c");
}

#[tokio::test]
async fn test_user_without_recommendations_gets_empty_list() {
    let harness = Harness::new(small_ledger());
    let (name, value) = user(42);
    let response = harness
        .server
        .get("/api/v1/recommendations")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    assert!(response.json::<Vec<serde_json::Value>>().is_empty());
}

#[tokio::test]
async fn test_enrichment_failure_degrades_to_null_venue() {
    let harness = Harness::new(Vec::new());
    let now = chrono::Utc::now();
    harness
        .store
        .insert_batch(vec![
            Recommendation::new(7, "down-1", now),
            Recommendation::new(7, "up-1", now),
        ])
        .await
        .unwrap();

    let (name, value) = user(7);
    let response = harness
        .server
        .get("/api/v1/recommendations")
        .add_header(name, value)
        .await;
    response.assert_status_ok();

    let served: Vec<serde_json::Value> = response.json();
    assert_eq!(served.len(), 2);
    assert!(served[0]["venue"].is_null());
    assert_eq!(served[1]["venue"]["id"], "up-1");
}

#[tokio::test]
async fn test_empty_ledger_cycle_leaves_store_unchanged() {
    let harness = Harness::new(Vec::new());
    let result = harness
        .scheduler(RecommenderSettings::default())
        .run_cycle()
        .await;

    assert!(matches!(
        result,
        Err(AppError::Recommendation(RecommendationError::EmptyLedger))
    ));
    assert!(harness.store.all().await.is_empty());
}

#[tokio::test]
async fn test_partial_batch_failure_is_invisible() {
    let harness = Harness::new(Vec::new());
    let now = chrono::Utc::now();
    let result = harness
        .store
        .insert_batch(vec![
            Recommendation::new(1, "a", now),
            Recommendation::new(2, "", now),
        ])
        .await;
    assert!(result.is_err());

    for user_id in [1, 2] {
        let visible = harness
            .store
            .query_latest(user_id, FreshnessWindow::day_of(now), 5)
            .await
            .unwrap();
        assert!(visible.is_empty());
    }
}

#[tokio::test]
async fn test_record_and_list_visits() {
    let harness = Harness::new(Vec::new());
    let (name, value) = user(5);

    let response = harness
        .server
        .post("/api/v1/visits")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "yelp_id": "tartine-bakery",
            "satisfaction": 5,
            "attend_date": "2024-06-01T12:00:00Z"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    assert_eq!(created["user_id"], 5);
    assert_eq!(created["yelp_id"], "tartine-bakery");

    let response = harness
        .server
        .get("/api/v1/visits")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let visits: Vec<serde_json::Value> = response.json();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0]["data"]["name"], "Venue tartine-bakery");
    assert!(visits[0]["data"].get("rating").is_none());

    let response = harness
        .server
        .get("/api/v1/visits")
        .add_query_param("page", 2)
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    let ratings = harness.ledger.all_ratings().await.unwrap();
    assert_eq!(ratings, vec![Rating::new(5, "tartine-bakery", 5)]);
}

#[tokio::test]
async fn test_record_visit_requires_venue() {
    let harness = Harness::new(Vec::new());
    let (name, value) = user(5);
    let response = harness
        .server
        .post("/api/v1/visits")
        .add_header(name, value)
        .json(&json!({
            "yelp_id": "",
            "satisfaction": 3,
            "attend_date": "2024-06-01T12:00:00Z"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_record_visit_without_venue_field_is_bad_request() {
    let harness = Harness::new(Vec::new());
    let (name, value) = user(5);
    let response = harness
        .server
        .post("/api/v1/visits")
        .add_header(name, value)
        .json(&json!({
            "satisfaction": 3,
            "attend_date": "2024-06-01T12:00:00Z"
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(harness.ledger.all_ratings().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_visit_by_uuid() {
    let harness = Harness::new(Vec::new());
    let (name, value) = user(9);

    let response = harness
        .server
        .post("/api/v1/visits")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "yelp_id": "dolores-park",
            "satisfaction": 4,
            "attend_date": "2024-06-02T09:30:00Z"
        }))
        .await;
    let created: serde_json::Value = response.json();
    let uuid = created["uuid"].as_str().unwrap().to_string();

    let response = harness
        .server
        .get(&format!("/api/v1/visits/{}", uuid))
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["yelp_id"], "dolores-park");

    let response = harness
        .server
        .get(&format!("/api/v1/visits/{}", uuid::Uuid::new_v4()))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_venues() {
    let harness = Harness::new(Vec::new());
    let (name, value) = user(3);

    let response = harness
        .server
        .post("/api/v1/search")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "q": "coffee", "location": "Oakland" }))
        .await;
    response.assert_status_ok();
    let venues: Vec<serde_json::Value> = response.json();
    assert_eq!(venues.len(), 2);
    assert_eq!(venues[0]["id"], "coffee-Oakland-0");

    let response = harness
        .server
        .post("/api/v1/search")
        .add_header(name, value)
        .json(&json!({ "q": "coffee" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
