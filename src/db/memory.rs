//! In-process ledger and store for tests and local runs without Postgres

use tokio::sync::RwLock;

use crate::{
    db::{RecommendationStore, VisitLedger, VISITS_PAGE_SIZE},
    error::{AppResult, RecommendationError},
    models::{FreshnessWindow, Rating, Recommendation, Visit},
};

#[derive(Default)]
pub struct InMemoryVisitLedger {
    visits: RwLock<Vec<Visit>>,
}

impl InMemoryVisitLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the ledger with bare ratings, attended and created now
    pub fn with_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let now = chrono::Utc::now();
        let visits = ratings
            .into_iter()
            .map(|rating| Visit {
                uuid: uuid::Uuid::new_v4(),
                yelp_id: rating.item_id,
                user_id: rating.user_id,
                satisfaction: rating.rating,
                attend_date: now,
                created_at: now,
                updated_at: now,
            })
            .collect();
        Self {
            visits: RwLock::new(visits),
        }
    }
}

#[async_trait::async_trait]
impl VisitLedger for InMemoryVisitLedger {
    async fn all_ratings(&self) -> AppResult<Vec<Rating>> {
        let visits = self.visits.read().await;
        Ok(visits.iter().map(Visit::rating).collect())
    }

    async fn record_visit(&self, visit: Visit) -> AppResult<Visit> {
        self.visits.write().await.push(visit.clone());
        Ok(visit)
    }

    async fn visits_for_user(&self, user_id: i64, page: u32) -> AppResult<Vec<Visit>> {
        let visits = self.visits.read().await;
        let page_size = VISITS_PAGE_SIZE as usize;
        let skip = (page.max(1) as usize - 1) * page_size;

        // newest first; equal timestamps fall back to reverse insertion order
        let mut mine: Vec<&Visit> = visits.iter().filter(|v| v.user_id == user_id).collect();
        mine.reverse();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(mine.into_iter().skip(skip).take(page_size).cloned().collect())
    }

    async fn visit_by_uuid(&self, uuid: uuid::Uuid) -> AppResult<Option<Visit>> {
        let visits = self.visits.read().await;
        Ok(visits.iter().find(|v| v.uuid == uuid).cloned())
    }
}

/// Recommendation store keeping rows in insertion order.
///
/// Rows with an empty venue id are rejected, which fails the whole batch.
#[derive(Default)]
pub struct InMemoryRecommendationStore {
    rows: RwLock<Vec<Recommendation>>,
}

impl InMemoryRecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row, regardless of window
    pub async fn all(&self) -> Vec<Recommendation> {
        self.rows.read().await.clone()
    }
}

#[async_trait::async_trait]
impl RecommendationStore for InMemoryRecommendationStore {
    async fn insert_batch(&self, rows: Vec<Recommendation>) -> AppResult<()> {
        if let Some(bad) = rows.iter().find(|row| row.item_id.trim().is_empty()) {
            return Err(RecommendationError::Persistence(format!(
                "recommendation {} has an empty venue id",
                bad.uuid
            ))
            .into());
        }

        // single write lock: readers see the batch entirely or not at all
        self.rows.write().await.extend(rows);
        Ok(())
    }

    async fn query_latest(
        &self,
        user_id: i64,
        window: FreshnessWindow,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|row| row.user_id == user_id && window.contains(row.created_at))
            .take(limit)
            .cloned()
            .collect())
    }
}
