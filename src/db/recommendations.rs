use sqlx::PgPool;

use crate::{
    error::{AppResult, RecommendationError},
    models::{FreshnessWindow, Recommendation},
};

/// Durable storage of generated recommendations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Appends a whole batch. Either every row becomes visible or none does.
    async fn insert_batch(&self, rows: Vec<Recommendation>) -> AppResult<()>;

    /// A user's recommendations created inside `window`, oldest first
    async fn query_latest(
        &self,
        user_id: i64,
        window: FreshnessWindow,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>>;
}

/// Postgres-backed recommendation store
#[derive(Clone)]
pub struct PgRecommendationStore {
    pool: PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn insert_batch(&self, rows: Vec<Recommendation>) -> AppResult<()> {
        let persistence = |e: sqlx::Error| RecommendationError::Persistence(e.to_string());

        let mut tx = self.pool.begin().await.map_err(persistence)?;

        for row in &rows {
            sqlx::query(
                r#"
                INSERT INTO recommendations (uuid, user_id, yelp_id, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(row.uuid)
            .bind(row.user_id)
            .bind(&row.item_id)
            .bind(row.created_at)
            .execute(&mut *tx)
            .await
            .map_err(persistence)?;
        }

        // dropping an uncommitted transaction rolls it back
        tx.commit().await.map_err(persistence)?;

        tracing::debug!(rows = rows.len(), "Recommendation batch committed");

        Ok(())
    }

    async fn query_latest(
        &self,
        user_id: i64,
        window: FreshnessWindow,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let rows = sqlx::query_as::<_, Recommendation>(
            r#"
            SELECT uuid, user_id, yelp_id, created_at
            FROM recommendations
            WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY id
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(window.start)
        .bind(window.end)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
