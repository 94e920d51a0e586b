use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Rating, Visit},
};

/// Visits shown per history page
pub const VISITS_PAGE_SIZE: i64 = 10;

/// Read/write access to the visit ledger
///
/// `all_ratings` must return a consistent snapshot: the refresh cycle reads
/// it once and builds its whole model from that result.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VisitLedger: Send + Sync {
    /// Every (user, venue, satisfaction) triple, in insertion order
    async fn all_ratings(&self) -> AppResult<Vec<Rating>>;

    /// Stores a new visit
    async fn record_visit(&self, visit: Visit) -> AppResult<Visit>;

    /// One page of a user's visits, newest first. Pages start at 1.
    async fn visits_for_user(&self, user_id: i64, page: u32) -> AppResult<Vec<Visit>>;

    async fn visit_by_uuid(&self, uuid: Uuid) -> AppResult<Option<Visit>>;
}

/// Postgres-backed visit ledger
#[derive(Clone)]
pub struct PgVisitLedger {
    pool: PgPool,
}

impl PgVisitLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VisitLedger for PgVisitLedger {
    async fn all_ratings(&self) -> AppResult<Vec<Rating>> {
        // REPEATABLE READ keeps the snapshot stable even if visits land mid-read
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT user_id, yelp_id, satisfaction
            FROM visits
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ratings)
    }

    async fn record_visit(&self, visit: Visit) -> AppResult<Visit> {
        let stored = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (uuid, yelp_id, user_id, satisfaction, attend_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING uuid, yelp_id, user_id, satisfaction, attend_date, created_at, updated_at
            "#,
        )
        .bind(visit.uuid)
        .bind(&visit.yelp_id)
        .bind(visit.user_id)
        .bind(visit.satisfaction)
        .bind(visit.attend_date)
        .bind(visit.created_at)
        .bind(visit.updated_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = stored.user_id, yelp_id = %stored.yelp_id, "Visit recorded");

        Ok(stored)
    }

    async fn visits_for_user(&self, user_id: i64, page: u32) -> AppResult<Vec<Visit>> {
        let offset = i64::from(page.max(1) - 1) * VISITS_PAGE_SIZE;

        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT uuid, yelp_id, user_id, satisfaction, attend_date, created_at, updated_at
            FROM visits
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(VISITS_PAGE_SIZE)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(visits)
    }

    async fn visit_by_uuid(&self, uuid: Uuid) -> AppResult<Option<Visit>> {
        let visit = sqlx::query_as::<_, Visit>(
            r#"
            SELECT uuid, yelp_id, user_id, satisfaction, attend_date, created_at, updated_at
            FROM visits
            WHERE uuid = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(visit)
    }
}
