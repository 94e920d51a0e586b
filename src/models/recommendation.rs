use chrono::{DateTime, Days, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A venue suggested to a user by one refresh cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recommendation {
    pub uuid: Uuid,
    pub user_id: i64,
    #[sqlx(rename = "yelp_id")]
    pub item_id: String,
    pub created_at: DateTime<Utc>,
}

impl Recommendation {
    pub fn new(user_id: i64, item_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            user_id,
            item_id: item_id.into(),
            created_at,
        }
    }
}

/// Half-open interval `[start, end)` during which a batch is servable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FreshnessWindow {
    /// The UTC calendar day containing `now`
    pub fn day_of(now: DateTime<Utc>) -> Self {
        let start = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let end = start
            .checked_add_days(Days::new(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Recommendation as served to the client, with venue metadata attached
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedRecommendation {
    pub uuid: Uuid,
    pub item_id: String,
    pub created_at: DateTime<Utc>,
    /// `None` when the venue provider could not be reached
    pub venue: Option<serde_json::Value>,
}

impl EnrichedRecommendation {
    pub fn new(recommendation: Recommendation, venue: Option<serde_json::Value>) -> Self {
        Self {
            uuid: recommendation.uuid,
            item_id: recommendation.item_id,
            created_at: recommendation.created_at,
            venue,
        }
    }
}
