use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One (user, venue, satisfaction) observation read from the visit ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub user_id: i64,
    /// External venue identifier (Yelp business id)
    #[sqlx(rename = "yelp_id")]
    pub item_id: String,
    #[sqlx(rename = "satisfaction")]
    pub rating: i32,
}

impl Rating {
    pub fn new(user_id: i64, item_id: impl Into<String>, rating: i32) -> Self {
        Self {
            user_id,
            item_id: item_id.into(),
            rating,
        }
    }
}

/// A recorded visit of a user to a venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Visit {
    pub uuid: Uuid,
    pub yelp_id: String,
    pub user_id: i64,
    pub satisfaction: i32,
    pub attend_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Visit {
    pub fn rating(&self) -> Rating {
        Rating::new(self.user_id, self.yelp_id.clone(), self.satisfaction)
    }
}

/// Visit submitted by a user, before it is stored
#[derive(Debug, Clone, Deserialize)]
pub struct NewVisit {
    pub yelp_id: String,
    pub satisfaction: i32,
    pub attend_date: DateTime<Utc>,
}

impl NewVisit {
    pub fn into_visit(self, user_id: i64) -> Visit {
        let now = Utc::now();
        Visit {
            uuid: Uuid::new_v4(),
            yelp_id: self.yelp_id,
            user_id,
            satisfaction: self.satisfaction,
            attend_date: self.attend_date,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Stored visit together with the venue fields shown in listings
#[derive(Debug, Clone, Serialize)]
pub struct VisitWithVenue {
    #[serde(flatten)]
    pub visit: Visit,
    pub data: Option<serde_json::Value>,
}
