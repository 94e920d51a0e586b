use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures of the recommendation engine and its persistence
#[derive(thiserror::Error, Debug)]
pub enum RecommendationError {
    #[error("Visit ledger is empty: no users or no venues to factorize")]
    EmptyLedger,

    #[error("Rank {rank} must be positive and below min(users, items) for a {users}x{items} matrix")]
    DegenerateDimension {
        rank: usize,
        users: usize,
        items: usize,
    },

    #[error("User {0} is not present in the rating matrix")]
    UnknownUser(i64),

    #[error("Factorization failed: {0}")]
    Factorization(String),

    #[error("Failed to persist recommendation batch: {0}")]
    Persistence(String),

    #[error("Venue metadata unavailable for {item_id}: {reason}")]
    EnrichmentUnavailable { item_id: String, reason: String },
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error(transparent)]
    Recommendation(#[from] RecommendationError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::ExternalApi(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Recommendation(RecommendationError::EnrichmentUnavailable { .. }) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::Recommendation(RecommendationError::UnknownUser(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::Recommendation(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
