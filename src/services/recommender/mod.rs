//! Latent factor recommendation engine
//!
//! One cycle pivots the visit ledger into a dense rating matrix, factorizes
//! the mean-centered matrix with a truncated SVD, reconstructs predicted
//! scores and picks the best unrated venues per user. Nothing here touches
//! storage; the refresh scheduler owns loading and persisting.

pub mod factorization;
pub mod matrix;
pub mod selector;

use crate::{error::RecommendationError, models::Rating};

pub use factorization::{PredictedRatings, RatingIndex};
pub use matrix::RatingMatrix;
pub use selector::select;

/// Tunables of the engine, threaded through each cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommenderSettings {
    /// Number of latent components kept by the factorization
    pub rank: usize,
    /// Venues suggested per user
    pub count: usize,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self { rank: 3, count: 5 }
    }
}

/// Model produced by one cycle: predictions plus the rating history they
/// were derived from
#[derive(Debug, Clone)]
pub struct LatentFactorModel {
    predicted: PredictedRatings,
    index: RatingIndex,
}

impl LatentFactorModel {
    /// Builds the rating matrix and factorizes it. Shared by all users of
    /// a cycle.
    pub fn fit(ratings: &[Rating], rank: usize) -> Result<Self, RecommendationError> {
        let matrix = RatingMatrix::build(ratings)?;
        let (predicted, index) = factorization::predict(matrix, rank)?;
        Ok(Self { predicted, index })
    }

    pub fn user_ids(&self) -> &[i64] {
        self.predicted.user_ids()
    }

    pub fn predicted(&self) -> &PredictedRatings {
        &self.predicted
    }

    /// Top `count` unrated venues for one user
    pub fn recommend(&self, user_id: i64, count: usize) -> Result<Vec<String>, RecommendationError> {
        let rated = self
            .index
            .rated_items(user_id)
            .ok_or(RecommendationError::UnknownUser(user_id))?;
        select(user_id, &self.predicted, rated, count)
    }
}
