use std::cmp::Ordering;
use std::collections::HashSet;

use crate::error::RecommendationError;

use super::factorization::PredictedRatings;

/// Picks the best-scored venues the user has not rated yet.
///
/// Venues are ordered by predicted score, highest first, with ties broken by
/// ascending venue id. A user without rating history gets no suggestions;
/// fewer than `count` venues are returned when not enough unrated ones remain.
pub fn select(
    user_id: i64,
    predicted: &PredictedRatings,
    rated: &HashSet<String>,
    count: usize,
) -> Result<Vec<String>, RecommendationError> {
    let scores = predicted
        .user_scores(user_id)
        .ok_or(RecommendationError::UnknownUser(user_id))?;

    if rated.is_empty() {
        return Ok(Vec::new());
    }

    let mut candidates: Vec<(&str, f64)> = scores
        .filter(|(item_id, _)| !rated.contains(*item_id))
        .collect();

    candidates.sort_by(|(a_id, a_score), (b_id, b_score)| {
        match b_score.total_cmp(a_score) {
            Ordering::Equal => a_id.cmp(b_id),
            ordering => ordering,
        }
    });

    Ok(candidates
        .into_iter()
        .take(count)
        .map(|(item_id, _)| item_id.to_string())
        .collect())
}
