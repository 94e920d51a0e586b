//! Truncated SVD reconstruction of the rating matrix.

use std::collections::{HashMap, HashSet};

use nalgebra::{DMatrix, DVector, SVD};

use crate::error::RecommendationError;

use super::matrix::RatingMatrix;

/// Iteration cap handed to the SVD solver; 0 would mean unbounded
const SVD_MAX_ITERATIONS: usize = 10_000;

/// Predicted preference scores for every (user, venue) pair of one cycle.
///
/// Scores are relative: they are not clamped to the rating scale.
#[derive(Debug, Clone)]
pub struct PredictedRatings {
    user_ids: Vec<i64>,
    item_ids: Vec<String>,
    user_rows: HashMap<i64, usize>,
    scores: DMatrix<f64>,
}

impl PredictedRatings {
    pub fn new(user_ids: Vec<i64>, item_ids: Vec<String>, scores: DMatrix<f64>) -> Self {
        let user_rows = user_ids
            .iter()
            .enumerate()
            .map(|(row, id)| (*id, row))
            .collect();
        Self {
            user_ids,
            item_ids,
            user_rows,
            scores,
        }
    }

    pub fn user_ids(&self) -> &[i64] {
        &self.user_ids
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    pub fn scores(&self) -> &DMatrix<f64> {
        &self.scores
    }

    /// Scores of one user paired with their venue ids, in column order
    pub fn user_scores(&self, user_id: i64) -> Option<impl Iterator<Item = (&str, f64)> + '_> {
        let row = *self.user_rows.get(&user_id)?;
        let scores = &self.scores;
        Some(
            self.item_ids
                .iter()
                .enumerate()
                .map(move |(col, item)| (item.as_str(), scores[(row, col)])),
        )
    }
}

/// Rank-k reconstruction of a mean-centered matrix.
///
/// Returns `U_k * S_k * V_k^T + mean` where the k components with the
/// largest singular values are kept. Equal singular values keep solver order.
pub fn reconstruct(
    centered: &DMatrix<f64>,
    user_means: &DVector<f64>,
    rank: usize,
) -> Result<DMatrix<f64>, RecommendationError> {
    let (users, items) = centered.shape();
    if rank == 0 || rank >= users.min(items) {
        return Err(RecommendationError::DegenerateDimension { rank, users, items });
    }
    if user_means.len() != users {
        return Err(RecommendationError::Factorization(format!(
            "expected {} user means, got {}",
            users,
            user_means.len()
        )));
    }

    let svd = SVD::try_new(centered.clone(), true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or_else(|| RecommendationError::Factorization("SVD did not converge".to_string()))?;
    let u = svd
        .u
        .as_ref()
        .ok_or_else(|| RecommendationError::Factorization("SVD failed to compute U".to_string()))?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| RecommendationError::Factorization("SVD failed to compute V^T".to_string()))?;

    let sigma = &svd.singular_values;
    let mut components: Vec<usize> = (0..sigma.len()).collect();
    components.sort_by(|&a, &b| sigma[b].total_cmp(&sigma[a]));

    let mut predicted = DMatrix::<f64>::zeros(users, items);
    for &component in components.iter().take(rank) {
        predicted += (u.column(component) * v_t.row(component)) * sigma[component];
    }

    for (mut row, mean) in predicted.row_iter_mut().zip(user_means.iter()) {
        row.add_scalar_mut(*mean);
    }

    Ok(predicted)
}

/// Centers, factorizes and reconstructs in one step
pub fn predict(
    matrix: RatingMatrix,
    rank: usize,
) -> Result<(PredictedRatings, RatingIndex), RecommendationError> {
    matrix.ensure_rank(rank)?;

    let scores = reconstruct(&matrix.centered(), matrix.user_means(), rank)?;

    tracing::debug!(
        users = scores.nrows(),
        items = scores.ncols(),
        rank,
        "Rating matrix reconstructed"
    );

    let (user_ids, item_ids, rated_items) = matrix.into_indices();
    Ok((
        PredictedRatings::new(user_ids, item_ids, scores),
        RatingIndex { rated_items },
    ))
}

/// Venues each user already rated, kept from the matrix build
#[derive(Debug, Clone, Default)]
pub struct RatingIndex {
    rated_items: HashMap<i64, HashSet<String>>,
}

impl RatingIndex {
    pub fn rated_items(&self, user_id: i64) -> Option<&HashSet<String>> {
        self.rated_items.get(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;

    const TOLERANCE: f64 = 1e-6;

    fn assert_close(a: &DMatrix<f64>, b: &DMatrix<f64>) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            let scale = x.abs().max(y.abs()).max(1.0);
            assert!((x - y).abs() <= TOLERANCE * scale, "{} != {}", x, y);
        }
    }

    fn sample_matrix() -> RatingMatrix {
        let mut ledger = Vec::new();
        for user in 1..=6_i64 {
            for (idx, item) in ["a", "b", "c", "d", "e"].iter().enumerate() {
                if (user as usize + idx) % 3 != 0 {
                    ledger.push(Rating::new(user, *item, ((user as i32 + idx as i32) % 5) + 1));
                }
            }
        }
        RatingMatrix::build(&ledger).unwrap()
    }

    #[test]
    fn test_reconstruction_is_reproducible() {
        let matrix = sample_matrix();
        let centered = matrix.centered();
        let first = reconstruct(&centered, matrix.user_means(), 3).unwrap();
        let second = reconstruct(&centered, matrix.user_means(), 3).unwrap();
        assert_close(&first, &second);
    }

    #[test]
    fn test_full_rank_minus_one_keeps_shape() {
        let matrix = sample_matrix();
        let (users, items) = matrix.shape();
        let rank = users.min(items) - 1;
        let predicted = reconstruct(&matrix.centered(), matrix.user_means(), rank).unwrap();
        assert_eq!(predicted.shape(), (users, items));
    }

    #[test]
    fn test_low_rank_input_is_recovered_exactly() {
        // centered matrix of rank one: the rank-1 reconstruction is lossless
        let centered = DMatrix::from_row_slice(3, 3, &[1.0, -2.0, 1.0, 2.0, -4.0, 2.0, -1.0, 2.0, -1.0]);
        let means = DVector::from_vec(vec![3.0, 1.0, 2.0]);
        let predicted = reconstruct(&centered, &means, 1).unwrap();

        let mut expected = centered.clone();
        for (mut row, mean) in expected.row_iter_mut().zip(means.iter()) {
            row.add_scalar_mut(*mean);
        }
        assert_close(&predicted, &expected);
    }

    #[test]
    fn test_zero_matrix_and_tied_singular_values() {
        let zeros = DMatrix::<f64>::zeros(4, 4);
        let means = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let predicted = reconstruct(&zeros, &means, 2).unwrap();
        assert!((predicted[(3, 0)] - 4.0).abs() < TOLERANCE);

        let identity = DMatrix::<f64>::identity(4, 4);
        let predicted = reconstruct(&identity, &DVector::zeros(4), 2).unwrap();
        assert_eq!(predicted.shape(), (4, 4));
        assert!((predicted.trace() - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_rank_validation() {
        let centered = DMatrix::<f64>::zeros(3, 5);
        let means = DVector::zeros(3);
        assert!(matches!(
            reconstruct(&centered, &means, 3),
            Err(RecommendationError::DegenerateDimension { rank: 3, users: 3, items: 5 })
        ));
        assert!(reconstruct(&centered, &means, 0).is_err());
    }

    #[test]
    fn test_predict_preserves_indices() {
        let matrix = sample_matrix();
        let users = matrix.user_ids().to_vec();
        let items = matrix.item_ids().to_vec();
        let (predicted, index) = predict(matrix, 2).unwrap();

        assert_eq!(predicted.user_ids(), users.as_slice());
        assert_eq!(predicted.item_ids(), items.as_slice());
        assert_eq!(predicted.scores().shape(), (users.len(), items.len()));
        assert!(index.rated_items(1).is_some());
        assert_eq!(predicted.user_scores(1).unwrap().count(), items.len());
        assert!(predicted.user_scores(99).is_none());
    }

    #[test]
    fn test_user_scores_follow_row_of_user() {
        let predicted = PredictedRatings::new(
            vec![10, 20],
            vec!["a".into(), "b".into(), "c".into()],
            DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        );

        let scores: Vec<(&str, f64)> = predicted.user_scores(20).unwrap().collect();
        assert_eq!(scores, vec![("a", 4.0), ("b", 5.0), ("c", 6.0)]);
    }
}
