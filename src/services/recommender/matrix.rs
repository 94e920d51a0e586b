//! Rating matrix assembly.
//!
//! Pivots the sparse visit ledger into a dense user x venue matrix. Rows
//! follow ascending user id, columns ascending venue id, and unobserved cells
//! hold `0.0`. A real rating of zero is therefore indistinguishable from a
//! missing one.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use nalgebra::{DMatrix, DVector};

use crate::{error::RecommendationError, models::Rating};

/// Dense, mean-centerable view of the ledger at one point in time
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    user_ids: Vec<i64>,
    item_ids: Vec<String>,
    ratings: DMatrix<f64>,
    user_means: DVector<f64>,
    rated_items: HashMap<i64, HashSet<String>>,
}

impl RatingMatrix {
    /// Builds the matrix from every rating in the ledger.
    ///
    /// When the same (user, venue) pair appears more than once, the last
    /// triple in iteration order wins.
    ///
    /// Each user's mean is taken over the whole row, zero-filled cells
    /// included, so users who rated few venues get a baseline pulled
    /// towards zero.
    pub fn build(ratings: &[Rating]) -> Result<Self, RecommendationError> {
        let mut cells: BTreeMap<i64, BTreeMap<&str, i32>> = BTreeMap::new();
        let mut items: BTreeSet<&str> = BTreeSet::new();

        for rating in ratings {
            cells
                .entry(rating.user_id)
                .or_default()
                .insert(rating.item_id.as_str(), rating.rating);
            items.insert(rating.item_id.as_str());
        }

        if cells.is_empty() || items.is_empty() {
            return Err(RecommendationError::EmptyLedger);
        }

        let user_ids: Vec<i64> = cells.keys().copied().collect();
        let item_ids: Vec<String> = items.iter().map(|id| id.to_string()).collect();
        let column: HashMap<&str, usize> = items
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx))
            .collect();

        let mut matrix = DMatrix::<f64>::zeros(user_ids.len(), item_ids.len());
        let mut rated_items: HashMap<i64, HashSet<String>> = HashMap::new();

        for (row, (user_id, user_cells)) in cells.iter().enumerate() {
            let rated = rated_items.entry(*user_id).or_default();
            for (item_id, value) in user_cells {
                matrix[(row, column[item_id])] = f64::from(*value);
                rated.insert(item_id.to_string());
            }
        }

        let user_means = DVector::from_iterator(
            matrix.nrows(),
            matrix.row_iter().map(|row| row.mean()),
        );

        Ok(Self {
            user_ids,
            item_ids,
            ratings: matrix,
            user_means,
            rated_items,
        })
    }

    /// Rejects ranks the truncated factorization cannot honour
    pub fn ensure_rank(&self, rank: usize) -> Result<(), RecommendationError> {
        let (users, items) = self.shape();
        if rank == 0 || rank >= users.min(items) {
            return Err(RecommendationError::DegenerateDimension { rank, users, items });
        }
        Ok(())
    }

    /// Ratings minus each user's mean, broadcast across the row
    pub fn centered(&self) -> DMatrix<f64> {
        let mut centered = self.ratings.clone();
        for (mut row, mean) in centered.row_iter_mut().zip(self.user_means.iter()) {
            row.add_scalar_mut(-mean);
        }
        centered
    }

    pub fn shape(&self) -> (usize, usize) {
        self.ratings.shape()
    }

    pub fn user_ids(&self) -> &[i64] {
        &self.user_ids
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    pub fn ratings(&self) -> &DMatrix<f64> {
        &self.ratings
    }

    pub fn user_means(&self) -> &DVector<f64> {
        &self.user_means
    }

    /// Venues the user has at least one rating for
    pub fn rated_items(&self, user_id: i64) -> Option<&HashSet<String>> {
        self.rated_items.get(&user_id)
    }

    pub(super) fn into_indices(self) -> (Vec<i64>, Vec<String>, HashMap<i64, HashSet<String>>) {
        (self.user_ids, self.item_ids, self.rated_items)
    }
}
