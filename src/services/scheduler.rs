//! Periodic recomputation of every user's recommendations.
//!
//! A cycle reads one ledger snapshot, fits a single model on a blocking
//! thread and selects venues per user. A user whose selection fails is
//! logged and skipped; a failure of the shared fit aborts the cycle before
//! anything is written. Two cycles inside the same freshness window both
//! write their rows: nothing deduplicates them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use crate::{
    db::{RecommendationStore, VisitLedger},
    error::{AppError, AppResult, RecommendationError},
    models::{FreshnessWindow, Rating, Recommendation},
    services::recommender::{LatentFactorModel, RecommenderSettings},
};

/// Outcome of one refresh cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Users present in the ledger snapshot
    pub users: usize,
    /// Users that received at least one recommendation
    pub recommended_users: usize,
    /// Users whose selection failed
    pub skipped_users: usize,
    pub rows_written: usize,
}

pub struct RefreshScheduler {
    ledger: Arc<dyn VisitLedger>,
    store: Arc<dyn RecommendationStore>,
    settings: RecommenderSettings,
    interval: Duration,
}

/// Handle for stopping a spawned scheduler
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops ticking and waits for the cycle in flight, if any
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Refresh scheduler task failed");
        }
        tracing::info!("Refresh scheduler stopped");
    }
}

impl RefreshScheduler {
    pub fn new(
        ledger: Arc<dyn VisitLedger>,
        store: Arc<dyn RecommendationStore>,
        settings: RecommenderSettings,
        interval: Duration,
    ) -> Self {
        Self {
            ledger,
            store,
            settings,
            interval,
        }
    }

    /// Runs a cycle now, then once per interval starting at the next UTC
    /// midnight, on a background task
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(async move { self.run(shutdown_rx).await });
        SchedulerHandle { shutdown_tx, task }
    }

    async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            rank = self.settings.rank,
            count = self.settings.count,
            "Refresh scheduler started"
        );

        // errors are already logged; the next tick retries from scratch
        let _ = self.run_cycle().await;

        let mut ticker = window_ticker(self.interval, Utc::now());
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = self.run_cycle().await;
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    }

    /// Recomputes recommendations for every user in the ledger and persists
    /// them as one batch
    pub async fn run_cycle(&self) -> AppResult<CycleReport> {
        let start = Instant::now();

        let ratings = self.ledger.all_ratings().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to read visit ledger, cycle aborted");
            e
        })?;

        let settings = self.settings;
        let computed = tokio::task::spawn_blocking(move || compute_batch(&ratings, settings))
            .await
            .map_err(|e| AppError::Internal(format!("Recommendation task failed: {}", e)))?;

        let (rows, mut report) = computed.map_err(|e| {
            tracing::error!(error = %e, "Recommendation model could not be built, cycle aborted");
            AppError::from(e)
        })?;

        if !rows.is_empty() {
            let count = rows.len();
            self.store.insert_batch(rows).await.map_err(|e| {
                tracing::error!(error = %e, rows = count, "Failed to persist recommendation batch");
                e
            })?;
            report.rows_written = count;
        }

        tracing::info!(
            users = report.users,
            recommended_users = report.recommended_users,
            skipped_users = report.skipped_users,
            rows_written = report.rows_written,
            elapsed_ms = start.elapsed().as_millis(),
            "Recommendation cycle completed"
        );

        Ok(report)
    }
}

/// Ticker firing at the next UTC midnight, then every `interval`.
///
/// Served rows expire at the end of their UTC day, so refreshes start on the
/// window boundary rather than relative to process start.
fn window_ticker(interval: Duration, now: DateTime<Utc>) -> Interval {
    let until_boundary = (FreshnessWindow::day_of(now).end - now)
        .to_std()
        .unwrap_or(Duration::ZERO);
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + until_boundary, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// CPU-bound part of a cycle: fit once, select per user
fn compute_batch(
    ratings: &[Rating],
    settings: RecommenderSettings,
) -> Result<(Vec<Recommendation>, CycleReport), RecommendationError> {
    let model = LatentFactorModel::fit(ratings, settings.rank)?;
    Ok(select_batch(&model, model.user_ids(), settings.count, Utc::now()))
}

/// Selects venues for `users` against one fitted model. A user whose
/// selection fails is skipped.
fn select_batch(
    model: &LatentFactorModel,
    users: &[i64],
    count: usize,
    created_at: DateTime<Utc>,
) -> (Vec<Recommendation>, CycleReport) {
    let mut rows = Vec::new();
    let mut report = CycleReport {
        users: users.len(),
        ..CycleReport::default()
    };

    for &user_id in users {
        match model.recommend(user_id, count) {
            Ok(items) => {
                if !items.is_empty() {
                    report.recommended_users += 1;
                }
                rows.extend(
                    items
                        .into_iter()
                        .map(|item_id| Recommendation::new(user_id, item_id, created_at)),
                );
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Skipping user in recommendation cycle");
                report.skipped_users += 1;
            }
        }
    }

    (rows, report)
}
