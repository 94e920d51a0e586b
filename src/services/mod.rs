pub mod providers;
pub mod recommendations;
pub mod recommender;
pub mod scheduler;
pub mod search;
pub mod visits;

pub use recommender::{LatentFactorModel, RecommenderSettings};
pub use scheduler::{CycleReport, RefreshScheduler, SchedulerHandle};
