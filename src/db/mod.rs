pub mod memory;
pub mod postgres;
pub mod recommendations;
pub mod redis;
pub mod visits;

pub use memory::{InMemoryRecommendationStore, InMemoryVisitLedger};
pub use postgres::{create_pool, run_migrations};
pub use recommendations::{PgRecommendationStore, RecommendationStore};
pub use redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use visits::{PgVisitLedger, VisitLedger, VISITS_PAGE_SIZE};
