use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scout_api::{
    config::Config,
    db::{self, Cache, PgRecommendationStore, PgVisitLedger},
    routes::{create_router, AppState},
    services::{providers::YelpFusionProvider, RefreshScheduler},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scout_api=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client);

    let visit_ledger = Arc::new(PgVisitLedger::new(pool.clone()));
    let recommendation_store = Arc::new(PgRecommendationStore::new(pool));
    let venue_provider = Arc::new(YelpFusionProvider::new(
        cache,
        config.yelp_api_key.clone(),
        config.yelp_api_url.clone(),
    ));

    // Recommendations are refreshed off the request path
    let scheduler = RefreshScheduler::new(
        visit_ledger.clone(),
        recommendation_store.clone(),
        config.recommender_settings(),
        config.refresh_interval(),
    )
    .spawn();

    let state = Arc::new(AppState {
        visit_ledger,
        recommendation_store,
        venue_provider,
    });
    let app = create_router(state);

    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    cache_handle.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
