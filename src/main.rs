use chrono::Utc;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

use live_orders::modules::live_orders::adapters::outbound::backing_store_in_memory::{
    InMemoryBackingStore, SeedData,
};
use live_orders::shared::core::primitives::SystemClock;
use live_orders::shared::infrastructure::change_feed::in_memory::InMemoryChangeFeed;
use live_orders::shell::config::Config;
use live_orders::shell::state::AppState;
use live_orders::shell::workers::{EngineSources, LiveOrdersEngine};
use live_orders::shell::{graphql, http};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    // In-memory backing store for now
    let feed = Arc::new(InMemoryChangeFeed::new(config.channel_capacity));
    let backing = Arc::new(InMemoryBackingStore::new(feed.clone()));
    if let Some(path) = &config.seed_path {
        let seed = SeedData::from_json(&std::fs::read_to_string(path)?)?;
        backing.seed(seed, Utc::now()).await;
        tracing::info!(path = %path.display(), "seeded backing store");
    }

    let engine = Arc::new(LiveOrdersEngine::start(
        EngineSources {
            table_service: Arc::new(backing.table_service_source()),
            counter: Arc::new(backing.counter_source()),
            clock: Arc::new(SystemClock),
            venue_offset: config.venue_offset,
        },
        feed.as_ref(),
    )?);

    let state = AppState::new(engine.clone());
    let app = http::router(state.clone(), graphql::schema(state));

    tracing::info!("HTTP endpoint: http://{}/live-orders", config.http_addr);
    tracing::info!("GraphQL endpoint: http://{}/gql", config.http_addr);
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::error!(%error, "could not listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    engine.shutdown().await;
    Ok(())
}
