use std::sync::Arc;
use std::time::Duration;

use organize_app::app::router;
use organize_core::config::load_config;
use organize_db::cache::RedisCache;
use organize_db::db::connection::create_pool;
use organize_db::db::migrations::run_migrations;
use organize_db::store::PgEntityStore;
use organize_service::{InventoryService, ServiceOptions};
use salvo::Listener;
use salvo::conn::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting organize inventory server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    // Bad hierarchy overrides must stop startup before anything is served.
    let options = ServiceOptions::from_settings(&config)?;

    run_migrations(&config.database.url).await?;

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
        Duration::from_secs(config.database.connection_timeout_secs),
    )
    .await?;

    tracing::info!("Database connection pool created.");

    let cache = RedisCache::connect(
        &config.cache.url,
        Duration::from_millis(config.cache.response_timeout_ms),
    )
    .await?;

    tracing::info!("Cache connection established.");

    let service = InventoryService::new(
        Arc::new(PgEntityStore::new(pool)),
        Arc::new(cache),
        options,
    );

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = router(config, Arc::new(service));

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}
