//! HTTP server initialization and runtime setup.
//!
//! Connects the database, applies migrations, selects the threat cache,
//! builds the single threat checker instance, spawns the click worker and
//! runs Axum until Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;

use crate::application::services::LinkSettings;
use crate::config::Config;
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::{MemoryCache, RedisCache, ThreatCache};
use crate::infrastructure::persistence::PgLinkRepository;
use crate::infrastructure::threat_check::{SafeBrowsingClient, ThreatChecker};
use crate::routes::app_router;
use crate::state::AppState;

/// Opens the connection pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Redis when configured and reachable, otherwise the in-process cache.
pub async fn build_threat_cache(config: &Config) -> Arc<dyn ThreatCache> {
    let ttl = config.threat_cache_ttl_seconds;

    if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, ttl).await {
            Ok(redis) => {
                tracing::info!("Threat cache: Redis");
                return Arc::new(redis);
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using in-memory cache.", e);
            }
        }
    }

    tracing::info!("Threat cache: in-memory");
    Arc::new(MemoryCache::new(Duration::from_secs(ttl)))
}

/// Runs the HTTP server with the given configuration.
///
/// # Errors
///
/// Returns an error if the database is unreachable, a migration fails, the
/// threat client cannot be built or the listener cannot bind.
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to apply migrations")?;

    let threat_cache = build_threat_cache(&config).await;

    if config.safe_browsing_api_key.is_none() {
        tracing::warn!("SAFE_BROWSING_API_KEY is not set; uncached threat checks will fail");
    }
    let threat_checker: Arc<dyn ThreatChecker> = Arc::new(
        SafeBrowsingClient::new(config.threat_check_config(), threat_cache.clone())
            .context("Failed to build threat check client")?,
    );

    let link_repository: Arc<dyn LinkRepository> =
        Arc::new(PgLinkRepository::new(Arc::new(pool)));

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);
    tokio::spawn(run_click_worker(
        click_rx,
        link_repository.clone(),
        config.click_worker_concurrency,
    ));
    tracing::info!(
        "Click worker started (concurrency {})",
        config.click_worker_concurrency
    );

    let settings = LinkSettings {
        base_url: config.parsed_base_url()?,
        code_length: config.short_code_length,
        max_retries: config.short_code_max_retries,
    };

    let state = AppState::new(
        link_repository,
        threat_checker,
        threat_cache,
        click_tx,
        settings,
        config.behind_proxy,
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
