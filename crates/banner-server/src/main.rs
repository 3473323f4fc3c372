//! Banner Server
//!
//! Serves feature banners to users and banner management to admins. Banners
//! live in PostgreSQL; user lookups go through a TTL cache (Redis, or an
//! in-process map when no Redis host is configured).

mod config;
mod extractors;
mod handlers;
mod storage;

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, patch},
    Router,
};
use banner_core::ports::{BannerStore, CacheBackend};
use banner_core::{BannerCache, BannerResolver};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::ServerConfig;
use extractors::{require_admin, require_user, AccessTokens};
use storage::{Database, MemoryCache, RedisCache};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BannerStore>,
    pub resolver: Arc<BannerResolver>,
    pub tokens: Arc<AccessTokens>,
}

impl AppState {
    pub fn new(store: Arc<dyn BannerStore>, cache: BannerCache, tokens: AccessTokens) -> Self {
        Self {
            resolver: Arc::new(BannerResolver::new(store.clone(), cache)),
            store,
            tokens: Arc::new(tokens),
        }
    }
}

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Initialize tracing, RUST_LOG overrides the default level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Banner Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = ServerConfig::load().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, cache_ttl={:?}",
        config.bind_address, config.cache_ttl
    );

    let db = Arc::new(
        Database::new(config.database.clone(), config.database_max_connections)
            .await
            .context("Failed to initialize database")?,
    );

    let backend: Arc<dyn CacheBackend> = match config.cache.clone() {
        Some(info) => Arc::new(
            RedisCache::connect(info)
                .await
                .context("Failed to initialize cache")?,
        ),
        None => {
            warn!("CACHE_HOST not set, using in-memory cache");
            Arc::new(MemoryCache::new())
        }
    };
    let cache = BannerCache::new(backend, config.cache_ttl);

    let state = AppState::new(db.clone(), cache, config.tokens.clone());

    let app = router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down, closing database pool");
    db.close().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

pub fn router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/user_banner", get(handlers::user_banner::get))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    let admin_routes = Router::new()
        .route(
            "/banner",
            get(handlers::banners::list).post(handlers::banners::create),
        )
        .route(
            "/banner/:id",
            patch(handlers::banners::update).delete(handlers::banners::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(state)
}
