use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use toko_core::LoginRateLimiter;
use toko_db::{Database, DatabaseConfig};
use toko_server::auth::JwtKeys;
use toko_server::config::ServerConfig;
use toko_server::routes;
use toko_server::state::AppState;

/// How often expired login windows are purged.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("toko=info".parse()?))
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;
    tracing::debug!(?config, "Loaded server config");

    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    let login_limiter = LoginRateLimiter::new(config.login_rate_limit);
    let cancel = CancellationToken::new();
    let sweeper = login_limiter.spawn_sweeper(SWEEP_INTERVAL, cancel.clone());

    let state = Arc::new(AppState {
        db,
        jwt: JwtKeys::new(&config.jwt_secret, config.jwt_ttl),
        login_limiter,
        trust_proxy: config.trust_proxy,
        api_prefix: config.api_prefix.clone(),
        hash_cost: config.bcrypt_cost,
    });

    let app = routes::router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cancel.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Rate limit sweeper ended abnormally");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
