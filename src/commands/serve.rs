//! Serve command - Starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database};

/// Connect to Redis when configured. Without it rate limiting is off.
async fn connect_cache(config: &Config) -> Option<Arc<Cache>> {
    let Some(url) = config.redis_url.as_deref() else {
        tracing::warn!("REDIS_URL not set, rate limiting is disabled");
        return None;
    };

    match Cache::connect(url).await {
        Ok(cache) => {
            tracing::info!("Redis cache connected");
            Some(Arc::new(cache))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, rate limiting is disabled");
            None
        }
    }
}

pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    if let Some(host) = args.host {
        config.server_host = host;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }

    tracing::info!("Starting server...");

    let db = Arc::new(Database::connect(&config).await?);
    tracing::info!("Database connected");

    let cache = connect_cache(&config).await;

    let addr = config.server_addr();
    let client_url = config.client_url.clone();
    let app = create_router(AppState::from_config(db, cache, config), &client_url);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}
