use crate::config::Config;
use crate::tmdb::{MovieApi, TmdbClient};
use crate::views;
use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub movies: Arc<dyn MovieApi>,
}

impl AppState {
    pub fn new(movies: Arc<dyn MovieApi>) -> Self {
        Self { movies }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb = TmdbClient::new(&config)?;
    if config.api_key.is_empty() {
        warn!("TMDB_API_KEY is empty - requests will be rejected upstream");
    }
    match tmdb.authenticate().await {
        Ok(_) => info!("Authenticated with TMDB"),
        Err(e) => warn!("{} - starting anyway", e),
    }

    let state = AppState::new(Arc::new(tmdb));
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(views::movie_list))
        .route("/movies/:id", get(views::movie_detail))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
