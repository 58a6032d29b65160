//! Film catalog page service.
//!
//! Serves three server-rendered pages over the sakila database:
//! - `/` a few films with their actors and the first categories
//! - `/movies` a longer film list
//! - `/customers` customers with their first rentals
//!
//! Anything else is looked up in the static directory.

mod common_data;
mod handlers;
mod render;
mod routes;
mod service;
mod state;
#[cfg(test)]
mod testing;

use std::future::Future;
use std::sync::Arc;

use axum::{middleware, Router};
use common::config::AppConfig;
use common::db::Database;
use common::middleware::{no_cache_middleware, request_id_middleware};
use render::PageRenderer;
use state::AppState;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "page-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (if present) before anything else
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = AppConfig::load_with_service(SERVICE_NAME);

    // Templates load before the session opens so a bad template dir
    // leaves no pool behind.
    let renderer = PageRenderer::load(&config.templates_dir)?;

    // A session failure is fatal; nothing is served without the database.
    let database = Database::initialize(&config.database).await?;

    let state = AppState::new(&config, Arc::new(database.clone()), renderer);
    let app = create_router(state, &config);

    let addr = config.bind_address();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            database.shutdown().await;
            return Err(e.into());
        }
    };
    info!(service = SERVICE_NAME, address = %addr, "Starting service");
    for path in ["/", "/movies", "/customers"] {
        info!("http://{}{}", addr, path);
    }

    serve(listener, app, shutdown_signal(), database.shutdown()).await?;

    info!(service = SERVICE_NAME, "Service stopped");
    Ok(())
}

/// Serves until `signal` fires, then runs `release` whether serving
/// ended cleanly or with an error.
async fn serve<S, R>(
    listener: TcpListener,
    app: Router,
    signal: S,
    release: R,
) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
    R: Future<Output = ()>,
{
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await;
    release.await;
    served
}

fn create_router(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .merge(routes::router())
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(middleware::from_fn(no_cache_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            warn!("Received SIGTERM, shutting down");
        }
    }
}
