use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use auth::basic::UserDirectory;
use config::Config;
use db::mongo::MongoStore;
use services::journal::Journal;

#[derive(Clone)]
pub struct AppState {
    pub journal: Journal,
    pub users: Arc<UserDirectory>,
}

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    let protected_routes = Router::new()
        .route("/new", post(handlers::ratings::create_user))
        .route("/rate", post(handlers::ratings::submit_rating))
        .route("/ratings", get(handlers::ratings::list_ratings))
        .route("/tags", get(handlers::ratings::list_tags))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "myday_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env()?;

    let users = UserDirectory::new(config.load_users()?)?;
    if users.is_empty() {
        tracing::warn!("No users configured; every request will be denied");
    } else {
        tracing::info!("Loaded {} user(s)", users.len());
    }

    // Database
    let store = MongoStore::connect(&config.mongo, config.connect_timeout)
        .await
        .context("Failed to open MongoDB connection")?;

    let state = AppState {
        journal: Journal::new(Arc::new(store.clone()), config.store_timeout),
        users: Arc::new(users),
    };

    let app = router(state);

    let addr = config.listen_addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
