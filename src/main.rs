//! Candidate Search Backend
//!
//! Review queue over a developer-directory batch and a persisted roster of
//! accepted candidates, served as a REST API with SQLite persistence.

mod api;
mod auth;
mod config;
mod db;
mod directory;
mod errors;
mod models;
mod queue;
mod search;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::{KeyValueStore, RosterStore};
use directory::{GitHubDirectory, GitHubDirectoryConfig};
use queue::ReviewQueue;
use search::RosterView;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub queue: ReviewQueue,
    pub roster: Arc<RosterStore>,
    pub view: Arc<Mutex<RosterView>>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Candidate Search Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Directory URL: {}", config.directory_url);
    tracing::info!("Batch size: {}", config.batch_size);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (SCOUT_API_PSK). Authentication is disabled!");
    }

    // Initialize database
    let kv: Arc<dyn KeyValueStore> = Arc::new(db::open_store(&config.db_path).await?);
    let roster = Arc::new(RosterStore::new(kv));

    load_startup_roster(&roster).await;

    let directory = Arc::new(GitHubDirectory::new(GitHubDirectoryConfig {
        base_url: config.directory_url.clone(),
        ..Default::default()
    })?);
    let queue = ReviewQueue::new(directory, roster.clone(), config.batch_size);

    // First batch for this session
    let initial = queue.clone();
    tokio::spawn(async move {
        initial.initialize().await;
    });

    // Create application state
    let state = AppState {
        queue,
        roster,
        view: Arc::new(Mutex::new(RosterView::new())),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Review queue
        .route("/queue", get(api::get_queue))
        .route("/queue/initialize", post(api::initialize_queue))
        .route("/queue/accept", post(api::accept_candidate))
        .route("/queue/reject", post(api::reject_candidate))
        // Saved candidates
        .route("/roster", get(api::get_roster))
        .route("/roster/query", put(api::set_query))
        .route("/roster/sort", post(api::toggle_sort))
        .route("/roster/sort", delete(api::clear_sort))
        .route("/roster/candidates/{login}", delete(api::remove_candidate))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::require_api_key(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Read the saved roster once at startup and return its size. Storage
/// failures are logged and the service starts with an empty roster.
async fn load_startup_roster(roster: &RosterStore) -> usize {
    match roster.load().await {
        Ok(loaded) => {
            if loaded.recovered {
                tracing::warn!("Saved roster was corrupt and has been cleared");
            }
            tracing::info!("Loaded roster with {} candidates", loaded.candidates.len());
            loaded.candidates.len()
        }
        Err(e) => {
            tracing::error!("Failed to load saved roster, starting empty: {}", e);
            0
        }
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
