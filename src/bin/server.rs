//! badgecat HTTP server
//!
//! Serves the badge catalog over HTTP and keeps the search index in step
//! with the SQLite database.
//!
//! # Configuration
//!
//! Settings come from the config file, overridden by environment variables:
//! - `BADGECAT_CONFIG`: Path to config file (default: ~/.config/badgecat/config.yaml)
//! - `BADGECAT_DATABASE_PATH`: SQLite database file
//! - `BADGECAT_PORT`: Port to listen on (default: 8080)
//! - `BADGECAT_SEARCH_ENABLED`: Mirror items into the search index (default: true)
//! - `BADGECAT_SEARCH_BACKEND`: `elasticsearch` or `memory`
//! - `BADGECAT_SEARCH_URL`: Elasticsearch base URL
//! - `BADGECAT_SEARCH_INDEX`: Elasticsearch index name (default: badges)
//! - `BADGECAT_SEARCH_MATCH_MODE`: `any` or `all`
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `GET|POST /items`, `GET|PUT|DELETE /items/{id}`: Item CRUD
//! - `POST /items/{id}/decrement?qty=N`: Atomic stock decrement
//! - `GET /items/search?name=&category=`: Search the index
//! - `GET|POST /items/reindex`: Rebuild the index from the database
//! - `GET /items/index/status`: Index sync status

use std::net::SocketAddr;
use std::path::PathBuf;

use badgecat::{server, Catalog, Config};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "badgecat=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("BADGECAT_CONFIG").ok().map(PathBuf::from);
    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Database: {}", config.database_path.display());
    if config.search.enabled {
        tracing::info!(
            "Search index: {} ({})",
            config.search.index,
            config.search.backend
        );
    }

    let catalog = match Catalog::open(&config).await {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!("Failed to open catalog: {}", e);
            std::process::exit(1);
        }
    };

    if config.search.enabled && config.search.reindex_on_startup {
        let count = catalog.reindex().await;
        tracing::info!("Startup reindex wrote {} document(s)", count);
    }

    let app = server::router(catalog).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
