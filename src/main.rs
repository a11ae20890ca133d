mod admin;
mod common;
mod model;
mod store;

use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, response::IntoResponse};
use clap::Parser;
use tower_http::trace::TraceLayer;

use admin::types::AdminErrorResponse;
use admin::validation::PageLimits;
use model::arg::Args;
use model::config::Config;
use store::MemoryStore;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config_path = args
        .config
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        tracing::error!("Failed to load config: {:#}", e);
        std::process::exit(1);
    });
    if let Some(path) = config.config_path() {
        tracing::debug!("Config loaded from {}", path.display());
    }

    // Empty string is treated as not configured, preventing empty key bypass
    let admin_key = match config.effective_admin_api_key() {
        Some(key) => key.to_string(),
        None => {
            tracing::error!("adminApiKey not set in config file");
            std::process::exit(1);
        }
    };

    // Open the store (command line data path wins over the config file)
    let data_path = args.data.or_else(|| config.data_path.clone());
    let store = match &data_path {
        Some(path) => MemoryStore::load(path).unwrap_or_else(|e| {
            tracing::error!("Failed to load data file: {:#}", e);
            std::process::exit(1);
        }),
        None => MemoryStore::new(),
    };

    let (customers, regions, store_credits) = store.counts();
    tracing::info!(
        "Loaded {} customers, {} regions, {} store credits",
        customers,
        regions,
        store_credits
    );
    match store.data_path() {
        Some(path) => tracing::info!("Write-back enabled: {}", path.display()),
        None => tracing::warn!("No data file configured, changes are kept in memory only"),
    }

    let service = admin::StoreCreditService::new(
        Arc::new(store),
        PageLimits {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
        },
    );
    let admin_state = admin::AdminState::new(admin_key, service);

    let app = Router::new()
        .merge(admin::create_admin_router(admin_state, &config.admin_cors))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting store credit admin API: {}", addr);
    tracing::info!("Admin CORS origins: {}", config.admin_cors);
    tracing::info!("Available APIs:");
    for route in admin::admin_routes() {
        let path = format!("{}{}", admin::ADMIN_BASE_PATH, route.path);
        tracing::info!(
            "  {:<6} {:<44} {}",
            route.method,
            path.trim_end_matches('/'),
            route.summary
        );
    }

    let listener = match tokio::net::TcpListener::bind(&addr).await {
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

/// Unknown routes answer with the admin error envelope
async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(AdminErrorResponse::not_found("Route not found")),
    )
}
