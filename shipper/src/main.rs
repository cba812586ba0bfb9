mod config;
mod delivery;
mod models;
mod routes;
mod transform;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shipper=debug,parser=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match config::Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };
    if config.key.is_none() {
        error!("LOGDNA_KEY is not set, every delivery will fail");
    }

    let shipper = match delivery::Shipper::new(Arc::clone(&config)) {
        Ok(shipper) => shipper,
        Err(e) => {
            error!("Failed to create shipper: {}", e);
            return;
        }
    };

    let state = routes::AppState {
        config: Arc::clone(&config),
        shipper,
    };

    let app = Router::new()
        .merge(routes::create_routes(state))
        .layer(TraceLayer::new_for_http());

    // Start server
    info!("Starting log shipper on {} -> {}", config.listen_addr, config.ingest_url);

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.listen_addr, e);
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
