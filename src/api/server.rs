//! Axum server setup and configuration
//!
//! Serves read-only JSON snapshots of the store plus derived aggregates.
//! No mutation endpoints: the orchestrator is the only writer.

use crate::api::routes;
use crate::prices::QuoteClient;
use crate::{Config, Database};
use anyhow::Result;
use axum::{
    http::{header, Method},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Ports tried after the configured one is taken
const FALLBACK_PORTS: [u16; 3] = [4001, 4100, 8080];

/// Shared application state, constructed once at startup
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub quotes: Arc<QuoteClient>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<Database>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            quotes: Arc::new(QuoteClient::new()),
        }
    }
}

/// Create the Axum application with all routes
pub fn create_app(state: AppState) -> Router {
    // CORS open to any origin for the /api prefix; the dashboard is static
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let api_routes = Router::new()
        .route("/trades", get(routes::trades::list_trades))
        .route("/pnl-series", get(routes::trades::pnl_series))
        .route("/trading-settings", get(routes::trades::trading_settings))
        .route("/wallet-stats", get(routes::wallet::wallet_stats))
        .route("/positions-live", get(routes::positions::positions_live))
        .route("/forum", get(routes::forum::forum_feed))
        .route(
            "/forum-conversations",
            get(routes::forum::forum_conversations),
        )
        .route("/projects", get(routes::projects::list_projects))
        .route("/colosseum-votes", get(routes::projects::colosseum_votes))
        .route("/leaderboard", get(routes::leaderboard::latest_leaderboard))
        .route("/status", get(routes::status::agent_status))
        .route("/heartbeat", get(routes::status::heartbeat))
        .route("/activity", get(routes::activity::activity_feed))
        .route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Bind the preferred port, falling back through a small fixed list.
/// Exhausting the list is a startup failure.
pub async fn bind_with_fallback(port: u16) -> Result<TcpListener> {
    let mut candidates = vec![port];
    candidates.extend(FALLBACK_PORTS.iter().filter(|p| **p != port));

    for candidate in candidates {
        let addr = SocketAddr::from(([0, 0, 0, 0], candidate));
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                info!("Dashboard API listening on http://{}", addr);
                return Ok(listener);
            }
            Err(e) => warn!("Port {} unavailable: {}", candidate, e),
        }
    }

    anyhow::bail!("no available port among {port} and fallbacks {FALLBACK_PORTS:?}")
}
