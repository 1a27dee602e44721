//! Dashboard API route handlers

pub mod activity;
pub mod forum;
pub mod leaderboard;
pub mod positions;
pub mod projects;
pub mod status;
pub mod trades;
pub mod wallet;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Error response shared by all handlers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map a storage error to a 500 with a JSON body
pub fn internal_error(err: anyhow::Error) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("{err:#}"),
        }),
    )
}
