//! Leaderboard endpoint

use crate::api::routes::{internal_error, ErrorResponse};
use crate::api::server::AppState;
use crate::types::LeaderboardRow;
use axum::{extract::State, http::StatusCode, Json};

/// Rows from the most recent leaderboard snapshot only; earlier snapshots
/// stay in the table as history but are not served.
pub async fn latest_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardRow>>, (StatusCode, Json<ErrorResponse>)> {
    let rows = state
        .db
        .latest_leaderboard()
        .await
        .map_err(internal_error)?;
    Ok(Json(rows))
}
