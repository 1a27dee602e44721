//! Project snapshot and peer-vote endpoints

use crate::api::routes::{internal_error, ErrorResponse};
use crate::api::server::AppState;
use crate::types::{PeerVote, ProjectSnapshot};
use axum::{extract::State, http::StatusCode, Json};

/// All locally tracked project snapshots
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectSnapshot>>, (StatusCode, Json<ErrorResponse>)> {
    let projects = state.db.list_projects().await.map_err(internal_error)?;
    Ok(Json(projects))
}

/// Votes the bot has cast on peer projects
pub async fn colosseum_votes(
    State(state): State<AppState>,
) -> Result<Json<Vec<PeerVote>>, (StatusCode, Json<ErrorResponse>)> {
    let votes = state.db.peer_votes(50).await.map_err(internal_error)?;
    Ok(Json(votes))
}
