//! Agent status and heartbeat endpoints

use crate::api::routes::{internal_error, ErrorResponse};
use crate::api::server::AppState;
use crate::types::AgentStatusSnapshot;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: Option<AgentStatusSnapshot>,
}

/// Most recent agent-status snapshot, null before the first fetch
pub async fn agent_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let status = state
        .db
        .latest_agent_status()
        .await
        .map_err(internal_error)?;
    Ok(Json(StatusResponse { status }))
}

/// Compact liveness snapshot for external monitors
#[derive(Debug, Serialize)]
pub struct Heartbeat {
    pub alive: bool,
    pub project_name: String,
    pub project_phase: Option<String>,
    pub submitted: bool,
    pub agent_status: Option<String>,
    pub engagement_score: Option<f64>,
    pub total_trades: i64,
    pub total_pnl: f64,
    pub live_link: String,
    pub generated_at: DateTime<Utc>,
}

/// One-call summary: project state, latest remote status, trade totals
pub async fn heartbeat(
    State(state): State<AppState>,
) -> Result<Json<Heartbeat>, (StatusCode, Json<ErrorResponse>)> {
    let project = state
        .db
        .get_project(&state.config.project.name)
        .await
        .map_err(internal_error)?;
    let status = state
        .db
        .latest_agent_status()
        .await
        .map_err(internal_error)?;
    let stats = state.db.trade_stats().await.map_err(internal_error)?;

    Ok(Json(Heartbeat {
        alive: true,
        project_name: state.config.project.name.clone(),
        project_phase: project.as_ref().map(|p| p.phase.clone()),
        submitted: project
            .as_ref()
            .map(|p| p.submitted_at.is_some())
            .unwrap_or(false),
        agent_status: status.as_ref().and_then(|s| s.status.clone()),
        engagement_score: status.as_ref().map(|s| s.engagement_score),
        total_trades: stats.total_trades,
        total_pnl: stats.total_pnl,
        live_link: state.config.live_link(),
        generated_at: Utc::now(),
    }))
}
