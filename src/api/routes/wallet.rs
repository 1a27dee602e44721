//! Wallet stats derived from the trade history

use crate::api::routes::{internal_error, ErrorResponse};
use crate::api::server::AppState;
use crate::types::TradeStats;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct WalletStats {
    pub starting_balance: f64,
    pub current_balance: f64,
    pub total_pnl: f64,
    pub roi_percent: f64,
    pub total_trades: i64,
    pub winning_trades: i64,
    pub losing_trades: i64,
    pub win_rate_percent: f64,
}

/// Derive wallet stats from the starting allowance and realized P&L
pub fn compute_wallet_stats(starting_balance: f64, stats: &TradeStats) -> WalletStats {
    let roi_percent = if starting_balance != 0.0 {
        (stats.total_pnl / starting_balance) * 100.0
    } else {
        0.0
    };

    WalletStats {
        starting_balance,
        current_balance: starting_balance + stats.total_pnl,
        total_pnl: stats.total_pnl,
        roi_percent,
        total_trades: stats.total_trades,
        winning_trades: stats.winning_trades,
        losing_trades: stats.losing_trades,
        win_rate_percent: stats.win_rate(),
    }
}

pub async fn wallet_stats(
    State(state): State<AppState>,
) -> Result<Json<WalletStats>, (StatusCode, Json<ErrorResponse>)> {
    let stats = state.db.trade_stats().await.map_err(internal_error)?;
    Ok(Json(compute_wallet_stats(
        state.config.starting_balance,
        &stats,
    )))
}
