//! Trade endpoints: raw history, cumulative P&L series, settings

use crate::api::routes::{internal_error, ErrorResponse};
use crate::api::server::AppState;
use crate::trading::CYCLE_TRADES;
use crate::types::Trade;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListTradesQuery {
    pub limit: Option<i64>,
}

/// Most recent trades, newest first
pub async fn list_trades(
    State(state): State<AppState>,
    Query(query): Query<ListTradesQuery>,
) -> Result<Json<Vec<Trade>>, (StatusCode, Json<ErrorResponse>)> {
    let trades = state
        .db
        .recent_trades(query.limit.unwrap_or(100))
        .await
        .map_err(internal_error)?;
    Ok(Json(trades))
}

/// One point of the cumulative P&L series
#[derive(Debug, Clone, Serialize)]
pub struct PnlPoint {
    pub timestamp: DateTime<Utc>,
    pub strategy: String,
    pub pnl: f64,
    pub cumulative: f64,
}

/// Running cumulative sum over trades ordered by ascending timestamp
pub fn build_pnl_series(trades: &[Trade]) -> Vec<PnlPoint> {
    let mut cumulative = 0.0;
    trades
        .iter()
        .map(|t| {
            cumulative += t.pnl;
            PnlPoint {
                timestamp: t.timestamp,
                strategy: t.strategy.clone(),
                pnl: t.pnl,
                cumulative,
            }
        })
        .collect()
}

/// Chronological P&L series for charting
pub async fn pnl_series(
    State(state): State<AppState>,
) -> Result<Json<Vec<PnlPoint>>, (StatusCode, Json<ErrorResponse>)> {
    let trades = state
        .db
        .all_trades_ascending()
        .await
        .map_err(internal_error)?;
    Ok(Json(build_pnl_series(&trades)))
}

#[derive(Debug, Serialize)]
pub struct TradingSettings {
    pub strategies: Vec<StrategySetting>,
    pub cycle_interval_seconds: u64,
    pub starting_balance: f64,
    pub max_cycles: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct StrategySetting {
    pub strategy: String,
    pub amount: f64,
}

/// The fixed per-cycle strategy/amount pairs and loop settings
pub async fn trading_settings(State(state): State<AppState>) -> Json<TradingSettings> {
    Json(TradingSettings {
        strategies: CYCLE_TRADES
            .iter()
            .map(|(s, amount)| StrategySetting {
                strategy: s.as_str().to_string(),
                amount: *amount,
            })
            .collect(),
        cycle_interval_seconds: state.config.cycle_interval_seconds,
        starting_balance: state.config.starting_balance,
        max_cycles: state.config.max_cycles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn trade(id: i64, pnl: f64, secs: i64) -> Trade {
        Trade {
            id,
            strategy: "trend".to_string(),
            amount: 0.05,
            pnl,
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_cumulative_is_prefix_sum() {
        let trades = vec![
            trade(1, 0.001, 0),
            trade(2, -0.0004, 60),
            trade(3, 0.0002, 120),
        ];
        let series = build_pnl_series(&trades);

        assert_eq!(series.len(), 3);
        for (k, point) in series.iter().enumerate() {
            let expected: f64 = trades[..=k].iter().map(|t| t.pnl).sum();
            assert!((point.cumulative - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_series() {
        assert!(build_pnl_series(&[]).is_empty());
    }
}
