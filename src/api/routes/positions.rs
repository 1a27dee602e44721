//! Live positions view: stored trades with a market-quote overlay

use crate::api::routes::{internal_error, ErrorResponse};
use crate::api::server::AppState;
use crate::prices::Quote;
use crate::types::Trade;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Symbol the simulated positions are denominated in
const POSITION_SYMBOL: &str = "SOL";

#[derive(Debug, Serialize)]
pub struct LivePosition {
    pub trade_id: i64,
    pub strategy: String,
    pub amount: f64,
    /// Realized (stored) pnl; never recomputed
    pub pnl: f64,
    /// Overlay pnl from the 24h market move; equals `pnl` without a quote
    pub display_pnl: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LivePositionsResponse {
    pub symbol: String,
    pub price_usd: Option<String>,
    pub change_24h_pct: Option<f64>,
    pub quote_available: bool,
    pub positions: Vec<LivePosition>,
}

/// Apply the market overlay. The overlay is display-only: stored rows carry
/// the realized pnl, and `display_pnl` adds the proportional 24h move on the
/// position size when a quote is available.
pub fn overlay_positions(trades: &[Trade], quote: Option<&Quote>) -> Vec<LivePosition> {
    trades
        .iter()
        .map(|t| {
            let display_pnl = match quote {
                Some(q) => t.amount * q.change_24h_pct / 100.0,
                None => t.pnl,
            };
            LivePosition {
                trade_id: t.id,
                strategy: t.strategy.clone(),
                amount: t.amount,
                pnl: t.pnl,
                display_pnl,
                timestamp: t.timestamp,
            }
        })
        .collect()
}

/// Recent trades reframed as positions, with a best-effort market overlay
pub async fn positions_live(
    State(state): State<AppState>,
) -> Result<Json<LivePositionsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let trades = state.db.recent_trades(20).await.map_err(internal_error)?;
    let quote = state.quotes.fetch_best_quote(POSITION_SYMBOL).await;

    let positions = overlay_positions(&trades, quote.as_ref());
    Ok(Json(LivePositionsResponse {
        symbol: POSITION_SYMBOL.to_string(),
        price_usd: quote.as_ref().map(|q| q.price_usd.to_string()),
        change_24h_pct: quote.as_ref().map(|q| q.change_24h_pct),
        quote_available: quote.is_some(),
        positions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn trade(id: i64, amount: f64, pnl: f64) -> Trade {
        Trade {
            id,
            strategy: "liquidity".to_string(),
            amount,
            pnl,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_overlay_uses_quote_change() {
        let quote = Quote {
            price_usd: dec!(150.0),
            change_24h_pct: 2.0,
            liquidity_usd: dec!(1000000),
        };
        let positions = overlay_positions(&[trade(1, 0.10, 0.0004)], Some(&quote));

        assert_eq!(positions.len(), 1);
        // stored pnl untouched, overlay derived from the 24h move
        assert_eq!(positions[0].pnl, 0.0004);
        assert!((positions[0].display_pnl - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_no_quote_falls_back_to_stored_pnl() {
        let positions = overlay_positions(&[trade(1, 0.10, -0.0007)], None);
        assert_eq!(positions[0].display_pnl, -0.0007);
    }
}
