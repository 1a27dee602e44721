//! Simulated trade generation
//!
//! There is no exchange behind this: PnL is uniform noise bounded by 1% of
//! the trade amount. The stored record is never recomputed; the dashboard's
//! live-positions view may overlay a display-only PnL on top.

use crate::db::Database;
use crate::types::Strategy;
use anyhow::Result;
use rand::Rng;
use tracing::info;

/// Relative noise bound: |pnl| <= NOISE_BOUND * amount
pub const NOISE_BOUND: f64 = 0.01;

/// Fixed strategy/amount pairs executed every cycle
pub const CYCLE_TRADES: [(Strategy, f64); 3] = [
    (Strategy::Arbitrage, 0.05),
    (Strategy::Liquidity, 0.10),
    (Strategy::Trend, 0.05),
];

/// Fabricate a PnL for a trade of the given amount
pub fn simulate_pnl(amount: f64) -> f64 {
    let mut rng = rand::thread_rng();
    rng.gen_range(-NOISE_BOUND..=NOISE_BOUND) * amount
}

/// Generate one simulated trade and persist it
pub async fn execute_trade(db: &Database, strategy: Strategy, amount: f64) -> Result<f64> {
    let pnl = simulate_pnl(amount);
    db.insert_trade(strategy.as_str(), amount, pnl).await?;
    info!(
        "[{}] Trade: {} SOL | PnL: {:+.4}",
        strategy, amount, pnl
    );
    Ok(pnl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pnl_bounded_by_amount() {
        for _ in 0..1000 {
            let amount = 0.05;
            let pnl = simulate_pnl(amount);
            assert!(pnl.abs() <= NOISE_BOUND * amount + f64::EPSILON);
        }
    }

    #[test]
    fn test_pnl_scales_with_amount() {
        for _ in 0..1000 {
            let pnl = simulate_pnl(10.0);
            assert!(pnl.abs() <= 0.1 + f64::EPSILON);
        }
    }

    #[tokio::test]
    async fn test_execute_trade_persists_record() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let pnl = execute_trade(&db, Strategy::Arbitrage, 0.05).await.unwrap();

        let trades = db.recent_trades(10).await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].strategy, "arbitrage");
        assert_eq!(trades[0].amount, 0.05);
        assert_eq!(trades[0].pnl, pnl);
    }
}
