//! Public market-quote client for the live-positions overlay
//!
//! Fetches candidate DEX pairs for a symbol and keeps the deepest USD pair.
//! Used only to recompute a display PnL on the dashboard; stored trade
//! records are never touched. Any failure degrades to "no quote".

use anyhow::{Context, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

const SEARCH_URL: &str = "https://api.dexscreener.com/latest/dex/search";

/// Quote currencies accepted for the overlay
const USD_QUOTES: [&str; 3] = ["USDC", "USDT", "USD"];

/// Best available quote for a symbol
#[derive(Debug, Clone)]
pub struct Quote {
    pub price_usd: Decimal,
    pub change_24h_pct: f64,
    pub liquidity_usd: Decimal,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    pairs: Vec<PairPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PairPayload {
    price_usd: Option<String>,
    price_change: PriceChange,
    liquidity: Liquidity,
    quote_token: TokenInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PriceChange {
    h24: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Liquidity {
    usd: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenInfo {
    symbol: Option<String>,
}

/// Quote API client
#[derive(Clone)]
pub struct QuoteClient {
    client: Client,
}

impl QuoteClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Best-liquidity USD quote for a symbol, or None on any failure
    pub async fn fetch_best_quote(&self, symbol: &str) -> Option<Quote> {
        match self.try_fetch(symbol).await {
            Ok(quote) => quote,
            Err(e) => {
                debug!("Quote fetch for {} failed: {:#}", symbol, e);
                None
            }
        }
    }

    async fn try_fetch(&self, symbol: &str) -> Result<Option<Quote>> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[("q", symbol)])
            .send()
            .await
            .context("quote search request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("quote API error {}", response.status());
        }

        let search: SearchResponse = response
            .json()
            .await
            .context("failed to parse quote response")?;

        Ok(select_best_pair(&search.pairs))
    }
}

impl Default for QuoteClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the deepest USD-quoted pair among the candidates
fn select_best_pair(pairs: &[PairPayload]) -> Option<Quote> {
    pairs
        .iter()
        .filter(|p| {
            p.quote_token
                .symbol
                .as_deref()
                .map(|s| USD_QUOTES.contains(&s.to_uppercase().as_str()))
                .unwrap_or(false)
        })
        .filter_map(|p| {
            let price_usd = Decimal::from_str(p.price_usd.as_deref()?).ok()?;
            let liquidity_usd = Decimal::try_from(p.liquidity.usd.unwrap_or(0.0)).ok()?;
            Some(Quote {
                price_usd,
                change_24h_pct: p.price_change.h24.unwrap_or(0.0),
                liquidity_usd,
            })
        })
        .max_by_key(|q| q.liquidity_usd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pair(price: &str, quote: &str, liquidity: f64, h24: f64) -> PairPayload {
        PairPayload {
            price_usd: Some(price.to_string()),
            price_change: PriceChange { h24: Some(h24) },
            liquidity: Liquidity {
                usd: Some(liquidity),
            },
            quote_token: TokenInfo {
                symbol: Some(quote.to_string()),
            },
        }
    }

    #[test]
    fn test_best_pair_prefers_liquidity() {
        let pairs = vec![
            pair("150.10", "USDC", 50_000.0, 1.2),
            pair("150.50", "USDT", 900_000.0, 1.5),
            pair("0.0042", "WETH", 5_000_000.0, -0.3), // non-USD quote ignored
        ];

        let quote = select_best_pair(&pairs).unwrap();
        assert_eq!(quote.price_usd, dec!(150.50));
        assert_eq!(quote.change_24h_pct, 1.5);
    }

    #[test]
    fn test_no_usd_pair_yields_none() {
        let pairs = vec![pair("0.0042", "WETH", 5_000_000.0, 0.0)];
        assert!(select_best_pair(&pairs).is_none());

        assert!(select_best_pair(&[]).is_none());
    }

    #[test]
    fn test_unparseable_price_skipped() {
        let mut bad = pair("not-a-price", "USDC", 100.0, 0.0);
        bad.price_usd = Some("n/a".to_string());
        let pairs = vec![bad, pair("150.10", "USDC", 50.0, 2.0)];

        let quote = select_best_pair(&pairs).unwrap();
        assert_eq!(quote.price_usd, dec!(150.10));
    }
}
