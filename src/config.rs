//! Configuration management for the Colosseum bot

use anyhow::Result;
use std::env;

/// Bot configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer credential for the contest API (optional; absence disables
    /// all contest calls instead of erroring)
    pub contest_api_key: Option<String>,

    /// Credential for the AI advisory API (optional; absence yields
    /// fallback decisions)
    pub advisory_api_key: Option<String>,

    /// Path to SQLite database
    pub database_path: String,

    /// Dashboard API port
    pub port: u16,

    /// Maximum number of orchestrator cycles (None = unbounded)
    pub max_cycles: Option<u64>,

    /// Starting balance for wallet stats, in SOL
    pub starting_balance: f64,

    /// Explicit public URL for the dashboard (optional)
    pub public_url: Option<String>,

    /// Seconds between cycles after a clean cycle
    pub cycle_interval_seconds: u64,

    /// Seconds to pause after a cycle-level error
    pub error_pause_seconds: u64,

    /// Fixed delay between project bootstrap and the first cycle
    pub startup_delay_seconds: u64,

    /// Competition project identity
    pub project: ProjectIdentity,
}

/// Static identity of the competition project this bot maintains
#[derive(Debug, Clone)]
pub struct ProjectIdentity {
    pub name: String,
    pub description: String,
    pub repo_link: String,
    pub integration: String,
    pub presentation_link: String,
    /// 1-3 tags, enforced by the contest API
    pub tags: Vec<String>,
}

impl Default for ProjectIdentity {
    fn default() -> Self {
        Self {
            name: "HeliosSynerga".to_string(),
            description: "Three-headed AI trading agent: arbitrage, liquidity \
                optimization, and trend-following strategies with autonomous \
                execution and real-time decision logging."
                .to_string(),
            repo_link: "https://github.com/Quantum-Synergi/HeliosSynerga".to_string(),
            integration: "Executes swaps via aggregator APIs, monitors oracle \
                price feeds for trend analysis, tracks positions on-chain."
                .to_string(),
            presentation_link:
                "https://github.com/Quantum-Synergi/HeliosSynerga/blob/main/README.md".to_string(),
            tags: vec!["defi".to_string(), "ai".to_string(), "trading".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let contest_api_key = env::var("COLOSSEUM_API_KEY").ok().filter(|s| !s.is_empty());
        let advisory_api_key = env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty());

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "colosseum-bot.db".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4000);

        let max_cycles = env::var("MAX_CYCLES").ok().and_then(|v| v.parse().ok());

        let starting_balance = env::var("STARTING_BALANCE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10.0);

        let public_url = env::var("PUBLIC_URL").ok().filter(|s| !s.is_empty());

        let cycle_interval_seconds = env::var("CYCLE_INTERVAL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            contest_api_key,
            advisory_api_key,
            database_path,
            port,
            max_cycles,
            starting_balance,
            public_url,
            cycle_interval_seconds,
            error_pause_seconds: 30,
            startup_delay_seconds: 2,
            project: ProjectIdentity::default(),
        })
    }

    /// Public URL the dashboard is reachable at. Explicit `PUBLIC_URL` wins,
    /// else a sandboxed dev-container URL is derived from `CODESPACE_NAME`,
    /// else localhost.
    pub fn live_link(&self) -> String {
        if let Some(url) = &self.public_url {
            return url.clone();
        }
        if let Ok(name) = env::var("CODESPACE_NAME") {
            if !name.is_empty() {
                return format!("https://{}-{}.app.github.dev/", name, self.port);
            }
        }
        format!("http://localhost:{}/dashboard", self.port)
    }

    /// Check if contest API calls are enabled
    pub fn contest_enabled(&self) -> bool {
        self.contest_api_key.is_some()
    }
}

/// Contest platform API endpoints
pub struct ContestApi;

impl ContestApi {
    pub const BASE_URL: &'static str = "https://agents.colosseum.com/api";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_link_prefers_explicit_url() {
        let mut config = Config {
            contest_api_key: None,
            advisory_api_key: None,
            database_path: "test.db".to_string(),
            port: 4000,
            max_cycles: None,
            starting_balance: 10.0,
            public_url: Some("https://example.org/".to_string()),
            cycle_interval_seconds: 60,
            error_pause_seconds: 30,
            startup_delay_seconds: 2,
            project: ProjectIdentity::default(),
        };
        assert_eq!(config.live_link(), "https://example.org/");

        config.public_url = None;
        std::env::remove_var("CODESPACE_NAME");
        assert_eq!(config.live_link(), "http://localhost:4000/dashboard");
    }
}
