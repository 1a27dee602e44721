//! Core types for the Colosseum hackathon bot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading strategy tag for simulated trades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Arbitrage,
    Liquidity,
    Trend,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Arbitrage, Strategy::Liquidity, Strategy::Trend];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Arbitrage => "arbitrage",
            Strategy::Liquidity => "liquidity",
            Strategy::Trend => "trend",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Strategy> {
        match s.to_lowercase().as_str() {
            "arbitrage" => Some(Strategy::Arbitrage),
            "liquidity" => Some(Strategy::Liquidity),
            "trend" | "trend-following" => Some(Strategy::Trend),
            _ => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A simulated trade record. Created once, never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub strategy: String,
    pub amount: f64,
    pub pnl: f64,
    pub timestamp: DateTime<Utc>,
}

/// Local snapshot of the competition project. One logical row per name,
/// updated via upsert-by-name with last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub name: String,
    pub phase: String,
    pub description: Option<String>,
    pub repo_link: Option<String>,
    pub integration: Option<String>,
    pub demo_link: Option<String>,
    pub presentation_link: Option<String>,
    pub tags: Option<String>,
    pub project_id: Option<i64>,
    pub tweet_url: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// One leaderboard row. A full snapshot is re-inserted on every fetch;
/// consumers filter by the most recent `fetched_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: i64,
    pub project_name: String,
    pub score: f64,
    pub author: Option<String>,
    pub status: Option<String>,
    pub tags: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Forum activity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForumActivityKind {
    Post,
    Comment,
}

impl ForumActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForumActivityKind::Post => "post",
            ForumActivityKind::Comment => "comment",
        }
    }
}

/// Append-only audit row for the bot's own forum actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumActivity {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only snapshot of the remote agent status. The current status is
/// the most recent row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatusSnapshot {
    pub id: i64,
    pub agent_id: Option<i64>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub engagement_score: f64,
    pub projects_count: i64,
    pub votes_count: i64,
    pub fetched_at: DateTime<Utc>,
}

/// Audit row for a vote cast on a peer project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerVote {
    pub id: i64,
    pub project_id: i64,
    pub project_name: String,
    pub value: i64,
    pub created_at: DateTime<Utc>,
}

/// Aggregate trade statistics. Zero-PnL trades count as neither win nor loss.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TradeStats {
    pub total_trades: i64,
    pub winning_trades: i64,
    pub losing_trades: i64,
    pub total_pnl: f64,
}

impl TradeStats {
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            return 0.0;
        }
        (self.winning_trades as f64 / self.total_trades as f64) * 100.0
    }
}

/// The advisory client's structured suggestion. Informational only; the
/// orchestrator logs it but does not apply it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    #[serde(default)]
    pub next_trade: NextTrade,
    #[serde(default)]
    pub project_phase: Option<String>,
    #[serde(default, alias = "twitterMessage", alias = "announcementText")]
    pub announcement: Option<String>,
    #[serde(default)]
    pub reasoning: String,
}

/// Suggested next trade inside an advisory decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextTrade {
    pub strategy: String,
    pub amount: f64,
}

impl Default for NextTrade {
    fn default() -> Self {
        Self {
            strategy: Strategy::Trend.as_str().to_string(),
            amount: 0.05,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_rate() {
        let stats = TradeStats {
            total_trades: 8,
            winning_trades: 5,
            losing_trades: 2,
            total_pnl: 0.12,
        };
        assert_eq!(stats.win_rate(), 62.5);
        // one zero-pnl trade sits in neither bucket
        assert!(stats.winning_trades + stats.losing_trades <= stats.total_trades);
    }

    #[test]
    fn test_win_rate_empty() {
        assert_eq!(TradeStats::default().win_rate(), 0.0);
    }

    #[test]
    fn test_strategy_round_trip() {
        for s in Strategy::ALL {
            assert_eq!(Strategy::from_str_loose(s.as_str()), Some(s));
        }
        assert_eq!(Strategy::from_str_loose("Trend-Following"), Some(Strategy::Trend));
        assert_eq!(Strategy::from_str_loose("hodl"), None);
    }

    #[test]
    fn test_decision_parses_with_missing_fields() {
        let decision: Decision = serde_json::from_str(r#"{"reasoning":"hold"}"#).unwrap();
        assert_eq!(decision.next_trade.strategy, "trend");
        assert_eq!(decision.next_trade.amount, 0.05);
        assert!(decision.project_phase.is_none());
    }
}
