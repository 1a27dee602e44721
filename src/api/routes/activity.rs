//! Merged activity feed across the bot's stores

use crate::api::routes::{internal_error, ErrorResponse};
use crate::api::server::AppState;
use crate::types::{AgentStatusSnapshot, ForumActivity, LeaderboardRow, Trade};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: usize = 50;

/// One entry of the merged feed
#[derive(Debug, Clone, Serialize)]
pub struct ActivityItem {
    pub kind: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

/// Merge trades, forum actions, the latest status refresh, and the latest
/// leaderboard fetch into one feed, newest first, truncated.
pub fn merge_activity(
    trades: &[Trade],
    forum: &[ForumActivity],
    status: Option<&AgentStatusSnapshot>,
    leaderboard: &[LeaderboardRow],
    limit: usize,
) -> Vec<ActivityItem> {
    let mut items: Vec<ActivityItem> = Vec::with_capacity(trades.len() + forum.len() + 2);

    for t in trades {
        items.push(ActivityItem {
            kind: "trade".to_string(),
            summary: format!(
                "{} trade of {} SOL, pnl {:+.6}",
                t.strategy, t.amount, t.pnl
            ),
            timestamp: t.timestamp,
        });
    }

    for f in forum {
        let verb = match f.kind.as_str() {
            "comment" => "Commented",
            _ => "Posted",
        };
        items.push(ActivityItem {
            kind: format!("forum_{}", f.kind),
            summary: format!("{}: {}", verb, truncate(&f.content, 120)),
            timestamp: f.created_at,
        });
    }

    if let Some(s) = status {
        items.push(ActivityItem {
            kind: "status".to_string(),
            summary: format!(
                "Agent status refreshed: {} (engagement {:.1})",
                s.status.as_deref().unwrap_or("?"),
                s.engagement_score
            ),
            timestamp: s.fetched_at,
        });
    }

    if let Some(top) = leaderboard.first() {
        items.push(ActivityItem {
            kind: "leaderboard".to_string(),
            summary: format!(
                "Leaderboard snapshot: {} entries, #1 {} ({:.1})",
                leaderboard.len(),
                top.project_name,
                top.score
            ),
            timestamp: top.fetched_at,
        });
    }

    items.sort_by_key(|i| std::cmp::Reverse(i.timestamp));
    items.truncate(limit);
    items
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{head}…")
    }
}

/// Recent bot activity: trades, forum actions, status and leaderboard refreshes
pub async fn activity_feed(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityItem>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let trades = state
        .db
        .recent_trades(limit as i64)
        .await
        .map_err(internal_error)?;
    let forum = state
        .db
        .forum_feed(limit as i64)
        .await
        .map_err(internal_error)?;
    let status = state
        .db
        .latest_agent_status()
        .await
        .map_err(internal_error)?;
    let leaderboard = state
        .db
        .latest_leaderboard()
        .await
        .map_err(internal_error)?;

    Ok(Json(merge_activity(
        &trades,
        &forum,
        status.as_ref(),
        &leaderboard,
        limit,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_merge_sorts_newest_first_and_truncates() {
        let trades = vec![
            Trade {
                id: 1,
                strategy: "trend".to_string(),
                amount: 0.05,
                pnl: 0.0002,
                timestamp: at(10),
            },
            Trade {
                id: 2,
                strategy: "arbitrage".to_string(),
                amount: 0.05,
                pnl: -0.0001,
                timestamp: at(30),
            },
        ];
        let forum = vec![ForumActivity {
            id: 1,
            kind: "post".to_string(),
            post_id: Some(7),
            comment_id: None,
            content: "Cycle update".to_string(),
            created_at: at(20),
        }];

        let feed = merge_activity(&trades, &forum, None, &[], 2);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].kind, "trade");
        assert_eq!(feed[1].kind, "forum_post");
        assert!(feed[0].timestamp > feed[1].timestamp);
    }

    #[test]
    fn test_merge_includes_status_and_leaderboard() {
        let status = AgentStatusSnapshot {
            id: 1,
            agent_id: Some(7),
            name: Some("HeliosSynerga".to_string()),
            status: Some("active".to_string()),
            engagement_score: 2.5,
            projects_count: 1,
            votes_count: 3,
            fetched_at: at(40),
        };
        let leaderboard = vec![LeaderboardRow {
            rank: 1,
            project_name: "Alpha".to_string(),
            score: 12.0,
            author: None,
            status: None,
            tags: None,
            fetched_at: at(50),
        }];

        let feed = merge_activity(&[], &[], Some(&status), &leaderboard, 10);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].kind, "leaderboard");
        assert_eq!(feed[1].kind, "status");
    }

    #[test]
    fn test_truncate_long_content() {
        let long = "x".repeat(300);
        let short = truncate(&long, 120);
        assert_eq!(short.chars().count(), 121);
        assert!(short.ends_with('…'));
    }
}
