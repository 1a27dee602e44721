//! SQLite database for trades, project snapshots, and contest activity
//!
//! The orchestrator is the sole writer; the dashboard API only reads.
//! All tables are append-mostly: trades, leaderboard snapshots, forum
//! activity, agent status, and peer votes are never updated in place.

use crate::types::{
    AgentStatusSnapshot, ForumActivity, ForumActivityKind, LeaderboardRow, PeerVote,
    ProjectSnapshot, Trade, TradeStats,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;

/// Database connection pool
pub struct Database {
    pool: SqlitePool,
}

/// Fields persisted when the remote project is created or updated
#[derive(Debug, Clone)]
pub struct ProjectUpsert<'a> {
    pub name: &'a str,
    pub phase: &'a str,
    pub description: &'a str,
    pub repo_link: &'a str,
    pub integration: &'a str,
    pub demo_link: &'a str,
    pub presentation_link: &'a str,
    pub tags: &'a str,
    pub project_id: Option<i64>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.initialize().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                strategy TEXT NOT NULL,
                amount REAL NOT NULL,
                pnl REAL NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                phase TEXT NOT NULL DEFAULT 'draft',
                description TEXT,
                repo_link TEXT,
                integration TEXT,
                demo_link TEXT,
                presentation_link TEXT,
                tags TEXT,
                project_id INTEGER,
                tweet_url TEXT,
                submitted_at TEXT,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leaderboard (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rank INTEGER NOT NULL,
                project_name TEXT NOT NULL,
                score REAL NOT NULL,
                author TEXT,
                status TEXT,
                tags TEXT,
                fetched_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS forum_activity (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                post_id INTEGER,
                comment_id INTEGER,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS agent_status (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_id INTEGER,
                name TEXT,
                status TEXT,
                engagement_score REAL NOT NULL DEFAULT 0,
                projects_count INTEGER NOT NULL DEFAULT 0,
                votes_count INTEGER NOT NULL DEFAULT 0,
                fetched_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS peer_votes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL,
                project_name TEXT NOT NULL,
                value INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_trades_timestamp ON trades(timestamp)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_leaderboard_fetched ON leaderboard(fetched_at)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_forum_post ON forum_activity(post_id)")
            .execute(&self.pool)
            .await?;

        info!("Database initialized");
        Ok(())
    }

    // ==================== TRADES ====================

    /// Record a simulated trade
    pub async fn insert_trade(&self, strategy: &str, amount: f64, pnl: f64) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO trades (strategy, amount, pnl, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(strategy)
        .bind(amount)
        .bind(pnl)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent trades, newest first
    pub async fn recent_trades(&self, limit: i64) -> Result<Vec<Trade>> {
        let rows = sqlx::query("SELECT * FROM trades ORDER BY timestamp DESC, id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().filter_map(|r| row_to_trade(r).ok()).collect())
    }

    /// Every trade in chronological order, for the cumulative P&L series
    pub async fn all_trades_ascending(&self) -> Result<Vec<Trade>> {
        let rows = sqlx::query("SELECT * FROM trades ORDER BY timestamp ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().filter_map(|r| row_to_trade(r).ok()).collect())
    }

    /// Aggregate stats over all trades. Zero-pnl trades count in neither
    /// the win nor the loss bucket.
    pub async fn trade_stats(&self) -> Result<TradeStats> {
        let row: (i64, i64, i64, f64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) as total,
                COALESCE(SUM(CASE WHEN pnl > 0 THEN 1 ELSE 0 END), 0) as wins,
                COALESCE(SUM(CASE WHEN pnl < 0 THEN 1 ELSE 0 END), 0) as losses,
                COALESCE(SUM(pnl), 0) as total_pnl
            FROM trades
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TradeStats {
            total_trades: row.0,
            winning_trades: row.1,
            losing_trades: row.2,
            total_pnl: row.3,
        })
    }

    // ==================== PROJECTS ====================

    /// Upsert the project snapshot by name (last-write-wins)
    pub async fn upsert_project(&self, upsert: &ProjectUpsert<'_>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO projects (name, phase, description, repo_link, integration,
                demo_link, presentation_link, tags, project_id, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                phase = excluded.phase,
                description = excluded.description,
                repo_link = excluded.repo_link,
                integration = excluded.integration,
                demo_link = excluded.demo_link,
                presentation_link = excluded.presentation_link,
                tags = excluded.tags,
                project_id = COALESCE(excluded.project_id, projects.project_id),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(upsert.name)
        .bind(upsert.phase)
        .bind(upsert.description)
        .bind(upsert.repo_link)
        .bind(upsert.integration)
        .bind(upsert.demo_link)
        .bind(upsert.presentation_link)
        .bind(upsert.tags)
        .bind(upsert.project_id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark the project submitted
    pub async fn mark_submitted(&self, name: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE projects SET phase = 'submitted', submitted_at = ?, updated_at = ? WHERE name = ?",
        )
        .bind(&now)
        .bind(&now)
        .bind(name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record the placeholder social-post URL on the project row
    pub async fn set_tweet_url(&self, name: &str, url: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE projects SET tweet_url = ?, updated_at = ? WHERE name = ?")
            .bind(url)
            .bind(now)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Get a project snapshot by name
    pub async fn get_project(&self, name: &str) -> Result<Option<ProjectSnapshot>> {
        let row = sqlx::query("SELECT * FROM projects WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_project(&r)?)),
            None => Ok(None),
        }
    }

    /// All project snapshots, most recently updated first
    pub async fn list_projects(&self) -> Result<Vec<ProjectSnapshot>> {
        let rows = sqlx::query("SELECT * FROM projects ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().filter_map(|r| row_to_project(r).ok()).collect())
    }

    // ==================== LEADERBOARD ====================

    /// Insert a full leaderboard snapshot (no upsert; history is kept)
    pub async fn insert_leaderboard_snapshot(
        &self,
        rows: &[(i64, String, f64, Option<String>, Option<String>, Option<String>)],
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        for (rank, name, score, author, status, tags) in rows {
            sqlx::query(
                r#"
                INSERT INTO leaderboard (rank, project_name, score, author, status, tags, fetched_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(rank)
            .bind(name)
            .bind(score)
            .bind(author)
            .bind(status)
            .bind(tags)
            .bind(&now)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Rows from the most recent leaderboard fetch only
    pub async fn latest_leaderboard(&self) -> Result<Vec<LeaderboardRow>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM leaderboard
            WHERE fetched_at = (SELECT MAX(fetched_at) FROM leaderboard)
            ORDER BY rank ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .filter_map(|r| row_to_leaderboard(r).ok())
            .collect())
    }

    // ==================== FORUM ====================

    /// Record a forum post or comment made by the bot
    pub async fn insert_forum_activity(
        &self,
        kind: ForumActivityKind,
        post_id: Option<i64>,
        comment_id: Option<i64>,
        content: &str,
    ) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO forum_activity (type, post_id, comment_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(kind.as_str())
        .bind(post_id)
        .bind(comment_id)
        .bind(content)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Recent forum activity, newest first
    pub async fn forum_feed(&self, limit: i64) -> Result<Vec<ForumActivity>> {
        let rows =
            sqlx::query("SELECT * FROM forum_activity ORDER BY created_at DESC, id DESC LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.iter().filter_map(|r| row_to_forum(r).ok()).collect())
    }

    // ==================== AGENT STATUS ====================

    /// Append an agent status snapshot
    pub async fn insert_agent_status(
        &self,
        agent_id: Option<i64>,
        name: Option<&str>,
        status: Option<&str>,
        engagement_score: f64,
        projects_count: i64,
        votes_count: i64,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO agent_status (agent_id, name, status, engagement_score, projects_count, votes_count, fetched_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(agent_id)
        .bind(name)
        .bind(status)
        .bind(engagement_score)
        .bind(projects_count)
        .bind(votes_count)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The current agent status is the most recent snapshot
    pub async fn latest_agent_status(&self) -> Result<Option<AgentStatusSnapshot>> {
        let row = sqlx::query("SELECT * FROM agent_status ORDER BY fetched_at DESC, id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_status(&r)?)),
            None => Ok(None),
        }
    }

    // ==================== PEER VOTES ====================

    /// Record a vote cast on a peer project
    pub async fn insert_peer_vote(
        &self,
        project_id: i64,
        project_name: &str,
        value: i64,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO peer_votes (project_id, project_name, value, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(project_name)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Votes cast on peer projects, newest first
    pub async fn peer_votes(&self, limit: i64) -> Result<Vec<PeerVote>> {
        let rows = sqlx::query("SELECT * FROM peer_votes ORDER BY created_at DESC, id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().filter_map(|r| row_to_vote(r).ok()).collect())
    }
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn row_to_trade(r: &sqlx::sqlite::SqliteRow) -> Result<Trade> {
    let ts: String = r.get("timestamp");
    Ok(Trade {
        id: r.get("id"),
        strategy: r.get("strategy"),
        amount: r.get("amount"),
        pnl: r.get("pnl"),
        timestamp: parse_ts(&ts)?,
    })
}

fn row_to_project(r: &sqlx::sqlite::SqliteRow) -> Result<ProjectSnapshot> {
    let updated: String = r.get("updated_at");
    let submitted: Option<String> = r.get("submitted_at");
    Ok(ProjectSnapshot {
        name: r.get("name"),
        phase: r.get("phase"),
        description: r.get("description"),
        repo_link: r.get("repo_link"),
        integration: r.get("integration"),
        demo_link: r.get("demo_link"),
        presentation_link: r.get("presentation_link"),
        tags: r.get("tags"),
        project_id: r.get("project_id"),
        tweet_url: r.get("tweet_url"),
        submitted_at: submitted.as_deref().and_then(|s| parse_ts(s).ok()),
        updated_at: parse_ts(&updated)?,
    })
}

fn row_to_leaderboard(r: &sqlx::sqlite::SqliteRow) -> Result<LeaderboardRow> {
    let fetched: String = r.get("fetched_at");
    Ok(LeaderboardRow {
        rank: r.get("rank"),
        project_name: r.get("project_name"),
        score: r.get("score"),
        author: r.get("author"),
        status: r.get("status"),
        tags: r.get("tags"),
        fetched_at: parse_ts(&fetched)?,
    })
}

fn row_to_forum(r: &sqlx::sqlite::SqliteRow) -> Result<ForumActivity> {
    let created: String = r.get("created_at");
    Ok(ForumActivity {
        id: r.get("id"),
        kind: r.get("type"),
        post_id: r.get("post_id"),
        comment_id: r.get("comment_id"),
        content: r.get("content"),
        created_at: parse_ts(&created)?,
    })
}

fn row_to_status(r: &sqlx::sqlite::SqliteRow) -> Result<AgentStatusSnapshot> {
    let fetched: String = r.get("fetched_at");
    Ok(AgentStatusSnapshot {
        id: r.get("id"),
        agent_id: r.get("agent_id"),
        name: r.get("name"),
        status: r.get("status"),
        engagement_score: r.get("engagement_score"),
        projects_count: r.get("projects_count"),
        votes_count: r.get("votes_count"),
        fetched_at: parse_ts(&fetched)?,
    })
}

fn row_to_vote(r: &sqlx::sqlite::SqliteRow) -> Result<PeerVote> {
    let created: String = r.get("created_at");
    Ok(PeerVote {
        id: r.get("id"),
        project_id: r.get("project_id"),
        project_name: r.get("project_name"),
        value: r.get("value"),
        created_at: parse_ts(&created)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_trade_stats_buckets() {
        let db = test_db().await;
        db.insert_trade("arbitrage", 0.05, 0.0004).await.unwrap();
        db.insert_trade("liquidity", 0.10, -0.0007).await.unwrap();
        db.insert_trade("trend", 0.05, 0.0).await.unwrap();

        let stats = db.trade_stats().await.unwrap();
        assert_eq!(stats.total_trades, 3);
        assert_eq!(stats.winning_trades, 1);
        assert_eq!(stats.losing_trades, 1);
        // zero-pnl trade counted in neither bucket
        assert!(stats.winning_trades + stats.losing_trades < stats.total_trades);
        assert!((stats.total_pnl - (-0.0003)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_project_upsert_by_name() {
        let db = test_db().await;
        let base = ProjectUpsert {
            name: "HeliosSynerga",
            phase: "draft",
            description: "v1",
            repo_link: "https://example.org/repo",
            integration: "none",
            demo_link: "http://localhost:4000/dashboard",
            presentation_link: "https://example.org/readme",
            tags: "defi,ai,trading",
            project_id: Some(42),
        };
        db.upsert_project(&base).await.unwrap();
        db.upsert_project(&ProjectUpsert {
            description: "v2",
            project_id: None,
            ..base.clone()
        })
        .await
        .unwrap();

        let projects = db.list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].description.as_deref(), Some("v2"));
        // a later upsert without the remote id keeps the stored one
        assert_eq!(projects[0].project_id, Some(42));
    }

    #[tokio::test]
    async fn test_mark_submitted() {
        let db = test_db().await;
        db.upsert_project(&ProjectUpsert {
            name: "HeliosSynerga",
            phase: "draft",
            description: "d",
            repo_link: "r",
            integration: "i",
            demo_link: "l",
            presentation_link: "p",
            tags: "ai",
            project_id: None,
        })
        .await
        .unwrap();

        db.mark_submitted("HeliosSynerga").await.unwrap();
        let project = db.get_project("HeliosSynerga").await.unwrap().unwrap();
        assert_eq!(project.phase, "submitted");
        assert!(project.submitted_at.is_some());
    }

    #[tokio::test]
    async fn test_latest_leaderboard_filters_old_snapshots() {
        let db = test_db().await;
        db.insert_leaderboard_snapshot(&[(1, "Alpha".to_string(), 10.0, None, None, None)])
            .await
            .unwrap();
        // Snapshots share a fetched_at per call, so a later call supersedes
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        db.insert_leaderboard_snapshot(&[
            (1, "Beta".to_string(), 12.0, None, None, None),
            (2, "Alpha".to_string(), 10.0, None, None, None),
        ])
        .await
        .unwrap();

        let latest = db.latest_leaderboard().await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].project_name, "Beta");
    }

    #[tokio::test]
    async fn test_latest_agent_status() {
        let db = test_db().await;
        assert!(db.latest_agent_status().await.unwrap().is_none());

        db.insert_agent_status(Some(7), Some("HeliosSynerga"), Some("active"), 1.5, 1, 0)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        db.insert_agent_status(Some(7), Some("HeliosSynerga"), Some("active"), 2.5, 1, 3)
            .await
            .unwrap();

        let latest = db.latest_agent_status().await.unwrap().unwrap();
        assert_eq!(latest.votes_count, 3);
    }

    #[tokio::test]
    async fn test_forum_feed_order() {
        let db = test_db().await;
        let post_id = db
            .insert_forum_activity(ForumActivityKind::Post, Some(100), None, "hello")
            .await
            .unwrap();
        assert!(post_id > 0);
        db.insert_forum_activity(ForumActivityKind::Comment, Some(100), Some(5), "follow-up")
            .await
            .unwrap();

        let feed = db.forum_feed(10).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].kind, "comment");
        assert_eq!(feed[0].post_id, Some(100));
    }
}
