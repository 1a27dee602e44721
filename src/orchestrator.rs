//! Cycle orchestrator
//!
//! The main loop: bootstrap the project once, then run cycles forever (or
//! up to a configured maximum). Every cycle refreshes remote state, emits
//! simulated trades, consults the advisor, and fires whichever scheduled
//! engagement actions are due. Each step is independently fault-tolerant;
//! a failing step is logged and the rest of the cycle still runs. A
//! cycle-level error only extends the pause before the next cycle.
//!
//! The orchestrator is the sole writer of the database. The dashboard API
//! reads the same store concurrently and tolerates mid-cycle snapshots.

use crate::advisor::AdvisoryClient;
use crate::config::Config;
use crate::contest::{CallOutcome, ContestClient, ProjectPayload, RemoteProject};
use crate::db::{Database, ProjectUpsert};
use crate::services::load_skill_text;
use crate::trading::{execute_trade, CYCLE_TRADES};
use crate::types::ForumActivityKind;
use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Engagement actions driven by the per-cycle schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAction {
    UpdateProject,
    SubmitProject,
    ForumEngagement,
    PollCheck,
    SocialPost,
    PeerVote,
}

/// One schedule entry: the action fires on cycles that are multiples of
/// `period`, but never before `min_cycle`.
#[derive(Debug, Clone)]
pub struct ScheduledAction {
    pub action: CycleAction,
    pub period: u64,
    pub min_cycle: u64,
}

/// Explicit per-action schedule, evaluated once per cycle. Periods are
/// staggered so external-API actions don't burst in the same cycle more
/// than the periods force them to.
#[derive(Debug, Clone)]
pub struct Schedule {
    actions: Vec<ScheduledAction>,
}

impl Schedule {
    pub fn standard() -> Self {
        Self {
            actions: vec![
                ScheduledAction {
                    action: CycleAction::UpdateProject,
                    period: 3,
                    min_cycle: 0,
                },
                ScheduledAction {
                    action: CycleAction::SubmitProject,
                    period: 5,
                    min_cycle: 8,
                },
                ScheduledAction {
                    action: CycleAction::ForumEngagement,
                    period: 3,
                    min_cycle: 0,
                },
                ScheduledAction {
                    action: CycleAction::PollCheck,
                    period: 6,
                    min_cycle: 0,
                },
                ScheduledAction {
                    action: CycleAction::SocialPost,
                    period: 5,
                    min_cycle: 0,
                },
                ScheduledAction {
                    action: CycleAction::PeerVote,
                    period: 7,
                    min_cycle: 0,
                },
            ],
        }
    }

    /// Actions due on the given cycle, in schedule order
    pub fn due(&self, cycle: u64) -> Vec<CycleAction> {
        self.actions
            .iter()
            .filter(|a| cycle >= a.min_cycle && cycle % a.period == 0)
            .map(|a| a.action)
            .collect()
    }
}

/// The main autonomous loop and its collaborators. Constructed once at
/// startup from an explicit context; no global state.
pub struct Orchestrator {
    config: Config,
    db: Arc<Database>,
    contest: ContestClient,
    advisor: AdvisoryClient,
    schedule: Schedule,
}

impl Orchestrator {
    pub fn new(config: Config, db: Arc<Database>) -> Self {
        let contest = ContestClient::new(&config);
        let advisor = AdvisoryClient::new(config.advisory_api_key.clone());
        Self {
            config,
            db,
            contest,
            advisor,
            schedule: Schedule::standard(),
        }
    }

    /// Run to the configured cycle limit (or forever)
    pub async fn run(&self) -> Result<()> {
        info!("Starting autonomous loop for {}", self.config.project.name);

        self.ensure_project_exists().await?;
        tokio::time::sleep(Duration::from_secs(self.config.startup_delay_seconds)).await;

        let mut cycle: u64 = 0;
        loop {
            if let Some(max) = self.config.max_cycles {
                if cycle >= max {
                    info!("Reached {} cycles, stopping", max);
                    return Ok(());
                }
            }
            cycle += 1;

            info!("── Cycle {} ──", cycle);
            let pause = match self.run_cycle(cycle).await {
                Ok(()) => {
                    info!("Cycle {} complete", cycle);
                    Duration::from_secs(self.config.cycle_interval_seconds)
                }
                Err(e) => {
                    error!("Cycle {} error: {:#}", cycle, e);
                    Duration::from_secs(self.config.error_pause_seconds)
                }
            };

            tokio::time::sleep(pause).await;
        }
    }

    /// One cycle body. Steps run sequentially; each catches its own
    /// failures so the remaining steps still execute.
    pub async fn run_cycle(&self, cycle: u64) -> Result<()> {
        self.refresh_agent_status().await;
        self.refresh_leaderboard().await;

        for (strategy, amount) in CYCLE_TRADES {
            if let Err(e) = execute_trade(&self.db, strategy, amount).await {
                warn!("Trade simulation failed: {:#}", e);
            }
        }

        self.consult_advisor().await;

        for action in self.schedule.due(cycle) {
            match action {
                CycleAction::UpdateProject => self.push_project_update().await,
                CycleAction::SubmitProject => self.maybe_submit_project(cycle).await,
                CycleAction::ForumEngagement => self.engage_forum().await,
                CycleAction::PollCheck => self.answer_active_poll().await,
                CycleAction::SocialPost => self.simulate_social_post(cycle).await,
                CycleAction::PeerVote => self.vote_on_peer_project().await,
            }
        }

        Ok(())
    }

    /// Idempotent project bootstrap: fetch first, create only if absent,
    /// upsert the local snapshot either way.
    pub async fn ensure_project_exists(&self) -> Result<()> {
        let identity = &self.config.project;

        match self.contest.fetch_own_project().await {
            CallOutcome::Success(Some(existing)) => {
                info!(
                    "Project already exists: {}",
                    existing.name.as_deref().unwrap_or(&identity.name)
                );
                self.store_project_snapshot(&existing).await?;
            }
            CallOutcome::Success(None) => {
                match self.contest.create_project(&self.project_payload()).await {
                    CallOutcome::Success(created) => {
                        info!("Project created (draft): {}", identity.name);
                        self.store_project_snapshot(&created).await?;
                    }
                    CallOutcome::Failed(err) => {
                        warn!("Create project failed: {}", err);
                        self.store_local_draft().await?;
                    }
                    CallOutcome::Skipped(_) => unreachable!("fetch succeeded with a credential"),
                }
            }
            CallOutcome::Skipped(reason) => {
                info!("Project bootstrap skipped: {}", reason);
                self.store_local_draft().await?;
            }
            CallOutcome::Failed(err) => {
                warn!("Fetch own project failed: {}", err);
                self.store_local_draft().await?;
            }
        }

        Ok(())
    }

    fn project_payload(&self) -> ProjectPayload {
        ProjectPayload::from_config(&self.config)
    }

    async fn store_project_snapshot(&self, remote: &RemoteProject) -> Result<()> {
        let identity = &self.config.project;
        let tags = remote
            .tags
            .clone()
            .unwrap_or_else(|| identity.tags.clone())
            .join(",");
        self.db
            .upsert_project(&ProjectUpsert {
                name: remote.name.as_deref().unwrap_or(&identity.name),
                phase: remote.status.as_deref().unwrap_or("draft"),
                description: remote
                    .description
                    .as_deref()
                    .unwrap_or(&identity.description),
                repo_link: remote.repo_link.as_deref().unwrap_or(&identity.repo_link),
                integration: remote
                    .solana_integration
                    .as_deref()
                    .unwrap_or(&identity.integration),
                demo_link: &self.config.live_link(),
                presentation_link: remote
                    .presentation_link
                    .as_deref()
                    .unwrap_or(&identity.presentation_link),
                tags: &tags,
                project_id: remote.id,
            })
            .await
    }

    async fn store_local_draft(&self) -> Result<()> {
        let identity = &self.config.project;
        self.db
            .upsert_project(&ProjectUpsert {
                name: &identity.name,
                phase: "draft",
                description: &identity.description,
                repo_link: &identity.repo_link,
                integration: &identity.integration,
                demo_link: &self.config.live_link(),
                presentation_link: &identity.presentation_link,
                tags: &identity.tags.join(","),
                project_id: None,
            })
            .await
    }

    // ==================== CYCLE STEPS ====================

    async fn refresh_agent_status(&self) {
        match self.contest.fetch_agent_status().await {
            CallOutcome::Success(status) => {
                let agent = status.agent.unwrap_or_default();
                info!(
                    "Agent status: {} ({}), engagement {:.1}, poll active: {}",
                    agent.name.as_deref().unwrap_or("?"),
                    agent.status.as_deref().unwrap_or("?"),
                    status.engagement.as_ref().map(|e| e.score).unwrap_or(0.0),
                    status.has_active_poll
                );
                if let Err(e) = self
                    .db
                    .insert_agent_status(
                        agent.id,
                        agent.name.as_deref(),
                        agent.status.as_deref(),
                        status.engagement.map(|e| e.score).unwrap_or(0.0),
                        status.projects.map(|p| p.count).unwrap_or(0),
                        status.votes.map(|v| v.count).unwrap_or(0),
                    )
                    .await
                {
                    warn!("Persist agent status failed: {:#}", e);
                }
            }
            CallOutcome::Skipped(reason) => info!("Status refresh skipped: {}", reason),
            CallOutcome::Failed(err) => warn!("Status refresh failed: {}", err),
        }
    }

    async fn refresh_leaderboard(&self) {
        let projects = match self.contest.list_projects(20).await {
            CallOutcome::Success(projects) => projects,
            CallOutcome::Skipped(reason) => {
                info!("Leaderboard refresh skipped: {}", reason);
                return;
            }
            CallOutcome::Failed(err) => {
                warn!("Leaderboard refresh failed: {}", err);
                return;
            }
        };

        let rows: Vec<_> = projects
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                (
                    (idx + 1) as i64,
                    p.name.clone().unwrap_or_default(),
                    p.score(),
                    p.agent_name.clone(),
                    p.status.clone(),
                    p.tags.as_ref().map(|t| t.join(",")),
                )
            })
            .collect();

        if let Err(e) = self.db.insert_leaderboard_snapshot(&rows).await {
            warn!("Persist leaderboard failed: {:#}", e);
            return;
        }

        let own_rank = projects
            .iter()
            .position(|p| {
                p.agent_name.as_deref() == Some(&self.config.project.name)
                    || p.name.as_deref() == Some(&self.config.project.name)
            })
            .map(|idx| idx + 1);

        match own_rank {
            Some(rank) => info!(
                "Leaderboard updated | {} rank: #{}/{}",
                self.config.project.name,
                rank,
                projects.len()
            ),
            None => info!(
                "Leaderboard updated | {} not in top {}",
                self.config.project.name,
                projects.len()
            ),
        }
    }

    /// Consult the advisor. The decision is logged and nothing else: its
    /// nextTrade and projectPhase fields are deliberately not applied.
    async fn consult_advisor(&self) {
        let recent = match self.db.recent_trades(5).await {
            Ok(trades) => trades,
            Err(e) => {
                warn!("Load recent trades failed: {:#}", e);
                Vec::new()
            }
        };

        let skill_text = load_skill_text();
        let decision = self.advisor.consult(&recent, skill_text.as_deref()).await;
        info!(
            "Advisory: {} {} SOL next, phase {:?} ({})",
            decision.next_trade.strategy,
            decision.next_trade.amount,
            decision.project_phase,
            decision.reasoning
        );
    }

    async fn push_project_update(&self) {
        match self.contest.update_project(&self.project_payload()).await {
            CallOutcome::Success(updated) => {
                info!("Project metadata updated");
                if let Err(e) = self.store_project_snapshot(&updated).await {
                    warn!("Persist project update failed: {:#}", e);
                }
            }
            CallOutcome::Skipped(reason) => info!("Project update skipped: {}", reason),
            CallOutcome::Failed(err) => warn!("Project update failed: {}", err),
        }
    }

    /// Submit the project if it is still in draft, then announce.
    async fn maybe_submit_project(&self, cycle: u64) {
        let current = match self.contest.fetch_own_project().await {
            CallOutcome::Success(project) => project,
            CallOutcome::Skipped(reason) => {
                info!("Submit check skipped: {}", reason);
                return;
            }
            CallOutcome::Failed(err) => {
                warn!("Submit check failed: {}", err);
                return;
            }
        };

        let is_draft = current
            .as_ref()
            .and_then(|p| p.status.as_deref())
            .map(|s| s == "draft")
            .unwrap_or(false);
        if !is_draft {
            return;
        }

        match self.contest.submit_project().await {
            CallOutcome::Success(_) => {
                info!("PROJECT SUBMITTED FOR JUDGING");
                if let Err(e) = self.db.mark_submitted(&self.config.project.name).await {
                    warn!("Persist submission failed: {:#}", e);
                }
                self.simulate_social_post(cycle).await;
            }
            CallOutcome::Skipped(reason) => info!("Submit skipped: {}", reason),
            CallOutcome::Failed(err) => warn!("Submit failed: {}", err),
        }
    }

    /// Create a forum post and immediately comment on it
    async fn engage_forum(&self) {
        let (title, body) = forum_post_content(&self.config.project.name);

        let post = match self.contest.create_forum_post(&title, &body).await {
            CallOutcome::Success(post) => post,
            CallOutcome::Skipped(reason) => {
                info!("Forum engagement skipped: {}", reason);
                return;
            }
            CallOutcome::Failed(err) => {
                warn!("Forum post failed: {}", err);
                return;
            }
        };

        info!("Forum post created: {}", title);
        if let Err(e) = self
            .db
            .insert_forum_activity(ForumActivityKind::Post, Some(post.id), None, &title)
            .await
        {
            warn!("Persist forum post failed: {:#}", e);
        }

        let follow_up = "Following up with cycle results and open questions. \
                         Happy to compare notes on execution efficiency.";
        match self.contest.comment_on_post(post.id, follow_up).await {
            CallOutcome::Success(comment) => {
                info!("Comment posted on #{}", post.id);
                if let Err(e) = self
                    .db
                    .insert_forum_activity(
                        ForumActivityKind::Comment,
                        Some(post.id),
                        Some(comment.id),
                        follow_up,
                    )
                    .await
                {
                    warn!("Persist comment failed: {:#}", e);
                }
            }
            CallOutcome::Skipped(reason) => info!("Comment skipped: {}", reason),
            CallOutcome::Failed(err) => warn!("Comment failed: {}", err),
        }
    }

    /// Answer the active poll, if any, with a uniform random binary choice
    async fn answer_active_poll(&self) {
        let poll = match self.contest.fetch_active_poll().await {
            CallOutcome::Success(Some(poll)) => poll,
            CallOutcome::Success(None) => {
                info!("No active poll at this time");
                return;
            }
            CallOutcome::Skipped(reason) => {
                info!("Poll check skipped: {}", reason);
                return;
            }
            CallOutcome::Failed(err) => {
                warn!("Poll check failed: {}", err);
                return;
            }
        };

        let choice = if rand::thread_rng().gen_bool(0.5) {
            "yes"
        } else {
            "no"
        };
        match self.contest.respond_to_poll(poll.id, choice).await {
            CallOutcome::Success(_) => info!(
                "Poll response submitted: {} ({})",
                choice,
                poll.question.as_deref().unwrap_or("?")
            ),
            CallOutcome::Skipped(reason) => info!("Poll response skipped: {}", reason),
            CallOutcome::Failed(err) => warn!("Poll response failed: {}", err),
        }
    }

    /// No real social network is called: the announcement is logged and a
    /// placeholder URL is stored on the project row.
    async fn simulate_social_post(&self, cycle: u64) {
        let name = &self.config.project.name;
        let messages = [
            format!("{} executing cycle {} of autonomous trading. Building in public!", name, cycle),
            format!("Cycle {}: monitoring leaderboards and executing strategies autonomously.", cycle),
            format!("{} progress update: trades logged, project metadata fresh, dashboard live.", name),
        ];
        let message = &messages[(cycle as usize) % messages.len()];

        info!("[Social] {}", message);
        let placeholder = format!("https://twitter.com/search?q={}", name);
        if let Err(e) = self.db.set_tweet_url(name, &placeholder).await {
            warn!("Persist social post failed: {:#}", e);
        }
    }

    /// Vote on one random peer project (never on our own)
    async fn vote_on_peer_project(&self) {
        let projects = match self.contest.list_projects(10).await {
            CallOutcome::Success(projects) => projects,
            CallOutcome::Skipped(reason) => {
                info!("Peer vote skipped: {}", reason);
                return;
            }
            CallOutcome::Failed(err) => {
                warn!("Peer vote fetch failed: {}", err);
                return;
            }
        };

        let own_name = &self.config.project.name;
        let peers: Vec<_> = projects
            .iter()
            .filter(|p| {
                p.id.is_some()
                    && p.agent_name.as_deref() != Some(own_name)
                    && p.name.as_deref() != Some(own_name)
            })
            .collect();

        let Some(target) = peers.choose(&mut rand::thread_rng()) else {
            info!("No peer project to vote on");
            return;
        };
        let target_id = target.id.unwrap_or_default();
        let target_name = target.name.clone().unwrap_or_default();

        match self.contest.vote_on_project(target_id, 1).await {
            CallOutcome::Success(_) => {
                info!("Voted on peer project #{} ({})", target_id, target_name);
                if let Err(e) = self.db.insert_peer_vote(target_id, &target_name, 1).await {
                    warn!("Persist peer vote failed: {:#}", e);
                }
            }
            CallOutcome::Skipped(reason) => info!("Peer vote skipped: {}", reason),
            CallOutcome::Failed(err) => warn!("Peer vote failed: {}", err),
        }
    }
}

/// Randomized forum post title/body pair
fn forum_post_content(project_name: &str) -> (String, String) {
    let mut rng = rand::thread_rng();
    let strategy = *crate::types::Strategy::ALL
        .choose(&mut rng)
        .unwrap_or(&crate::types::Strategy::Trend);

    let titles = [
        format!("{} {} strategy update", project_name, strategy),
        format!("Autonomous {} deployment: tracking live signals", strategy),
        format!("Building composable autonomous trading with {}", project_name),
        format!("Real-time position management in {}", project_name),
    ];
    let title = titles
        .choose(&mut rng)
        .cloned()
        .unwrap_or_else(|| titles[0].clone());

    let body = format!(
        "{} just executed its {} strategy this cycle. Currently monitoring the \
         leaderboard and gathering feedback from the community. Open to \
         collaboration on improving execution efficiency!",
        project_name, strategy
    );

    (title, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectIdentity;

    fn offline_config() -> Config {
        Config {
            contest_api_key: None,
            advisory_api_key: None,
            database_path: "sqlite::memory:".to_string(),
            port: 4000,
            max_cycles: Some(1),
            starting_balance: 10.0,
            public_url: None,
            cycle_interval_seconds: 60,
            error_pause_seconds: 30,
            startup_delay_seconds: 0,
            project: ProjectIdentity::default(),
        }
    }

    #[test]
    fn test_schedule_poll_on_cycle_6() {
        let schedule = Schedule::standard();
        assert_eq!(schedule.due(6), vec![CycleAction::UpdateProject, CycleAction::ForumEngagement, CycleAction::PollCheck]);
    }

    #[test]
    fn test_schedule_peer_vote_on_cycle_7() {
        let schedule = Schedule::standard();
        assert_eq!(schedule.due(7), vec![CycleAction::PeerVote]);
    }

    #[test]
    fn test_schedule_cycle_15_stacks_actions() {
        let schedule = Schedule::standard();
        let due = schedule.due(15);
        assert!(due.contains(&CycleAction::UpdateProject));
        assert!(due.contains(&CycleAction::ForumEngagement));
        assert!(due.contains(&CycleAction::SocialPost));
        assert!(due.contains(&CycleAction::SubmitProject));
        assert!(!due.contains(&CycleAction::PollCheck));
        assert!(!due.contains(&CycleAction::PeerVote));
    }

    #[test]
    fn test_schedule_submit_gated_until_cycle_8() {
        let schedule = Schedule::standard();
        assert!(!schedule.due(5).contains(&CycleAction::SubmitProject));
        assert!(schedule.due(10).contains(&CycleAction::SubmitProject));
        assert!(schedule.due(15).contains(&CycleAction::SubmitProject));
    }

    #[test]
    fn test_schedule_cycle_1_fires_nothing() {
        let schedule = Schedule::standard();
        assert!(schedule.due(1).is_empty());
    }

    /// Without any contest credential a full cycle completes and makes no
    /// HTTP calls: all contest operations short-circuit to Skipped.
    #[tokio::test]
    async fn test_full_cycle_without_credentials() {
        let db = Arc::new(Database::new("sqlite::memory:").await.unwrap());
        let orchestrator = Orchestrator::new(offline_config(), db.clone());

        orchestrator.ensure_project_exists().await.unwrap();
        // cycle 6 fires update + forum + poll, all skipped
        orchestrator.run_cycle(6).await.unwrap();

        // trades were still generated locally
        let trades = db.recent_trades(10).await.unwrap();
        assert_eq!(trades.len(), 3);
        for trade in &trades {
            assert!(trade.pnl.abs() <= crate::trading::NOISE_BOUND * trade.amount + f64::EPSILON);
        }

        // the local draft row exists exactly once
        let projects = db.list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].phase, "draft");
    }

    /// Bootstrap twice: still one local row (upsert-by-name)
    #[tokio::test]
    async fn test_ensure_project_idempotent() {
        let db = Arc::new(Database::new("sqlite::memory:").await.unwrap());
        let orchestrator = Orchestrator::new(offline_config(), db.clone());

        orchestrator.ensure_project_exists().await.unwrap();
        orchestrator.ensure_project_exists().await.unwrap();

        assert_eq!(db.list_projects().await.unwrap().len(), 1);
    }
}
