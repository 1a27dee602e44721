//! Contest platform API client
//!
//! Thin bearer-authenticated wrapper over the remote contest service:
//! project CRUD and submit, agent status, polls, forum posts/comments,
//! and peer-project votes.
//!
//! Two policies shape every operation:
//! - No credential configured: the call is skipped outright and reported
//!   as `CallOutcome::Skipped`. The bot stays fully functional locally.
//! - Remote failure: classified into a `ContestError` and reported as
//!   `CallOutcome::Failed`. Errors never propagate past the caller, so a
//!   bad cycle step cannot abort the loop.

use crate::config::{Config, ContestApi};
use crate::services::ContestError;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Result of a single contest API call
#[derive(Debug)]
pub enum CallOutcome<T> {
    /// The call completed and the payload decoded
    Success(T),
    /// The call was never attempted (no credential configured)
    Skipped(&'static str),
    /// The call was attempted and failed; classified for policy decisions
    Failed(ContestError),
}

impl<T> CallOutcome<T> {
    /// Payload if the call succeeded
    pub fn success(self) -> Option<T> {
        match self {
            CallOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CallOutcome::Skipped(_))
    }

    /// Convert to a hard result for one-shot workflows where a skipped
    /// call is a failure (the push-update script exits non-zero without a key)
    pub fn into_result(self) -> Result<T, ContestError> {
        match self {
            CallOutcome::Success(value) => Ok(value),
            CallOutcome::Skipped(reason) => Err(ContestError::Network(format!(
                "call skipped: {reason}"
            ))),
            CallOutcome::Failed(err) => Err(err),
        }
    }
}

/// Remote project as returned by the platform. Optional fields are
/// tolerated everywhere; the contract is owned by the third party.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteProject {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub repo_link: Option<String>,
    pub solana_integration: Option<String>,
    pub live_app_link: Option<String>,
    pub presentation_link: Option<String>,
    pub agent_name: Option<String>,
    pub agent_upvotes: Option<f64>,
    pub human_upvotes: Option<f64>,
    pub tags: Option<Vec<String>>,
}

impl RemoteProject {
    /// Combined score used for leaderboard snapshots
    pub fn score(&self) -> f64 {
        self.agent_upvotes.unwrap_or(0.0) + self.human_upvotes.unwrap_or(0.0)
    }
}

/// Payload for creating or updating the project
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPayload {
    pub name: String,
    pub description: String,
    pub repo_link: String,
    pub solana_integration: String,
    pub live_app_link: String,
    pub presentation_link: String,
    /// 1-3 tags, enforced by the platform
    pub tags: Vec<String>,
}

impl ProjectPayload {
    /// Build the payload from the configured project identity
    pub fn from_config(config: &Config) -> Self {
        let identity = &config.project;
        Self {
            name: identity.name.clone(),
            description: identity.description.clone(),
            repo_link: identity.repo_link.clone(),
            solana_integration: identity.integration.clone(),
            live_app_link: config.live_link(),
            presentation_link: identity.presentation_link.clone(),
            tags: identity.tags.iter().take(3).cloned().collect(),
        }
    }
}

/// Agent status payload from `/agents/status`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentStatus {
    pub agent: Option<AgentInfo>,
    pub hackathon: Option<Value>,
    pub engagement: Option<Engagement>,
    pub projects: Option<Counted>,
    pub votes: Option<Counted>,
    pub has_active_poll: bool,
    pub claim_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentInfo {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Engagement {
    pub score: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Counted {
    pub count: i64,
}

/// An active community poll
#[derive(Debug, Clone, Deserialize)]
pub struct Poll {
    pub id: i64,
    #[serde(default)]
    pub question: Option<String>,
}

/// A created forum post
#[derive(Debug, Clone, Deserialize)]
pub struct ForumPost {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

/// A created forum comment
#[derive(Debug, Clone, Deserialize)]
pub struct ForumComment {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ProjectEnvelope {
    #[serde(default)]
    project: Option<RemoteProject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectListEnvelope {
    projects: Vec<RemoteProject>,
}

#[derive(Debug, Deserialize)]
struct PollEnvelope {
    #[serde(default)]
    poll: Option<Poll>,
}

#[derive(Debug, Deserialize)]
struct PostEnvelope {
    post: ForumPost,
}

#[derive(Debug, Deserialize)]
struct CommentEnvelope {
    comment: ForumComment,
}

/// Contest API client
#[derive(Clone)]
pub struct ContestClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ContestClient {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: ContestApi::BASE_URL.to_string(),
            api_key: config.contest_api_key.clone(),
        }
    }

    /// Override the base URL (tests)
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    fn authed(&self, method: Method, path: &str) -> Option<RequestBuilder> {
        let key = self.api_key.as_ref()?;
        let url = format!("{}{}", self.base_url, path);
        Some(self.client.request(method, url).bearer_auth(key))
    }

    /// Execute a request and decode the JSON payload, classifying failures
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> CallOutcome<T> {
        let Some(mut request) = self.authed(method, path) else {
            debug!("Contest call {} skipped: no COLOSSEUM_API_KEY", path);
            return CallOutcome::Skipped("no contest API credential configured");
        };

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ContestError::from_network_error(&e);
                warn!("Contest call {} failed: {}", path, err);
                return CallOutcome::Failed(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ContestError::from_response(status.as_u16(), &body);
            warn!("Contest call {} failed: {}", path, err);
            return CallOutcome::Failed(err);
        }

        match response.json::<T>().await {
            Ok(payload) => CallOutcome::Success(payload),
            Err(e) => {
                let err = ContestError::Malformed(e.to_string());
                warn!("Contest call {} returned bad payload: {}", path, err);
                CallOutcome::Failed(err)
            }
        }
    }

    // ==================== PROJECT ====================

    /// Fetch our own project, if one exists
    pub async fn fetch_own_project(&self) -> CallOutcome<Option<RemoteProject>> {
        match self
            .execute::<ProjectEnvelope>(Method::GET, "/my-project", None)
            .await
        {
            CallOutcome::Success(envelope) => CallOutcome::Success(envelope.project),
            // A 404 means "no project yet", which is a valid answer here
            CallOutcome::Failed(ContestError::NotFound) => CallOutcome::Success(None),
            CallOutcome::Failed(err) => CallOutcome::Failed(err),
            CallOutcome::Skipped(reason) => CallOutcome::Skipped(reason),
        }
    }

    pub async fn create_project(&self, payload: &ProjectPayload) -> CallOutcome<RemoteProject> {
        let body = serde_json::to_value(payload).unwrap_or_default();
        match self
            .execute::<ProjectEnvelope>(Method::POST, "/my-project", Some(&body))
            .await
        {
            CallOutcome::Success(envelope) => match envelope.project {
                Some(project) => CallOutcome::Success(project),
                None => CallOutcome::Failed(ContestError::Malformed(
                    "create response missing project".to_string(),
                )),
            },
            CallOutcome::Failed(err) => CallOutcome::Failed(err),
            CallOutcome::Skipped(reason) => CallOutcome::Skipped(reason),
        }
    }

    pub async fn update_project(&self, payload: &ProjectPayload) -> CallOutcome<RemoteProject> {
        let body = serde_json::to_value(payload).unwrap_or_default();
        match self
            .execute::<ProjectEnvelope>(Method::PUT, "/my-project", Some(&body))
            .await
        {
            CallOutcome::Success(envelope) => {
                CallOutcome::Success(envelope.project.unwrap_or_default())
            }
            CallOutcome::Failed(err) => CallOutcome::Failed(err),
            CallOutcome::Skipped(reason) => CallOutcome::Skipped(reason),
        }
    }

    pub async fn submit_project(&self) -> CallOutcome<RemoteProject> {
        let body = serde_json::json!({});
        match self
            .execute::<ProjectEnvelope>(Method::POST, "/my-project/submit", Some(&body))
            .await
        {
            CallOutcome::Success(envelope) => {
                CallOutcome::Success(envelope.project.unwrap_or_default())
            }
            CallOutcome::Failed(err) => CallOutcome::Failed(err),
            CallOutcome::Skipped(reason) => CallOutcome::Skipped(reason),
        }
    }

    /// List projects sorted by score (the simulated leaderboard)
    pub async fn list_projects(&self, limit: usize) -> CallOutcome<Vec<RemoteProject>> {
        let path = format!("/projects?sort=score&limit={limit}");
        match self
            .execute::<ProjectListEnvelope>(Method::GET, &path, None)
            .await
        {
            CallOutcome::Success(envelope) => CallOutcome::Success(envelope.projects),
            CallOutcome::Failed(err) => CallOutcome::Failed(err),
            CallOutcome::Skipped(reason) => CallOutcome::Skipped(reason),
        }
    }

    pub async fn vote_on_project(&self, project_id: i64, value: i64) -> CallOutcome<Value> {
        let body = serde_json::json!({ "value": value });
        self.execute(
            Method::POST,
            &format!("/projects/{project_id}/vote"),
            Some(&body),
        )
        .await
    }

    // ==================== AGENT ====================

    pub async fn fetch_agent_status(&self) -> CallOutcome<AgentStatus> {
        self.execute(Method::GET, "/agents/status", None).await
    }

    pub async fn fetch_active_poll(&self) -> CallOutcome<Option<Poll>> {
        match self
            .execute::<PollEnvelope>(Method::GET, "/agents/polls/active", None)
            .await
        {
            CallOutcome::Success(envelope) => CallOutcome::Success(envelope.poll),
            CallOutcome::Failed(ContestError::NotFound) => CallOutcome::Success(None),
            CallOutcome::Failed(err) => CallOutcome::Failed(err),
            CallOutcome::Skipped(reason) => CallOutcome::Skipped(reason),
        }
    }

    pub async fn respond_to_poll(&self, poll_id: i64, choice: &str) -> CallOutcome<Value> {
        let body = serde_json::json!({ "response": choice });
        self.execute(
            Method::POST,
            &format!("/agents/polls/{poll_id}/response"),
            Some(&body),
        )
        .await
    }

    // ==================== FORUM ====================

    pub async fn create_forum_post(&self, title: &str, body: &str) -> CallOutcome<ForumPost> {
        let payload = serde_json::json!({ "title": title, "body": body });
        match self
            .execute::<PostEnvelope>(Method::POST, "/forum/posts", Some(&payload))
            .await
        {
            CallOutcome::Success(envelope) => CallOutcome::Success(envelope.post),
            CallOutcome::Failed(err) => CallOutcome::Failed(err),
            CallOutcome::Skipped(reason) => CallOutcome::Skipped(reason),
        }
    }

    pub async fn comment_on_post(&self, post_id: i64, body: &str) -> CallOutcome<ForumComment> {
        let payload = serde_json::json!({ "body": body });
        match self
            .execute::<CommentEnvelope>(
                Method::POST,
                &format!("/forum/posts/{post_id}/comments"),
                Some(&payload),
            )
            .await
        {
            CallOutcome::Success(envelope) => CallOutcome::Success(envelope.comment),
            CallOutcome::Failed(err) => CallOutcome::Failed(err),
            CallOutcome::Skipped(reason) => CallOutcome::Skipped(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectIdentity;

    fn config_without_key() -> Config {
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

    /// With no credential, no HTTP call is ever attempted: the bogus base
    /// URL would fail loudly if a request went out.
    #[tokio::test]
    async fn test_missing_credential_skips_every_operation() {
        let client =
            ContestClient::new(&config_without_key()).with_base_url("http://127.0.0.1:1/api");

        assert!(client.fetch_own_project().await.is_skipped());
        assert!(client.fetch_agent_status().await.is_skipped());
        assert!(client.fetch_active_poll().await.is_skipped());
        assert!(client.list_projects(10).await.is_skipped());
        assert!(client.vote_on_project(1, 1).await.is_skipped());
        assert!(client.respond_to_poll(1, "yes").await.is_skipped());
        assert!(client.create_forum_post("t", "b").await.is_skipped());
        assert!(client.comment_on_post(1, "b").await.is_skipped());
    }

    #[test]
    fn test_remote_project_tolerates_missing_fields() {
        let project: RemoteProject = serde_json::from_str(r#"{"name":"Alpha"}"#).unwrap();
        assert_eq!(project.name.as_deref(), Some("Alpha"));
        assert_eq!(project.score(), 0.0);

        let project: RemoteProject =
            serde_json::from_str(r#"{"agentUpvotes": 3, "humanUpvotes": 2.5}"#).unwrap();
        assert_eq!(project.score(), 5.5);
    }

    #[test]
    fn test_agent_status_tolerates_sparse_payload() {
        let status: AgentStatus = serde_json::from_str(r#"{"hasActivePoll": true}"#).unwrap();
        assert!(status.has_active_poll);
        assert!(status.agent.is_none());

        let status: AgentStatus = serde_json::from_str("{}").unwrap();
        assert!(!status.has_active_poll);
    }

    #[test]
    fn test_skipped_into_result_is_error() {
        let outcome: CallOutcome<()> = CallOutcome::Skipped("no key");
        assert!(outcome.into_result().is_err());
    }
}
