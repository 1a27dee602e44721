//! AI advisory client
//!
//! One chat-completion call per cycle asking for a strict JSON decision.
//! The decision is advisory only: the orchestrator logs it but does not
//! apply it to trade generation or phase transitions.
//!
//! Two fallback paths keep this client infallible from the caller's view:
//! - no credential: a canned decision tagged "fallback mode"
//! - request or parse failure: the fixed "error fallback" decision

use crate::types::{Decision, NextTrade, Strategy, Trade};
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4-turbo-preview";

/// Advisory API client
#[derive(Clone)]
pub struct AdvisoryClient {
    client: Client,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

impl AdvisoryClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Ask the advisory model for a decision based on recent trades and
    /// the operator skill file. Never fails: degraded paths return one of
    /// the fixed fallback decisions.
    pub async fn consult(&self, recent_trades: &[Trade], skill_text: Option<&str>) -> Decision {
        let Some(api_key) = &self.api_key else {
            debug!("Advisory call skipped: no OPENAI_API_KEY, using fallback decision");
            return fallback_decision();
        };

        let prompt = build_prompt(recent_trades, skill_text);

        match self.request_decision(api_key, &prompt).await {
            Ok(decision) => {
                info!("AI decision: {}", decision.reasoning);
                decision
            }
            Err(e) => {
                warn!("Advisory call failed ({e:#}), using error fallback");
                error_fallback()
            }
        }
    }

    async fn request_decision(&self, api_key: &str, prompt: &str) -> Result<Decision> {
        let body = json!({
            "model": MODEL,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
            "response_format": { "type": "json_object" }
        });

        let response = self
            .client
            .post(COMPLETIONS_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("advisory request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("advisory API error {status}: {body}");
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("advisory response not valid JSON")?;

        parse_decision(
            &completion
                .choices
                .first()
                .map(|c| c.message.content.clone())
                .unwrap_or_default(),
        )
    }
}

/// Parse the model's JSON content into a decision
pub fn parse_decision(content: &str) -> Result<Decision> {
    serde_json::from_str(content).context("decision payload not valid JSON")
}

/// Canned decision used when no advisory credential is configured
pub fn fallback_decision() -> Decision {
    let mut rng = rand::thread_rng();
    let strategy = *Strategy::ALL.choose(&mut rng).unwrap_or(&Strategy::Trend);
    Decision {
        next_trade: NextTrade {
            strategy: strategy.as_str().to_string(),
            amount: 0.05,
        },
        project_phase: Some("draft".to_string()),
        announcement: None,
        reasoning: "fallback mode".to_string(),
    }
}

/// Fixed decision substituted on any request or parse failure
pub fn error_fallback() -> Decision {
    Decision {
        next_trade: NextTrade {
            strategy: Strategy::Trend.as_str().to_string(),
            amount: 0.05,
        },
        project_phase: None,
        announcement: None,
        reasoning: "Error fallback".to_string(),
    }
}

fn build_prompt(recent_trades: &[Trade], skill_text: Option<&str>) -> String {
    let trades_json = serde_json::to_string(&recent_trades.iter().take(5).collect::<Vec<_>>())
        .unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::from(
        "You are HeliosSynerga, an autonomous agent competing in a hackathon.\n\
         Your mission: maintain the best project submission and engage the community.\n\n",
    );

    if let Some(skill) = skill_text {
        prompt.push_str("Operator skill context:\n");
        prompt.push_str(skill);
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!(
        "Recent trades (last 5): {trades_json}\n\n\
         Respond with a JSON object:\n\
         {{\n\
           \"nextTrade\": {{ \"strategy\": \"arbitrage|liquidity|trend\", \"amount\": 0.05 }},\n\
           \"projectPhase\": \"draft|submit|update\",\n\
           \"announcement\": \"short progress announcement\",\n\
           \"reasoning\": \"why this strategy now\"\n\
         }}"
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_trade() -> Trade {
        Trade {
            id: 1,
            strategy: "arbitrage".to_string(),
            amount: 0.05,
            pnl: 0.0003,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_parse_decision() {
        let decision = parse_decision(
            r#"{"nextTrade":{"strategy":"liquidity","amount":0.1},"projectPhase":"update","reasoning":"rebalance"}"#,
        )
        .unwrap();
        assert_eq!(decision.next_trade.strategy, "liquidity");
        assert_eq!(decision.next_trade.amount, 0.1);
        assert_eq!(decision.project_phase.as_deref(), Some("update"));
    }

    #[test]
    fn test_parse_failure_maps_to_error_fallback() {
        assert!(parse_decision("not json at all").is_err());

        let fallback = error_fallback();
        assert_eq!(fallback.next_trade.strategy, "trend");
        assert_eq!(fallback.next_trade.amount, 0.05);
        assert_eq!(fallback.reasoning, "Error fallback");
    }

    #[tokio::test]
    async fn test_no_credential_yields_fallback_mode() {
        let client = AdvisoryClient::new(None);
        let decision = client.consult(&[sample_trade()], None).await;
        assert_eq!(decision.reasoning, "fallback mode");
        assert_eq!(decision.next_trade.amount, 0.05);
        assert!(Strategy::from_str_loose(&decision.next_trade.strategy).is_some());
    }

    #[test]
    fn test_prompt_includes_trades_and_skill() {
        let prompt = build_prompt(&[sample_trade()], Some("keep demo links current"));
        assert!(prompt.contains("arbitrage"));
        assert!(prompt.contains("keep demo links current"));
        assert!(prompt.contains("nextTrade"));
    }
}
