// src/scoring/oracle.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use super::Assessment;
use crate::error::{OracleError, OracleResult};
use crate::types::CandidateProfile;

/// External scoring oracle boundary. The engine treats every failure the
/// same way: the listing falls back to the deterministic scorer.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn score(
        &self,
        listing_text: &str,
        profile: &CandidateProfile,
    ) -> OracleResult<Assessment>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SemanticMessage {
    context: String,
    content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SemanticRequest {
    messages: Vec<SemanticMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SemanticResponse {
    message: String,
}

/// Shape the oracle is instructed to reply with. Scores may come back out
/// of range or fractional; they are clamped into 0..=100 here.
#[derive(Debug, Deserialize)]
struct OracleReply {
    score: f64,
    #[serde(default)]
    matched_skills: Vec<String>,
    #[serde(default)]
    missing_skills: Vec<String>,
    #[serde(default)]
    rationale: String,
}

/// Scoring oracle backed by the Semantic API.
pub struct SemanticOracle {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SemanticOracle {
    pub fn new(base_url: String, api_key: String) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    fn build_prompt(listing_text: &str, profile: &CandidateProfile) -> String {
        let profile_json =
            serde_json::to_string_pretty(profile).unwrap_or_else(|_| "{}".to_string());

        format!(
            r#"You are scoring how well a job listing matches a candidate profile.

JOB LISTING:
{}

CANDIDATE PROFILE:
{}

TASK: Rate the match from 0 to 100 and list which of the candidate's skills
the listing asks for and which it lacks. Reply with a single JSON object and
nothing else, in exactly this shape:

{{"score": 0, "matched_skills": [], "missing_skills": [], "rationale": ""}}"#,
            listing_text, profile_json
        )
    }

    /// Oracle replies sometimes arrive wrapped in a markdown code fence.
    fn strip_code_fences(message: &str) -> &str {
        let trimmed = message.trim();
        let Some(inner) = trimmed.strip_prefix("```") else {
            return trimmed;
        };
        let inner = inner.strip_prefix("json").unwrap_or(inner);
        inner.strip_suffix("```").unwrap_or(inner).trim()
    }

    fn parse_reply(message: &str) -> OracleResult<Assessment> {
        let payload = Self::strip_code_fences(message);
        let reply: OracleReply = serde_json::from_str(payload)
            .map_err(|e| OracleError::Malformed(format!("{}: {}", e, payload)))?;

        Ok(Assessment {
            score: reply.score.clamp(0.0, 100.0).round() as u8,
            matched_skills: reply.matched_skills,
            missing_skills: reply.missing_skills,
            rationale: reply.rationale,
        })
    }
}

#[async_trait]
impl ScoringOracle for SemanticOracle {
    async fn score(
        &self,
        listing_text: &str,
        profile: &CandidateProfile,
    ) -> OracleResult<Assessment> {
        let request = SemanticRequest {
            messages: vec![SemanticMessage {
                context: "Job Match Scoring".to_string(),
                content: Self::build_prompt(listing_text, profile),
            }],
        };

        info!("Sending scoring request to Semantic API");

        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Semantic API error {}: {}", status, body);
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let semantic_response: SemanticResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        Self::parse_reply(&semantic_response.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply_plain_json() {
        let assessment = SemanticOracle::parse_reply(
            r#"{"score": 87, "matched_skills": ["rust"], "missing_skills": ["go"], "rationale": "solid"}"#,
        )
        .unwrap();
        assert_eq!(assessment.score, 87);
        assert_eq!(assessment.matched_skills, vec!["rust"]);
    }

    #[test]
    fn test_parse_reply_strips_code_fence() {
        let message = "```json\n{\"score\": 42, \"rationale\": \"ok\"}\n```";
        let assessment = SemanticOracle::parse_reply(message).unwrap();
        assert_eq!(assessment.score, 42);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let high = SemanticOracle::parse_reply(r#"{"score": 250}"#).unwrap();
        assert_eq!(high.score, 100);

        let low = SemanticOracle::parse_reply(r#"{"score": -10}"#).unwrap();
        assert_eq!(low.score, 0);
    }

    #[test]
    fn test_non_json_reply_is_malformed() {
        let result = SemanticOracle::parse_reply("I think this is a great fit!");
        assert!(matches!(result, Err(OracleError::Malformed(_))));
    }
}
