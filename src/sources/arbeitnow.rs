// src/sources/arbeitnow.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use super::{clean_text, SourceFetcher};
use crate::error::{SourceError, SourceResult};
use crate::types::RawListing;

const API_URL: &str = "https://www.arbeitnow.com/api/job-board-api";

/// Arbeitnow public job board API. The API has no search parameter, so the
/// query is applied client-side over title and description.
pub struct ArbeitnowFetcher {
    client: Client,
    timeout: Duration,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ArbeitnowResponse {
    data: Vec<ArbeitnowJob>,
}

#[derive(Debug, Deserialize)]
struct ArbeitnowJob {
    slug: String,
    company_name: String,
    title: String,
    description: String,
    remote: bool,
    url: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    job_types: Vec<String>,
    #[serde(default)]
    location: String,
    created_at: i64,
}

impl ArbeitnowFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            timeout,
            base_url: API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn matches_query(job: &ArbeitnowJob, query: &str) -> bool {
        let tokens: Vec<String> = query
            .split_whitespace()
            .filter(|t| t.len() > 2)
            .map(|t| t.to_lowercase())
            .collect();
        if tokens.is_empty() {
            return true;
        }

        let haystack = format!("{} {}", job.title, job.description).to_lowercase();
        tokens.iter().any(|t| haystack.contains(t))
    }

    fn to_listing(job: ArbeitnowJob) -> RawListing {
        let posted_at = DateTime::from_timestamp(job.created_at, 0).unwrap_or_else(Utc::now);

        let mut tags = job.tags;
        tags.extend(job.job_types);

        RawListing {
            id: format!("arbeitnow:{}", job.slug),
            source: "arbeitnow".to_string(),
            title: job.title,
            organization: job.company_name,
            location: job.location,
            remote: job.remote,
            description: clean_text(&job.description),
            apply_url: job.url,
            salary_text: None,
            posted_at,
            tags,
        }
    }
}

#[async_trait]
impl SourceFetcher for ArbeitnowFetcher {
    fn name(&self) -> &str {
        "arbeitnow"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, query: &str, _location: Option<&str>) -> SourceResult<Vec<RawListing>> {
        info!("Fetching arbeitnow listings for query: {}", query);

        let response = self.client.get(&self.base_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ArbeitnowResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("arbeitnow payload: {}", e)))?;

        Ok(parsed
            .data
            .into_iter()
            .filter(|job| Self::matches_query(job, query))
            .map(Self::to_listing)
            .collect())
    }
}
