// src/sources/remotive.rs
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use super::{clean_text, SourceFetcher};
use crate::error::{SourceError, SourceResult};
use crate::types::RawListing;

const API_URL: &str = "https://remotive.com/api/remote-jobs";

/// Remotive public job board API. No credentials, remote-only listings.
pub struct RemotiveFetcher {
    client: Client,
    timeout: Duration,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RemotiveResponse {
    jobs: Vec<RemotiveJob>,
}

#[derive(Debug, Deserialize)]
struct RemotiveJob {
    id: u64,
    url: String,
    title: String,
    company_name: String,
    #[serde(default)]
    candidate_required_location: String,
    #[serde(default)]
    salary: String,
    description: String,
    #[serde(default)]
    publication_date: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl RemotiveFetcher {
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

    fn to_listing(job: RemotiveJob) -> RawListing {
        // Remotive publication dates carry no timezone; treat as UTC.
        let posted_at = NaiveDateTime::parse_from_str(&job.publication_date, "%Y-%m-%dT%H:%M:%S")
            .map(|naive| naive.and_utc())
            .unwrap_or_else(|_| Utc::now());

        let salary_text = if job.salary.trim().is_empty() {
            None
        } else {
            Some(job.salary.trim().to_string())
        };

        RawListing {
            id: format!("remotive:{}", job.id),
            source: "remotive".to_string(),
            title: job.title,
            organization: job.company_name,
            location: job.candidate_required_location,
            remote: true,
            description: clean_text(&job.description),
            apply_url: job.url,
            salary_text,
            posted_at,
            tags: job.tags,
        }
    }
}

#[async_trait]
impl SourceFetcher for RemotiveFetcher {
    fn name(&self) -> &str {
        "remotive"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, query: &str, _location: Option<&str>) -> SourceResult<Vec<RawListing>> {
        info!("Fetching remotive listings for query: {}", query);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("search", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: RemotiveResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("remotive payload: {}", e)))?;

        if parsed.jobs.is_empty() {
            warn!("Remotive returned no listings for query: {}", query);
        }

        Ok(parsed.jobs.into_iter().map(Self::to_listing).collect())
    }
}
