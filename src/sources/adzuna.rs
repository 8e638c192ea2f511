// src/sources/adzuna.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use super::{clean_text, SourceFetcher};
use crate::error::{SourceError, SourceResult};
use crate::types::RawListing;

/// Adzuna search API. Requires an application id and key; the registry
/// skips this source entirely when they are not configured.
pub struct AdzunaFetcher {
    client: Client,
    app_id: String,
    app_key: String,
    country: String,
    timeout: Duration,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AdzunaResponse {
    results: Vec<AdzunaJob>,
}

#[derive(Debug, Deserialize)]
struct AdzunaJob {
    id: String,
    title: String,
    company: AdzunaCompany,
    location: AdzunaLocation,
    description: String,
    redirect_url: String,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    #[serde(default)]
    created: String,
}

#[derive(Debug, Deserialize)]
struct AdzunaCompany {
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct AdzunaLocation {
    #[serde(default)]
    display_name: String,
}

impl AdzunaFetcher {
    pub fn new(
        app_id: String,
        app_key: String,
        country: String,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            app_id,
            app_key,
            country,
            timeout,
            base_url: "https://api.adzuna.com/v1/api/jobs".to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn to_listing(job: AdzunaJob) -> RawListing {
        let posted_at = DateTime::parse_from_rfc3339(&job.created)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let salary_text = match (job.salary_min, job.salary_max) {
            (Some(min), Some(max)) => Some(format!("{:.0} - {:.0}", min, max)),
            (Some(min), None) => Some(format!("{:.0}", min)),
            (None, Some(max)) => Some(format!("{:.0}", max)),
            (None, None) => None,
        };

        let location = job.location.display_name;
        let remote = location.to_lowercase().contains("remote");

        RawListing {
            id: format!("adzuna:{}", job.id),
            source: "adzuna".to_string(),
            title: job.title,
            organization: job.company.display_name,
            location,
            remote,
            description: clean_text(&job.description),
            apply_url: job.redirect_url,
            salary_text,
            posted_at,
            tags: Vec::new(),
        }
    }
}

#[async_trait]
impl SourceFetcher for AdzunaFetcher {
    fn name(&self) -> &str {
        "adzuna"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, query: &str, location: Option<&str>) -> SourceResult<Vec<RawListing>> {
        info!("Fetching adzuna listings for query: {}", query);

        let url = format!("{}/{}/search/1", self.base_url, self.country);
        let mut request = self.client.get(&url).query(&[
            ("app_id", self.app_id.as_str()),
            ("app_key", self.app_key.as_str()),
            ("what", query),
            ("results_per_page", "50"),
        ]);
        if let Some(place) = location {
            request = request.query(&[("where", place)]);
        }

        let response = request.send().await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SourceError::Auth(format!(
                "adzuna rejected credentials (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: AdzunaResponse = serde_json::from_str(&body)
            .map_err(|e| SourceError::Parse(format!("adzuna payload: {}", e)))?;

        Ok(parsed.results.into_iter().map(Self::to_listing).collect())
    }
}
