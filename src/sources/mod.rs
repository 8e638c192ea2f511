// src/sources/mod.rs
//! Source fetcher adapters.
//!
//! One adapter per external listing provider. Each fetcher owns its own
//! HTTP client and timeout policy and fails independently; "no results" is
//! an empty list, never an error.

pub mod adzuna;
pub mod arbeitnow;
pub mod careers_page;
pub mod remotive;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::AppConfig;
use crate::error::SourceResult;
use crate::types::RawListing;

pub use adzuna::AdzunaFetcher;
pub use arbeitnow::ArbeitnowFetcher;
pub use careers_page::CareersPageFetcher;
pub use remotive::RemotiveFetcher;

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    fn name(&self) -> &str;

    /// Per-fetcher timeout budget, enforced by the aggregation pipeline.
    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn fetch(&self, query: &str, location: Option<&str>) -> SourceResult<Vec<RawListing>>;
}

static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

/// Collapse whitespace and drop HTML tags so downstream classifiers see
/// plain text. Sources deliver anything from JSON strings to raw markup.
pub fn clean_text(text: &str) -> String {
    TAG_PATTERN
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The set of fetchers applicable to one deployment, selected by
/// configuration. A source missing its credentials is skipped and logged,
/// not errored.
pub struct SourceRegistry {
    fetchers: Vec<Arc<dyn SourceFetcher>>,
    skipped: Vec<(String, String)>,
}

impl SourceRegistry {
    pub fn new(fetchers: Vec<Arc<dyn SourceFetcher>>) -> Self {
        Self {
            fetchers,
            skipped: Vec::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let mut fetchers: Vec<Arc<dyn SourceFetcher>> = Vec::new();
        let mut skipped = Vec::new();

        fetchers.push(Arc::new(RemotiveFetcher::new(config.source_timeout)?));
        fetchers.push(Arc::new(ArbeitnowFetcher::new(config.source_timeout)?));

        match (&config.adzuna_app_id, &config.adzuna_app_key) {
            (Some(app_id), Some(app_key)) => {
                fetchers.push(Arc::new(AdzunaFetcher::new(
                    app_id.clone(),
                    app_key.clone(),
                    config.adzuna_country.clone(),
                    config.source_timeout,
                )?));
            }
            _ => {
                let reason = "ADZUNA_APP_ID / ADZUNA_APP_KEY not set".to_string();
                info!("Skipping source adzuna: {}", reason);
                skipped.push(("adzuna".to_string(), reason));
            }
        }

        if config.careers_page_urls.is_empty() {
            let reason = "CAREERS_PAGE_URLS not set".to_string();
            info!("Skipping source careers-page: {}", reason);
            skipped.push(("careers-page".to_string(), reason));
        } else {
            fetchers.push(Arc::new(CareersPageFetcher::new(
                config.careers_page_urls.clone(),
                config.source_timeout,
            )?));
        }

        Ok(Self { fetchers, skipped })
    }

    pub fn fetchers(&self) -> &[Arc<dyn SourceFetcher>] {
        &self.fetchers
    }

    /// Sources excluded by configuration gaps, with the reason for each.
    pub fn skipped(&self) -> &[(String, String)] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_markup_and_whitespace() {
        let cleaned = clean_text("<p>Senior  <b>Rust</b>\n Engineer</p>");
        assert_eq!(cleaned, "Senior Rust Engineer");
    }

    #[test]
    fn test_clean_text_plain_passthrough() {
        assert_eq!(clean_text("plain text"), "plain text");
    }
}
