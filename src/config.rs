// src/config.rs
use std::time::Duration;

fn env_secs(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Runtime configuration, read from the environment. Sources whose
/// credentials are absent are skipped at registry build time; the pipeline
/// itself never fails over a configuration gap.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Scoring oracle endpoint and key. No key means every listing is
    /// scored by the deterministic fallback.
    pub semantic_api_url: String,
    pub semantic_api_key: Option<String>,

    /// Adzuna credentials; both must be present for the source to run.
    pub adzuna_app_id: Option<String>,
    pub adzuna_app_key: Option<String>,
    pub adzuna_country: String,

    /// Careers pages to scrape, comma-separated in CAREERS_PAGE_URLS.
    pub careers_page_urls: Vec<String>,

    /// Shared cache tier. No URL means the cache runs local-only.
    pub redis_url: Option<String>,

    /// Per-fetcher timeout budget.
    pub source_timeout: Duration,
    /// Upper bound on total aggregation wall-clock time.
    pub aggregation_deadline: Duration,
    /// Default TTL for cache writes.
    pub cache_ttl: Duration,
    /// TTL for memoized oracle scores.
    pub score_cache_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let careers_page_urls = std::env::var("CAREERS_PAGE_URLS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            semantic_api_url: std::env::var("SEMANTIC_API_URL")
                .unwrap_or_else(|_| "https://api0.ai".to_string()),
            semantic_api_key: std::env::var("SEMANTIC_API_KEY").ok(),
            adzuna_app_id: std::env::var("ADZUNA_APP_ID").ok(),
            adzuna_app_key: std::env::var("ADZUNA_APP_KEY").ok(),
            adzuna_country: std::env::var("ADZUNA_COUNTRY").unwrap_or_else(|_| "gb".to_string()),
            careers_page_urls,
            redis_url: std::env::var("REDIS_URL").ok(),
            source_timeout: Duration::from_secs(env_secs("SOURCE_TIMEOUT_SECS", 15)),
            aggregation_deadline: Duration::from_secs(env_secs("AGGREGATION_DEADLINE_SECS", 30)),
            cache_ttl: Duration::from_secs(env_secs("CACHE_TTL_SECS", 600)),
            score_cache_ttl: Duration::from_secs(env_secs("SCORE_CACHE_TTL_SECS", 86_400)),
        }
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    pub fn with_aggregation_deadline(mut self, deadline: Duration) -> Self {
        self.aggregation_deadline = deadline;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
