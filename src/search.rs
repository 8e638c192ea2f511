// src/search.rs
//! The exposed search pipeline: aggregate, normalize, score.
//!
//! Everything the pipeline needs (sources, cache, process control, oracle,
//! sink) is constructed explicitly and injected here; tests build isolated
//! instances per case. Expected failures never propagate out of `search`:
//! they end up in the per-source status report or in fallback scores.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::aggregation::aggregate;
use crate::cache::TieredCache;
use crate::config::AppConfig;
use crate::normalize::normalize;
use crate::process_control::ProcessControl;
use crate::scoring::{ScoringEngine, ScoringOracle, SemanticOracle};
use crate::sources::SourceRegistry;
use crate::streaming::{StreamEvent, StreamingSink};
use crate::types::{CandidateProfile, SearchOptions, SearchOutcome};

pub struct SearchService {
    registry: SourceRegistry,
    cache: Arc<TieredCache>,
    control: Arc<ProcessControl>,
    oracle: Option<Box<dyn ScoringOracle>>,
    sink: Arc<dyn StreamingSink>,
    aggregation_deadline: Duration,
    score_ttl: Duration,
}

impl SearchService {
    pub fn new(
        registry: SourceRegistry,
        cache: Arc<TieredCache>,
        control: Arc<ProcessControl>,
        sink: Arc<dyn StreamingSink>,
    ) -> Self {
        Self {
            registry,
            cache,
            control,
            oracle: None,
            sink,
            aggregation_deadline: Duration::from_secs(30),
            score_ttl: Duration::from_secs(86_400),
        }
    }

    /// Assemble the whole service from environment configuration.
    pub async fn from_config(config: &AppConfig, sink: Arc<dyn StreamingSink>) -> anyhow::Result<Self> {
        let registry = SourceRegistry::from_config(config)?;
        let cache = Arc::new(TieredCache::connect(config.redis_url.as_deref()).await);
        let control = Arc::new(ProcessControl::new());

        let oracle: Option<Box<dyn ScoringOracle>> = match &config.semantic_api_key {
            Some(key) => Some(Box::new(SemanticOracle::new(
                config.semantic_api_url.clone(),
                key.clone(),
            )?)),
            None => {
                info!("SEMANTIC_API_KEY not set; scoring will use the deterministic fallback");
                None
            }
        };

        Ok(Self {
            registry,
            cache,
            control,
            oracle,
            sink,
            aggregation_deadline: config.aggregation_deadline,
            score_ttl: config.score_cache_ttl,
        })
    }

    pub fn with_oracle(mut self, oracle: Box<dyn ScoringOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn with_aggregation_deadline(mut self, deadline: Duration) -> Self {
        self.aggregation_deadline = deadline;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Handle for issuing stop requests from outside the pipeline.
    pub fn control_handle(&self) -> Arc<ProcessControl> {
        self.control.clone()
    }

    /// Run the full pipeline under the given process name.
    ///
    /// Cancellation is polled at three suspension points: before the
    /// fan-out, between fetcher settlements, and before each oracle call.
    /// A stop request therefore takes effect within the larger of one
    /// source timeout and one oracle call, and surfaces as `stopped=true`
    /// with partial results.
    pub async fn search(
        &self,
        options: &SearchOptions,
        profile: &CandidateProfile,
        streaming_threshold: u8,
        process_name: &str,
    ) -> SearchOutcome {
        info!(
            "Search started: query=\"{}\" sources={} process={}",
            options.query,
            self.registry.len(),
            process_name
        );
        self.sink.emit(StreamEvent::progress(format!(
            "Searching {} sources for \"{}\"",
            self.registry.len(),
            options.query
        )));

        let aggregated = aggregate(
            &self.registry,
            options,
            &self.control,
            process_name,
            self.aggregation_deadline,
            self.sink.as_ref(),
        )
        .await;

        let normalized = normalize(aggregated.listings, options);
        self.sink.emit(StreamEvent::progress(format!(
            "{} listings after deduplication and filtering",
            normalized.len()
        )));

        let engine = ScoringEngine::new(
            self.oracle.as_deref(),
            &self.cache,
            &self.control,
            self.sink.as_ref(),
            self.score_ttl,
        );
        let scored = engine
            .score_all(normalized, profile, streaming_threshold, process_name)
            .await;

        let stopped = aggregated.stopped || scored.stopped;
        if self.control.is_running(process_name) {
            self.control.complete(process_name, stopped);
        }

        info!(
            "Search finished: {} results, {} streamed, stopped={}",
            scored.results.len(),
            scored.streamed,
            stopped
        );

        SearchOutcome {
            results: scored.results,
            stopped,
            source_statuses: aggregated.statuses,
            processed: scored.processed,
            streamed: scored.streamed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::fallback;
    use crate::sources::SourceFetcher;
    use crate::streaming::NullSink;
    use crate::testing::{normalized_listing, sample_listing, CollectingSink, MockFetcher, MockOracle};
    use crate::types::ScoreSource;

    fn service(fetchers: Vec<MockFetcher>, sink: Arc<dyn StreamingSink>) -> SearchService {
        let registry = SourceRegistry::new(
            fetchers
                .into_iter()
                .map(|f| Arc::new(f) as Arc<dyn SourceFetcher>)
                .collect(),
        );
        SearchService::new(
            registry,
            Arc::new(TieredCache::local_only()),
            Arc::new(ProcessControl::new()),
            sink,
        )
    }

    fn profile() -> CandidateProfile {
        CandidateProfile {
            skills: vec!["rust".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_same_listing_from_two_sources_appears_once() {
        let mut first = sample_listing("alpha", "1");
        first.title = "Senior Rust Engineer".to_string();
        first.organization = "Acme Corp".to_string();

        let mut second = sample_listing("beta", "9");
        second.title = "SENIOR RUST ENGINEER".to_string();
        second.organization = "acme corp".to_string();

        let svc = service(
            vec![
                MockFetcher::returning("alpha", vec![first]),
                MockFetcher::returning("beta", vec![second]),
            ],
            Arc::new(NullSink),
        );
        svc.control_handle().start("dedup-e2e");

        let outcome = svc
            .search(&SearchOptions::new("rust"), &profile(), 100, "dedup-e2e")
            .await;

        assert_eq!(outcome.results.len(), 1);
        assert!(!outcome.stopped);
        assert_eq!(outcome.source_statuses.len(), 2);
        assert!(outcome.source_statuses.iter().all(|s| s.succeeded));
    }

    #[tokio::test]
    async fn test_remote_only_filter_end_to_end() {
        let mut listings = Vec::new();
        for i in 0..3 {
            let mut l = sample_listing("alpha", &format!("remote-{}", i));
            l.title = format!("Remote Engineer {}", i);
            l.remote = true;
            listings.push(l);
        }
        for i in 0..2 {
            let mut l = sample_listing("alpha", &format!("onsite-{}", i));
            l.title = format!("Onsite Engineer {}", i);
            l.remote = false;
            listings.push(l);
        }

        let svc = service(
            vec![MockFetcher::returning("alpha", listings)],
            Arc::new(NullSink),
        );
        svc.control_handle().start("remote-e2e");

        let mut options = SearchOptions::new("engineer");
        options.remote_only = Some(true);

        let outcome = svc.search(&options, &profile(), 100, "remote-e2e").await;

        assert_eq!(outcome.results.len(), 3);
        assert!(outcome.results.iter().all(|r| r.listing.raw.remote));
    }

    #[tokio::test]
    async fn test_failing_oracle_yields_fallback_scores_everywhere() {
        let mut a = sample_listing("alpha", "1");
        a.title = "Senior Rust Engineer".to_string();
        a.description = "rust and tokio".to_string();
        let mut b = sample_listing("alpha", "2");
        b.title = "Data Analyst".to_string();
        b.description = "sql dashboards".to_string();

        let svc = service(
            vec![MockFetcher::returning("alpha", vec![a.clone(), b.clone()])],
            Arc::new(NullSink),
        )
        .with_oracle(Box::new(MockOracle::failing()));
        svc.control_handle().start("oracle-down");

        let outcome = svc
            .search(&SearchOptions::new(""), &profile(), 100, "oracle-down")
            .await;

        assert_eq!(outcome.results.len(), 2);
        for result in &outcome.results {
            assert_eq!(result.scored_by, ScoreSource::Fallback);
            let expected = fallback::score(
                &normalized_listing(&result.listing.raw.title, &result.listing.raw.description),
                &profile(),
            );
            assert_eq!(result.score, expected.score);
        }
    }

    #[tokio::test]
    async fn test_streaming_threshold_end_to_end() {
        let mut listings = Vec::new();
        for (i, title) in ["First Role", "Second Role", "Third Role"].iter().enumerate() {
            let mut l = sample_listing("alpha", &format!("{}", i));
            l.title = title.to_string();
            listings.push(l);
        }

        let sink = Arc::new(CollectingSink::new());
        let svc = service(
            vec![MockFetcher::returning("alpha", listings)],
            sink.clone(),
        )
        .with_oracle(Box::new(MockOracle::scripted(&[95, 80, 92])));
        svc.control_handle().start("stream-e2e");

        let outcome = svc
            .search(&SearchOptions::new(""), &profile(), 90, "stream-e2e")
            .await;

        // Two match events, in score-computation order.
        assert_eq!(sink.match_scores(), vec![95, 92]);
        assert_eq!(outcome.streamed, 2);

        let final_scores: Vec<u8> = outcome.results.iter().map(|r| r.score).collect();
        assert_eq!(final_scores, vec![95, 92, 80]);
    }

    #[tokio::test]
    async fn test_cancellation_before_scoring_returns_quickly() {
        let svc = service(
            vec![MockFetcher::returning(
                "alpha",
                vec![sample_listing("alpha", "1")],
            )],
            Arc::new(NullSink),
        );
        let control = svc.control_handle();
        control.start("cancel-e2e");
        control.request_stop("cancel-e2e");

        let outcome = svc
            .search(&SearchOptions::new(""), &profile(), 100, "cancel-e2e")
            .await;

        assert!(outcome.stopped);
        assert!(outcome.results.is_empty());
        // Completion discards the registry entry.
        assert!(!control.is_running("cancel-e2e"));
    }

    #[tokio::test]
    async fn test_partial_source_failure_is_reported_not_fatal() {
        let svc = service(
            vec![
                MockFetcher::returning("alpha", vec![sample_listing("alpha", "1")]),
                MockFetcher::failing("beta", "boom"),
            ],
            Arc::new(NullSink),
        );
        svc.control_handle().start("partial-e2e");

        let outcome = svc
            .search(&SearchOptions::new(""), &profile(), 100, "partial-e2e")
            .await;

        assert_eq!(outcome.results.len(), 1);
        let beta = outcome
            .source_statuses
            .iter()
            .find(|s| s.name == "beta")
            .unwrap();
        assert!(!beta.succeeded);
        assert!(beta.error.is_some());
    }
}
