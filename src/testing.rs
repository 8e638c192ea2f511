// src/testing.rs
//! Mock implementations for tests: a programmable source fetcher, a
//! programmable scoring oracle, and a sink that records every event.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{OracleError, OracleResult, SourceError, SourceResult};
use crate::normalize::enrich;
use crate::scoring::{Assessment, ScoringOracle};
use crate::sources::SourceFetcher;
use crate::streaming::{StreamEvent, StreamingSink};
use crate::types::{CandidateProfile, NormalizedListing, RawListing};

/// A plain listing with deterministic fields, for tests to adjust.
pub fn sample_listing(source: &str, id: &str) -> RawListing {
    RawListing {
        id: format!("{}:{}", source, id),
        source: source.to_string(),
        title: format!("Listing {}", id),
        organization: "Acme".to_string(),
        location: "Berlin".to_string(),
        remote: false,
        description: "A role on our team".to_string(),
        apply_url: format!("https://example.com/{}/{}", source, id),
        salary_text: None,
        posted_at: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        tags: Vec::new(),
    }
}

/// A normalized listing built from a title and description.
pub fn normalized_listing(title: &str, description: &str) -> NormalizedListing {
    let mut raw = sample_listing("test", title);
    raw.title = title.to_string();
    raw.description = description.to_string();
    enrich(raw)
}

/// Source fetcher with scripted behavior: fixed listings, a fixed error,
/// and an optional artificial delay.
pub struct MockFetcher {
    name: String,
    listings: Vec<RawListing>,
    error: Option<String>,
    delay: Option<Duration>,
    timeout: Duration,
}

impl MockFetcher {
    pub fn returning(name: &str, listings: Vec<RawListing>) -> Self {
        Self {
            name: name.to_string(),
            listings,
            error: None,
            delay: None,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            listings: Vec::new(),
            error: Some(message.to_string()),
            delay: None,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, _query: &str, _location: Option<&str>) -> SourceResult<Vec<RawListing>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.error {
            return Err(SourceError::Parse(message.clone()));
        }
        Ok(self.listings.clone())
    }
}

/// Scoring oracle with scripted scores. `scripted` pops one score per call;
/// once exhausted (or with `fixed`) every call returns the default score.
pub struct MockOracle {
    scripted: Mutex<VecDeque<u8>>,
    default_score: u8,
    fail: bool,
    calls: AtomicUsize,
}

impl MockOracle {
    pub fn fixed(score: u8) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            default_score: score,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn scripted(scores: &[u8]) -> Self {
        Self {
            scripted: Mutex::new(scores.iter().copied().collect()),
            default_score: 50,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            default_score: 0,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoringOracle for MockOracle {
    async fn score(
        &self,
        _listing_text: &str,
        _profile: &CandidateProfile,
    ) -> OracleResult<Assessment> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(OracleError::Malformed("mock oracle failure".to_string()));
        }

        let score = self
            .scripted
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_score);

        Ok(Assessment {
            score,
            matched_skills: Vec::new(),
            missing_skills: Vec::new(),
            rationale: "mock oracle".to_string(),
        })
    }
}

/// Sink that records every emitted event for later assertions.
pub struct CollectingSink {
    events: Mutex<Vec<StreamEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<StreamEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Scores of the Match events, in emission order.
    pub fn match_scores(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StreamEvent::Match { result } => Some(result.score),
                _ => None,
            })
            .collect()
    }

    pub fn progress_messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                StreamEvent::Progress { message } => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingSink for CollectingSink {
    fn emit(&self, event: StreamEvent) {
        self.events.lock().unwrap().push(event);
    }
}
