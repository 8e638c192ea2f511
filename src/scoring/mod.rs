// src/scoring/mod.rs
//! Hybrid scoring engine.
//!
//! Each listing is scored by the external oracle when one is configured and
//! reachable, and by the deterministic fallback otherwise. The choice is a
//! single fallible call per listing; which path produced a result is
//! recorded on it. Oracle calls are memoized through the cache, keyed by a
//! fingerprint of listing text and profile.

pub mod fallback;
pub mod oracle;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{CacheOptions, TieredCache};
use crate::process_control::ProcessControl;
use crate::streaming::{StreamEvent, StreamingSink};
use crate::types::{CandidateProfile, MatchResult, NormalizedListing, ScoreSource};

pub use oracle::{ScoringOracle, SemanticOracle};

/// Description text sent to the oracle is truncated to this many characters.
pub const DESCRIPTION_LIMIT: usize = 2000;

/// Cache tag every memoized score is written under, so scores can be
/// invalidated in one sweep.
pub const SCORE_CACHE_TAG: &str = "scores";

/// One scoring verdict, from either path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub score: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub rationale: String,
}

/// Result of scoring one batch of listings.
#[derive(Debug)]
pub struct ScoringOutcome {
    /// All produced results, sorted descending by score.
    pub results: Vec<MatchResult>,
    pub processed: usize,
    pub streamed: usize,
    pub stopped: bool,
}

pub struct ScoringEngine<'a> {
    oracle: Option<&'a dyn ScoringOracle>,
    cache: &'a TieredCache,
    control: &'a ProcessControl,
    sink: &'a dyn StreamingSink,
    score_ttl: Duration,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(
        oracle: Option<&'a dyn ScoringOracle>,
        cache: &'a TieredCache,
        control: &'a ProcessControl,
        sink: &'a dyn StreamingSink,
        score_ttl: Duration,
    ) -> Self {
        Self {
            oracle,
            cache,
            control,
            sink,
            score_ttl,
        }
    }

    /// Score every listing sequentially, checking the cancellation flag
    /// before each one. Results at or above `threshold` are emitted to the
    /// sink the moment they are computed.
    pub async fn score_all(
        &self,
        listings: Vec<NormalizedListing>,
        profile: &CandidateProfile,
        threshold: u8,
        process_name: &str,
    ) -> ScoringOutcome {
        let total = listings.len();
        let mut results: Vec<MatchResult> = Vec::with_capacity(total);
        let mut streamed = 0;
        let mut stopped = false;

        for listing in listings {
            if self.control.should_stop(process_name) {
                info!(
                    "Scoring stopped after {}/{} listings: cancellation requested",
                    results.len(),
                    total
                );
                stopped = true;
                break;
            }

            let (assessment, scored_by) = self.assess(&listing, profile).await;
            let result = MatchResult {
                listing,
                score: assessment.score,
                matched_skills: assessment.matched_skills,
                missing_skills: assessment.missing_skills,
                rationale: assessment.rationale,
                scored_by,
            };

            if result.score >= threshold {
                self.sink.emit(StreamEvent::matched(result.clone()));
                streamed += 1;
            }

            results.push(result);
        }

        let processed = results.len();
        // Stable sort keeps computation order among equal scores.
        results.sort_by(|a, b| b.score.cmp(&a.score));

        ScoringOutcome {
            results,
            processed,
            streamed,
            stopped,
        }
    }

    async fn assess(
        &self,
        listing: &NormalizedListing,
        profile: &CandidateProfile,
    ) -> (Assessment, ScoreSource) {
        let Some(oracle) = self.oracle else {
            return (fallback::score(listing, profile), ScoreSource::Fallback);
        };

        let listing_text = oracle_text(listing);
        let key = score_cache_key(&listing_text, profile);
        let opts = CacheOptions::ttl(self.score_ttl).with_tag(SCORE_CACHE_TAG);

        let outcome = self
            .cache
            .get_or_set(&key, opts, || oracle.score(&listing_text, profile))
            .await;

        match outcome {
            Ok(assessment) => {
                debug!("Oracle scored {} at {}", listing.raw.id, assessment.score);
                (assessment, ScoreSource::Oracle)
            }
            Err(e) => {
                warn!(
                    "Oracle unavailable for {}, using fallback scorer: {}",
                    listing.raw.id, e
                );
                (fallback::score(listing, profile), ScoreSource::Fallback)
            }
        }
    }
}

/// The listing text the oracle sees: title plus bounded description.
fn oracle_text(listing: &NormalizedListing) -> String {
    let description: String = listing.raw.description.chars().take(DESCRIPTION_LIMIT).collect();
    format!("{}\n\n{}", listing.raw.title, description)
}

fn score_cache_key(listing_text: &str, profile: &CandidateProfile) -> String {
    let profile_json = serde_json::to_string(profile).unwrap_or_default();
    let digest = Sha256::digest(format!("{}|{}", listing_text, profile_json).as_bytes());
    format!("score:{:x}", digest)
}
