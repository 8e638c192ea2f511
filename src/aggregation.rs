// src/aggregation.rs
//! Concurrent fan-out over the applicable source fetchers.
//!
//! All fetchers are dispatched at once; results are drained as they settle.
//! One fetcher failing or stalling degrades completeness, never the call.
//! Suspension points re-check the cancellation flag, so a stop request
//! takes effect within one source timeout at worst.

use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::SourceError;
use crate::process_control::ProcessControl;
use crate::sources::SourceRegistry;
use crate::streaming::{StreamEvent, StreamingSink};
use crate::types::{RawListing, SearchOptions, SourceStatus};

/// What one aggregation run produced: the merged listings in arrival order,
/// a status per dispatched source, and whether cancellation cut it short.
#[derive(Debug)]
pub struct AggregationOutcome {
    pub listings: Vec<RawListing>,
    pub statuses: Vec<SourceStatus>,
    pub stopped: bool,
}

pub async fn aggregate(
    registry: &SourceRegistry,
    options: &SearchOptions,
    control: &ProcessControl,
    process_name: &str,
    deadline: Duration,
    sink: &dyn StreamingSink,
) -> AggregationOutcome {
    let mut listings = Vec::new();
    let mut statuses = Vec::new();

    if control.should_stop(process_name) {
        info!("Aggregation skipped: stop already requested for {}", process_name);
        return AggregationOutcome {
            listings,
            statuses,
            stopped: true,
        };
    }

    let mut pending: Vec<String> = registry
        .fetchers()
        .iter()
        .map(|f| f.name().to_string())
        .collect();

    let mut in_flight = FuturesUnordered::new();
    for fetcher in registry.fetchers() {
        let fetcher = fetcher.clone();
        let query = options.query.clone();
        let location = options.location.clone();

        in_flight.push(async move {
            let name = fetcher.name().to_string();
            let budget = fetcher.timeout();
            let result =
                match tokio::time::timeout(budget, fetcher.fetch(&query, location.as_deref()))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(SourceError::Timeout {
                        secs: budget.as_secs(),
                    }),
                };
            (name, result)
        });
    }

    let deadline_at = tokio::time::Instant::now() + deadline;
    let mut stopped = false;
    let mut deadline_hit = false;

    loop {
        if control.should_stop(process_name) {
            info!("Aggregation stopping early: cancellation requested");
            stopped = true;
            break;
        }

        match tokio::time::timeout_at(deadline_at, in_flight.next()).await {
            Ok(Some((name, result))) => {
                pending.retain(|p| p != &name);
                match result {
                    Ok(batch) => {
                        sink.emit(StreamEvent::progress(format!(
                            "Source {} returned {} listings",
                            name,
                            batch.len()
                        )));
                        statuses.push(SourceStatus::ok(&name, batch.len()));
                        listings.extend(batch);
                    }
                    Err(e) => {
                        warn!("Source {} failed: {}", name, e);
                        sink.emit(StreamEvent::progress(format!(
                            "Source {} failed: {}",
                            name, e
                        )));
                        statuses.push(SourceStatus::failed(&name, e.to_string()));
                    }
                }
            }
            Ok(None) => break,
            Err(_) => {
                warn!(
                    "Aggregation deadline of {}s exceeded with {} sources pending",
                    deadline.as_secs(),
                    pending.len()
                );
                deadline_hit = true;
                break;
            }
        }
    }

    // Sources that never settled still show up in the report.
    for name in pending {
        let reason = if stopped {
            "stopped before completion".to_string()
        } else if deadline_hit {
            format!("aggregation deadline of {}s exceeded", deadline.as_secs())
        } else {
            continue;
        };
        statuses.push(SourceStatus::failed(name, reason));
    }

    info!(
        "Aggregation finished: {} listings from {} sources ({} stopped)",
        listings.len(),
        statuses.iter().filter(|s| s.succeeded).count(),
        stopped
    );

    AggregationOutcome {
        listings,
        statuses,
        stopped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_listing, MockFetcher};
    use std::sync::Arc;

    fn registry(fetchers: Vec<MockFetcher>) -> SourceRegistry {
        SourceRegistry::new(
            fetchers
                .into_iter()
                .map(|f| Arc::new(f) as Arc<dyn crate::sources::SourceFetcher>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_one_failing_source_does_not_abort_others() {
        let reg = registry(vec![
            MockFetcher::returning("alpha", vec![sample_listing("alpha", "1")]),
            MockFetcher::failing("beta", "connection refused"),
        ]);
        let control = ProcessControl::new();
        control.start("agg-test");

        let outcome = aggregate(
            &reg,
            &SearchOptions::new("engineer"),
            &control,
            "agg-test",
            Duration::from_secs(5),
            &crate::streaming::NullSink,
        )
        .await;

        assert!(!outcome.stopped);
        assert_eq!(outcome.listings.len(), 1);
        assert_eq!(outcome.statuses.len(), 2);

        let beta = outcome.statuses.iter().find(|s| s.name == "beta").unwrap();
        assert!(!beta.succeeded);
        assert!(beta.error.as_deref().unwrap().contains("connection refused"));

        let alpha = outcome.statuses.iter().find(|s| s.name == "alpha").unwrap();
        assert!(alpha.succeeded);
        assert_eq!(alpha.count, Some(1));
    }

    #[tokio::test]
    async fn test_slow_source_times_out_independently() {
        let slow = MockFetcher::returning("slow", vec![sample_listing("slow", "1")])
            .with_delay(Duration::from_secs(30))
            .with_timeout(Duration::from_millis(50));
        let fast = MockFetcher::returning("fast", vec![sample_listing("fast", "1")]);
        let reg = registry(vec![slow, fast]);
        let control = ProcessControl::new();
        control.start("agg-timeout");

        let outcome = aggregate(
            &reg,
            &SearchOptions::new("engineer"),
            &control,
            "agg-timeout",
            Duration::from_secs(5),
            &crate::streaming::NullSink,
        )
        .await;

        assert!(!outcome.stopped);
        assert_eq!(outcome.listings.len(), 1);
        assert_eq!(outcome.listings[0].source, "fast");

        let slow_status = outcome.statuses.iter().find(|s| s.name == "slow").unwrap();
        assert!(!slow_status.succeeded);
        assert!(slow_status.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_pre_dispatch_cancellation_returns_immediately() {
        let reg = registry(vec![MockFetcher::returning(
            "alpha",
            vec![sample_listing("alpha", "1")],
        )]);
        let control = ProcessControl::new();
        control.start("agg-cancelled");
        control.request_stop("agg-cancelled");

        let outcome = aggregate(
            &reg,
            &SearchOptions::new("engineer"),
            &control,
            "agg-cancelled",
            Duration::from_secs(5),
            &crate::streaming::NullSink,
        )
        .await;

        assert!(outcome.stopped);
        assert!(outcome.listings.is_empty());
    }

    #[tokio::test]
    async fn test_global_deadline_marks_pending_sources() {
        let slow = MockFetcher::returning("slow", vec![sample_listing("slow", "1")])
            .with_delay(Duration::from_secs(30))
            .with_timeout(Duration::from_secs(60));
        let reg = registry(vec![slow]);
        let control = ProcessControl::new();
        control.start("agg-deadline");

        let outcome = aggregate(
            &reg,
            &SearchOptions::new("engineer"),
            &control,
            "agg-deadline",
            Duration::from_millis(50),
            &crate::streaming::NullSink,
        )
        .await;

        assert!(!outcome.stopped);
        assert!(outcome.listings.is_empty());
        let slow_status = outcome.statuses.iter().find(|s| s.name == "slow").unwrap();
        assert!(!slow_status.succeeded);
        assert!(slow_status
            .error
            .as_deref()
            .unwrap()
            .contains("deadline"));
    }
}
