// src/streaming.rs
//! Streaming sink contract.
//!
//! The pipeline publishes two event kinds: progress lines and individual
//! match results that cleared the streaming threshold. Emission is
//! fire-and-forget; the core never waits on, or hears back from, the sink.
//! Transport adapters (SSE, websockets, message bus) live outside the core.

use serde::Serialize;
use tracing::info;

use crate::types::MatchResult;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum StreamEvent {
    Progress { message: String },
    Match { result: Box<MatchResult> },
}

impl StreamEvent {
    pub fn progress(message: impl Into<String>) -> Self {
        StreamEvent::Progress {
            message: message.into(),
        }
    }

    pub fn matched(result: MatchResult) -> Self {
        StreamEvent::Match {
            result: Box::new(result),
        }
    }
}

pub trait StreamingSink: Send + Sync {
    fn emit(&self, event: StreamEvent);
}

/// Sink that relays events to the tracing log. The default for the CLI.
pub struct LogSink;

impl StreamingSink for LogSink {
    fn emit(&self, event: StreamEvent) {
        match event {
            StreamEvent::Progress { message } => info!("{}", message),
            StreamEvent::Match { result } => info!(
                "Match [{}] {} at {} ({})",
                result.score, result.listing.raw.title, result.listing.raw.organization, result.listing.raw.apply_url
            ),
        }
    }
}

/// Sink that drops everything. For callers that only want the final list.
pub struct NullSink;

impl StreamingSink for NullSink {
    fn emit(&self, _event: StreamEvent) {}
}
