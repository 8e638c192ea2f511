// src/error.rs
//! Typed errors for the aggregation pipeline.
//!
//! Source and oracle failures are expected conditions: they are recorded
//! per-source / per-listing and never fail the overall search call.

use thiserror::Error;

/// Failure of a single source fetcher. Non-fatal; the aggregation pipeline
/// records it in the source status report and keeps going.
///
/// "No results" is not an error: fetchers return an empty list for that.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP transport failed (connect, TLS, read)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The source rejected our credentials
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The source returned a non-success status
    #[error("source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be interpreted
    #[error("failed to parse source response: {0}")]
    Parse(String),

    /// The fetcher exceeded its own timeout budget
    #[error("source timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Failure of one scoring oracle call. Non-fatal; the scoring engine falls
/// back to the deterministic scorer for that listing only.
#[derive(Debug, Error)]
pub enum OracleError {
    /// No oracle is configured for this deployment
    #[error("scoring oracle not configured")]
    Unconfigured,

    /// HTTP transport failed or timed out
    #[error("oracle transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The oracle returned a non-success status
    #[error("oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The oracle replied but the payload was not the expected structure
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
pub type OracleResult<T> = std::result::Result<T, OracleError>;
