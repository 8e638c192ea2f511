// src/types/search.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::listing::{EmploymentType, NormalizedListing, OrganizationSize, SeniorityLevel};

/// Structured search criteria. Every filter field is optional; an absent
/// field means "no constraint".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    pub query: String,
    pub location: Option<String>,
    /// Tri-state: None = no constraint, Some(true) = remote only,
    /// Some(false) = on-site only.
    pub remote_only: Option<bool>,
    pub organization_size: Option<OrganizationSize>,
    pub domain: Option<String>,
    pub salary_min: Option<u64>,
    pub salary_max: Option<u64>,
    pub seniority: Option<SeniorityLevel>,
    pub employment_type: Option<EmploymentType>,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// Candidate profile the listings are ranked against. Read-only input,
/// produced upstream by the CV analysis pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub desired_titles: Vec<String>,
    pub years_of_experience: Option<u32>,
    pub seniority: Option<SeniorityLevel>,
    pub current_title: Option<String>,
}

impl CandidateProfile {
    /// Load a profile from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse profile file: {}", path.display()))
    }
}

/// Which half of the hybrid scoring strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreSource {
    Oracle,
    Fallback,
}

/// A scored listing. `score` is always within 0..=100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub listing: NormalizedListing,
    pub score: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub rationale: String,
    pub scored_by: ScoreSource,
}

/// Per-source outcome of one aggregation run. Either `count` or `error`
/// is set, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStatus {
    pub name: String,
    pub succeeded: bool,
    pub count: Option<usize>,
    pub error: Option<String>,
}

impl SourceStatus {
    pub fn ok(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            succeeded: true,
            count: Some(count),
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            succeeded: false,
            count: None,
            error: Some(error.into()),
        }
    }
}

/// Final response of one search call. `stopped` is true when cancellation
/// truncated the pipeline; results are then partial, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<MatchResult>,
    pub stopped: bool,
    pub source_statuses: Vec<SourceStatus>,
    pub processed: usize,
    pub streamed: usize,
}
