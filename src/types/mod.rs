// src/types/mod.rs
pub mod listing;
pub mod search;

pub use listing::{
    EmploymentType, NormalizedListing, OrganizationSize, RawListing, SeniorityLevel,
};
pub use search::{
    CandidateProfile, MatchResult, ScoreSource, SearchOptions, SearchOutcome, SourceStatus,
};
