// src/normalize/mod.rs
//! Normalization stage: deduplicate, enrich, filter.
//!
//! Three pure, synchronous steps over the aggregated listings. This stage
//! never raises: unmatched or unparseable inputs degrade to unspecified
//! classifications instead of erroring.

pub mod classify;
pub mod filter;

use std::collections::HashSet;
use tracing::debug;

use crate::types::{NormalizedListing, RawListing, SearchOptions};

pub use classify::enrich;
pub use filter::apply_filters;

/// Case- and whitespace-insensitive identity of a listing. Two listings
/// with the same key are the same posting seen through different sources.
pub fn dedup_key(title: &str, organization: &str) -> String {
    let squash = |s: &str| {
        s.to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    };
    format!("{}|{}", squash(title), squash(organization))
}

/// Drop repeated (title, organization) pairs, keeping the first occurrence.
pub fn deduplicate(listings: Vec<RawListing>) -> Vec<RawListing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| seen.insert(dedup_key(&listing.title, &listing.organization)))
        .collect()
}

/// Run the full stage: deduplicate, enrich every survivor, then apply the
/// caller's structured filters.
pub fn normalize(listings: Vec<RawListing>, options: &SearchOptions) -> Vec<NormalizedListing> {
    let before = listings.len();
    let deduplicated = deduplicate(listings);
    debug!(
        "Deduplication: {} -> {} listings",
        before,
        deduplicated.len()
    );

    let enriched: Vec<NormalizedListing> = deduplicated.into_iter().map(enrich).collect();
    let filtered = apply_filters(enriched, options);
    debug!("Filtering left {} listings", filtered.len());

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_listing;

    fn listing(title: &str, organization: &str) -> RawListing {
        let mut raw = sample_listing("test", title);
        raw.title = title.to_string();
        raw.organization = organization.to_string();
        raw
    }

    #[test]
    fn test_dedup_is_case_and_whitespace_insensitive() {
        let listings = vec![
            listing("Senior Rust Engineer", "Acme Corp"),
            listing("senior  rust engineer", "ACME CORP"),
            listing("Senior Rust Engineer", "Other Corp"),
        ];

        let deduplicated = deduplicate(listings);
        assert_eq!(deduplicated.len(), 2);
        // First occurrence wins.
        assert_eq!(deduplicated[0].organization, "Acme Corp");
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let listings = vec![
            listing("Engineer", "Acme"),
            listing("engineer", "acme"),
            listing("Designer", "Acme"),
        ];

        let once = deduplicate(listings);
        let twice = deduplicate(once.clone());

        assert_eq!(once.len(), twice.len());
        let ids: Vec<&str> = once.iter().map(|l| l.id.as_str()).collect();
        let ids_twice: Vec<&str> = twice.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ids_twice);
    }

    #[test]
    fn test_normalize_composes_all_three_steps() {
        let mut remote = listing("Senior Rust Engineer", "Acme");
        remote.remote = true;
        let mut remote_dup = listing("SENIOR RUST ENGINEER", "acme");
        remote_dup.remote = true;
        let mut onsite = listing("Senior Go Engineer", "Beta");
        onsite.remote = false;

        let mut options = SearchOptions::new("engineer");
        options.remote_only = Some(true);

        let normalized = normalize(vec![remote, remote_dup, onsite], &options);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].raw.organization, "Acme");
        assert_eq!(
            normalized[0].seniority,
            Some(crate::types::SeniorityLevel::Senior)
        );
    }
}
