// src/normalize/filter.rs
//! Structured filtering over normalized listings.
//!
//! Every present `SearchOptions` field is an AND predicate. Unknown salary
//! passes the salary bounds; every other constraint requires the inferred
//! attribute to actually match, so adding a constraint can only shrink the
//! result set.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{NormalizedListing, SearchOptions};

static SALARY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([kK])?").expect("salary pattern is valid")
});

pub fn apply_filters(
    listings: Vec<NormalizedListing>,
    options: &SearchOptions,
) -> Vec<NormalizedListing> {
    listings
        .into_iter()
        .filter(|listing| passes(listing, options))
        .collect()
}

fn passes(listing: &NormalizedListing, options: &SearchOptions) -> bool {
    remote_matches(listing, options)
        && location_matches(listing, options)
        && salary_matches(listing, options)
        && organization_size_matches(listing, options)
        && domain_matches(listing, options)
        && seniority_matches(listing, options)
        && employment_matches(listing, options)
}

fn remote_matches(listing: &NormalizedListing, options: &SearchOptions) -> bool {
    match options.remote_only {
        None => true,
        Some(true) => listing.raw.remote,
        Some(false) => !listing.raw.remote,
    }
}

fn location_matches(listing: &NormalizedListing, options: &SearchOptions) -> bool {
    let Some(wanted) = options.location.as_deref() else {
        return true;
    };

    let tokens: Vec<String> = wanted
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(|t| t.to_lowercase())
        .collect();
    if tokens.is_empty() {
        return true;
    }

    let listing_location = listing.raw.location.to_lowercase();
    if tokens.iter().any(|t| listing_location.contains(t)) {
        return true;
    }

    // A remote listing satisfies any location unless remote was excluded.
    listing.raw.remote && options.remote_only != Some(false)
}

/// First number in the salary text, comma-stripped, with a `k` suffix read
/// as thousands. None when the text is absent or carries no number.
pub fn parse_salary(salary_text: &str) -> Option<u64> {
    let caps = SALARY_PATTERN.captures(salary_text)?;
    let digits = caps.get(1)?.as_str().replace(',', "");
    let amount: f64 = digits.parse().ok()?;

    let amount = if caps.get(2).is_some() {
        amount * 1_000.0
    } else {
        amount
    };

    Some(amount as u64)
}

fn salary_matches(listing: &NormalizedListing, options: &SearchOptions) -> bool {
    if options.salary_min.is_none() && options.salary_max.is_none() {
        return true;
    }

    // Salary unknown is not salary excluded.
    let Some(salary) = listing.raw.salary_text.as_deref().and_then(parse_salary) else {
        return true;
    };

    if let Some(min) = options.salary_min {
        if salary < min {
            return false;
        }
    }
    if let Some(max) = options.salary_max {
        if salary > max {
            return false;
        }
    }
    true
}

fn organization_size_matches(listing: &NormalizedListing, options: &SearchOptions) -> bool {
    match options.organization_size {
        None => true,
        Some(size) => listing.organization_size == Some(size),
    }
}

fn domain_matches(listing: &NormalizedListing, options: &SearchOptions) -> bool {
    match options.domain.as_deref() {
        None => true,
        Some(domain) => listing
            .domain_tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(domain)),
    }
}

fn seniority_matches(listing: &NormalizedListing, options: &SearchOptions) -> bool {
    match options.seniority {
        None => true,
        Some(level) => listing.seniority == Some(level),
    }
}

fn employment_matches(listing: &NormalizedListing, options: &SearchOptions) -> bool {
    match options.employment_type {
        None => true,
        Some(kind) => listing.employment_type == kind,
    }
}
