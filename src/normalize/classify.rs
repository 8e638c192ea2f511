// src/normalize/classify.rs
//! Heuristic text classifiers for the enrichment step.
//!
//! Everything here reads only the listing title and description. When no
//! keyword matches, seniority and organization size stay absent rather
//! than guessed; employment type alone defaults to full-time.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::types::{EmploymentType, NormalizedListing, OrganizationSize, RawListing, SeniorityLevel};

static YEARS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2})\s*\+?\s*(?:years?|yrs?)").expect("years pattern is valid")
});

const SENIOR_KEYWORDS: &[&str] = &["senior", "staff", "principal", "lead"];
const JUNIOR_KEYWORDS: &[&str] = &["junior", "graduate", "entry", "trainee"];
const MID_KEYWORDS: &[&str] = &["mid", "intermediate", "midlevel"];

/// Attach the inferred attributes to a raw listing. The raw fields are
/// carried through untouched.
pub fn enrich(raw: RawListing) -> NormalizedListing {
    let title = raw.title.to_lowercase();
    let description = raw.description.to_lowercase();

    NormalizedListing {
        seniority: classify_seniority(&title, &description),
        employment_type: classify_employment(&title, &description),
        organization_size: classify_organization_size(&description),
        domain_tags: classify_domains(&title, &description),
        raw,
    }
}

fn word_set(text: &str) -> HashSet<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

fn seniority_from_words(words: &HashSet<&str>) -> Option<SeniorityLevel> {
    if SENIOR_KEYWORDS.iter().any(|k| words.contains(k)) {
        return Some(SeniorityLevel::Senior);
    }
    if JUNIOR_KEYWORDS.iter().any(|k| words.contains(k)) {
        return Some(SeniorityLevel::Junior);
    }
    if MID_KEYWORDS.iter().any(|k| words.contains(k)) {
        return Some(SeniorityLevel::Mid);
    }
    None
}

/// Explicit seniority keywords win (title before description); otherwise a
/// years-of-experience figure in the description decides; otherwise the
/// level stays unspecified.
pub fn classify_seniority(title: &str, description: &str) -> Option<SeniorityLevel> {
    if let Some(level) = seniority_from_words(&word_set(title)) {
        return Some(level);
    }
    if let Some(level) = seniority_from_words(&word_set(description)) {
        return Some(level);
    }

    let years: u32 = YEARS_PATTERN
        .captures(description)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())?;

    Some(match years {
        0..=2 => SeniorityLevel::Junior,
        3..=5 => SeniorityLevel::Mid,
        _ => SeniorityLevel::Senior,
    })
}

pub fn classify_employment(title: &str, description: &str) -> EmploymentType {
    let text = format!("{} {}", title, description);
    let words = word_set(&text);

    if words.contains("internship") || words.contains("intern") {
        return EmploymentType::Internship;
    }
    if words.contains("contract") || words.contains("contractor") || words.contains("freelance") {
        return EmploymentType::Contract;
    }
    if text.contains("part-time") || text.contains("part time") {
        return EmploymentType::PartTime;
    }

    EmploymentType::FullTime
}

pub fn classify_organization_size(description: &str) -> Option<OrganizationSize> {
    const STARTUP: &[&str] = &["startup", "start-up", "early-stage", "seed-funded", "series a"];
    const ENTERPRISE: &[&str] = &[
        "enterprise",
        "fortune 500",
        "multinational",
        "publicly traded",
    ];
    const MID_SIZE: &[&str] = &["mid-size", "midsize", "scale-up", "scaleup", "growing company"];

    if STARTUP.iter().any(|k| description.contains(k)) {
        return Some(OrganizationSize::Startup);
    }
    if ENTERPRISE.iter().any(|k| description.contains(k)) {
        return Some(OrganizationSize::Enterprise);
    }
    if MID_SIZE.iter().any(|k| description.contains(k)) {
        return Some(OrganizationSize::MidSize);
    }

    None
}

pub fn classify_domains(title: &str, description: &str) -> Vec<String> {
    const DOMAINS: &[(&str, &[&str])] = &[
        (
            "fintech",
            &["fintech", "banking", "payments", "trading", "financial services"],
        ),
        (
            "healthtech",
            &["healthtech", "healthcare", "medical", "biotech", "pharma"],
        ),
        (
            "ecommerce",
            &["e-commerce", "ecommerce", "marketplace", "retail"],
        ),
        (
            "devtools",
            &["developer tools", "devops", "infrastructure", "observability"],
        ),
        (
            "ai",
            &[
                "machine learning",
                "artificial intelligence",
                "deep learning",
                "llm",
                "data science",
            ],
        ),
        (
            "security",
            &["cybersecurity", "infosec", "application security"],
        ),
        ("gaming", &["gaming", "game studio", "game engine"]),
        ("edtech", &["edtech", "e-learning", "education platform"]),
    ];

    let text = format!("{} {}", title, description);
    DOMAINS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(name, _)| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_listing;

    fn listing_with(title: &str, description: &str) -> RawListing {
        let mut listing = sample_listing("test", "1");
        listing.title = title.to_string();
        listing.description = description.to_string();
        listing
    }

    #[test]
    fn test_title_keyword_beats_description_years() {
        let level = classify_seniority("senior rust engineer", "2 years of experience needed");
        assert_eq!(level, Some(SeniorityLevel::Senior));
    }

    #[test]
    fn test_years_fallback_buckets() {
        assert_eq!(
            classify_seniority("rust engineer", "at least 2 years of experience"),
            Some(SeniorityLevel::Junior)
        );
        assert_eq!(
            classify_seniority("rust engineer", "5+ years building services"),
            Some(SeniorityLevel::Mid)
        );
        assert_eq!(
            classify_seniority("rust engineer", "10 yrs in distributed systems"),
            Some(SeniorityLevel::Senior)
        );
    }

    #[test]
    fn test_no_signal_stays_unspecified() {
        assert_eq!(classify_seniority("rust engineer", "join our team"), None);
    }

    #[test]
    fn test_leadership_is_not_lead() {
        // "leadership" must not trigger the "lead" keyword.
        assert_eq!(
            classify_seniority("engineer", "strong leadership culture here"),
            None
        );
    }

    #[test]
    fn test_employment_type_defaults_to_full_time() {
        assert_eq!(
            classify_employment("rust engineer", "join our team"),
            EmploymentType::FullTime
        );
    }

    #[test]
    fn test_employment_type_keywords() {
        assert_eq!(
            classify_employment("engineer", "6 month contract position"),
            EmploymentType::Contract
        );
        assert_eq!(
            classify_employment("engineering intern", "summer program"),
            EmploymentType::Internship
        );
        assert_eq!(
            classify_employment("engineer", "part-time, 20 hours a week"),
            EmploymentType::PartTime
        );
    }

    #[test]
    fn test_international_is_not_intern() {
        assert_eq!(
            classify_employment("engineer", "international travel required"),
            EmploymentType::FullTime
        );
    }

    #[test]
    fn test_organization_size_absent_without_keywords() {
        assert_eq!(classify_organization_size("we build software"), None);
        assert_eq!(
            classify_organization_size("fast-growing startup in berlin"),
            Some(OrganizationSize::Startup)
        );
        assert_eq!(
            classify_organization_size("a fortune 500 company"),
            Some(OrganizationSize::Enterprise)
        );
    }

    #[test]
    fn test_domain_tags_collect_all_matches() {
        let tags = classify_domains(
            "machine learning engineer",
            "fintech scale-up working on payments",
        );
        assert!(tags.contains(&"ai".to_string()));
        assert!(tags.contains(&"fintech".to_string()));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_enrich_keeps_raw_fields_untouched() {
        let raw = listing_with("Senior Rust Engineer", "Payments startup, 7+ years");
        let original = raw.clone();
        let enriched = enrich(raw);

        assert_eq!(enriched.raw.title, original.title);
        assert_eq!(enriched.raw.description, original.description);
        assert_eq!(enriched.seniority, Some(SeniorityLevel::Senior));
        assert_eq!(enriched.organization_size, Some(OrganizationSize::Startup));
        assert!(enriched.domain_tags.contains(&"fintech".to_string()));
    }
}
