// src/scoring/fallback.rs
//! Deterministic heuristic scorer.
//!
//! Used whenever the oracle is unavailable, and the only scoring path with
//! reproducible output: the same (listing, profile) pair always yields the
//! same assessment.

use super::Assessment;
use crate::types::{CandidateProfile, NormalizedListing};

const SKILL_WEIGHT: f64 = 50.0;
const TITLE_BONUS: f64 = 25.0;
const SENIORITY_BONUS: f64 = 15.0;
const GENERIC_BONUS: f64 = 10.0;

const GENERIC_KEYWORDS: &[&str] = &[
    "engineer",
    "engineering",
    "developer",
    "software",
    "technical",
    "programming",
];

pub fn score(listing: &NormalizedListing, profile: &CandidateProfile) -> Assessment {
    let text = listing.searchable_text();

    let mut matched_skills = Vec::new();
    let mut missing_skills = Vec::new();
    for skill in &profile.skills {
        if text.contains(skill.to_lowercase().as_str()) {
            matched_skills.push(skill.clone());
        } else {
            missing_skills.push(skill.clone());
        }
    }

    let skill_score = if profile.skills.is_empty() {
        0.0
    } else {
        matched_skills.len() as f64 / profile.skills.len() as f64 * SKILL_WEIGHT
    };

    let title_hit = profile
        .desired_titles
        .iter()
        .chain(profile.current_title.iter())
        .filter(|t| !t.trim().is_empty())
        .any(|t| text.contains(t.to_lowercase().as_str()));

    let seniority_hit = listing.seniority.is_some() && listing.seniority == profile.seniority;

    let generic_hit = GENERIC_KEYWORDS.iter().any(|k| text.contains(k));

    let mut total = skill_score;
    if title_hit {
        total += TITLE_BONUS;
    }
    if seniority_hit {
        total += SENIORITY_BONUS;
    }
    if generic_hit {
        total += GENERIC_BONUS;
    }

    let rationale = format!(
        "Heuristic score: {}/{} skills found{}{}{}",
        matched_skills.len(),
        profile.skills.len(),
        if title_hit { ", title match" } else { "" },
        if seniority_hit { ", seniority match" } else { "" },
        if generic_hit {
            ", engineering keywords present"
        } else {
            ""
        },
    );

    Assessment {
        score: total.round().min(100.0) as u8,
        matched_skills,
        missing_skills,
        rationale,
    }
}
