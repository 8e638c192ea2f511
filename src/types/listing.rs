// src/types/listing.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A job listing as returned by a source fetcher, collapsed into the common
/// shape shared by all sources. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawListing {
    /// Stable identifier, prefixed with the source name (e.g. "remotive:12345")
    pub id: String,
    pub source: String,
    pub title: String,
    pub organization: String,
    pub location: String,
    pub remote: bool,
    pub description: String,
    pub apply_url: String,
    pub salary_text: Option<String>,
    pub posted_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Seniority level inferred from listing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeniorityLevel {
    Junior,
    Mid,
    Senior,
}

impl fmt::Display for SeniorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeniorityLevel::Junior => write!(f, "junior"),
            SeniorityLevel::Mid => write!(f, "mid"),
            SeniorityLevel::Senior => write!(f, "senior"),
        }
    }
}

impl FromStr for SeniorityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "junior" | "entry" => Ok(SeniorityLevel::Junior),
            "mid" | "intermediate" => Ok(SeniorityLevel::Mid),
            "senior" => Ok(SeniorityLevel::Senior),
            other => Err(format!(
                "Unknown seniority level: {}. Use junior, mid, or senior",
                other
            )),
        }
    }
}

/// Employment type inferred from listing text. Defaults to full-time when
/// nothing in the text says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmploymentType::FullTime => write!(f, "full-time"),
            EmploymentType::PartTime => write!(f, "part-time"),
            EmploymentType::Contract => write!(f, "contract"),
            EmploymentType::Internship => write!(f, "internship"),
        }
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-time" | "fulltime" | "full_time" => Ok(EmploymentType::FullTime),
            "part-time" | "parttime" | "part_time" => Ok(EmploymentType::PartTime),
            "contract" | "freelance" => Ok(EmploymentType::Contract),
            "internship" | "intern" => Ok(EmploymentType::Internship),
            other => Err(format!(
                "Unknown employment type: {}. Use full-time, part-time, contract, or internship",
                other
            )),
        }
    }
}

/// Rough organization size bucket inferred from listing text. Left absent
/// when no keyword matches; never guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrganizationSize {
    Startup,
    MidSize,
    Enterprise,
}

impl fmt::Display for OrganizationSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrganizationSize::Startup => write!(f, "startup"),
            OrganizationSize::MidSize => write!(f, "mid-size"),
            OrganizationSize::Enterprise => write!(f, "enterprise"),
        }
    }
}

impl FromStr for OrganizationSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "startup" => Ok(OrganizationSize::Startup),
            "mid-size" | "midsize" | "mid_size" | "medium" => Ok(OrganizationSize::MidSize),
            "enterprise" | "large" => Ok(OrganizationSize::Enterprise),
            other => Err(format!(
                "Unknown organization size: {}. Use startup, mid-size, or enterprise",
                other
            )),
        }
    }
}

/// A raw listing plus the attributes inferred during normalization.
///
/// Inference reads only `title` and `description`; the embedded raw listing
/// is carried through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedListing {
    #[serde(flatten)]
    pub raw: RawListing,
    pub seniority: Option<SeniorityLevel>,
    pub employment_type: EmploymentType,
    pub organization_size: Option<OrganizationSize>,
    #[serde(default)]
    pub domain_tags: Vec<String>,
}

impl NormalizedListing {
    /// Title and description joined, lower-cased. This is the text every
    /// classifier and the fallback scorer operate on.
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.raw.title, self.raw.description).to_lowercase()
    }
}
