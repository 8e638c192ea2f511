// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::search::SearchService;
use crate::sources::SourceRegistry;
use crate::streaming::{LogSink, StreamingSink};
use crate::types::{
    CandidateProfile, EmploymentType, MatchResult, OrganizationSize, SearchOptions, SeniorityLevel,
};

#[derive(Parser)]
#[command(name = "jobscout")]
#[command(about = "Aggregate, filter and rank job listings against a candidate profile")]
pub struct JobscoutCli {
    #[command(subcommand)]
    pub command: JobscoutCommand,
}

#[derive(Subcommand)]
pub enum JobscoutCommand {
    /// Search all configured sources and rank the results
    Search {
        /// Search query, e.g. "rust engineer"
        query: String,

        /// Location constraint, e.g. "Berlin"
        #[arg(long)]
        location: Option<String>,

        /// Remote filter: true = remote only, false = on-site only,
        /// absent = no constraint
        #[arg(long)]
        remote: Option<bool>,

        /// Seniority constraint: junior, mid, or senior
        #[arg(long)]
        seniority: Option<String>,

        /// Employment type constraint: full-time, part-time, contract,
        /// or internship
        #[arg(long)]
        employment_type: Option<String>,

        /// Organization size constraint: startup, mid-size, or enterprise
        #[arg(long)]
        organization_size: Option<String>,

        /// Domain constraint, e.g. fintech
        #[arg(long)]
        domain: Option<String>,

        #[arg(long)]
        salary_min: Option<u64>,

        #[arg(long)]
        salary_max: Option<u64>,

        /// Candidate profile TOML file
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Minimum score at which results stream as they are computed
        #[arg(long, default_value_t = 70)]
        threshold: u8,

        /// Write the ranked results to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// List configured sources and the ones skipped by configuration gaps
    Sources,
}

pub async fn handle_command(cli: JobscoutCli) -> Result<()> {
    let config = AppConfig::from_env();

    match cli.command {
        JobscoutCommand::Search {
            query,
            location,
            remote,
            seniority,
            employment_type,
            organization_size,
            domain,
            salary_min,
            salary_max,
            profile,
            threshold,
            csv,
        } => {
            let options = build_options(
                query,
                location,
                remote,
                seniority,
                employment_type,
                organization_size,
                domain,
                salary_min,
                salary_max,
            )?;

            let candidate = match profile {
                Some(path) => CandidateProfile::from_toml_file(&path)?,
                None => {
                    info!("No profile file given; ranking with an empty profile");
                    CandidateProfile::default()
                }
            };

            let sink: Arc<dyn StreamingSink> = Arc::new(LogSink);
            let service = SearchService::from_config(&config, sink).await?;

            let process_name = format!("search-{}", Uuid::new_v4());
            let control = service.control_handle();
            control.start(&process_name);

            // Ctrl-C flags the process; the pipeline notices at its next
            // suspension point and returns partial results.
            let stop_control = control.clone();
            let stop_name = process_name.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupt received, stopping search");
                    stop_control.request_stop(&stop_name);
                }
            });

            let outcome = service
                .search(&options, &candidate, threshold, &process_name)
                .await;

            println!(
                "✓ {} results ({} streamed, stopped: {})",
                outcome.results.len(),
                outcome.streamed,
                outcome.stopped
            );
            for status in &outcome.source_statuses {
                match (&status.count, &status.error) {
                    (Some(count), _) => println!("  {} → {} listings", status.name, count),
                    (None, Some(error)) => println!("  {} → failed: {}", status.name, error),
                    (None, None) => println!("  {} → no outcome recorded", status.name),
                }
            }

            for result in outcome.results.iter().take(20) {
                println!(
                    "  [{:>3}] {} at {} ({})",
                    result.score,
                    result.listing.raw.title,
                    result.listing.raw.organization,
                    result.listing.raw.apply_url
                );
            }

            if let Some(path) = csv {
                write_csv(&path, &outcome.results)?;
                println!("✓ Results written to {}", path.display());
            }
        }

        JobscoutCommand::Sources => {
            let registry = SourceRegistry::from_config(&config)?;
            println!("Configured sources:");
            for fetcher in registry.fetchers() {
                println!("  {} (timeout {}s)", fetcher.name(), fetcher.timeout().as_secs());
            }
            if !registry.skipped().is_empty() {
                println!("Skipped sources:");
                for (name, reason) in registry.skipped() {
                    println!("  {} → {}", name, reason);
                }
            }
        }
    }

    Ok(())
}

fn build_options(
    query: String,
    location: Option<String>,
    remote: Option<bool>,
    seniority: Option<String>,
    employment_type: Option<String>,
    organization_size: Option<String>,
    domain: Option<String>,
    salary_min: Option<u64>,
    salary_max: Option<u64>,
) -> Result<SearchOptions> {
    let mut options = SearchOptions::new(query);
    options.location = location;
    options.remote_only = remote;
    options.domain = domain;
    options.salary_min = salary_min;
    options.salary_max = salary_max;

    if let Some(level) = seniority {
        options.seniority = Some(level.parse::<SeniorityLevel>().map_err(anyhow::Error::msg)?);
    }
    if let Some(kind) = employment_type {
        options.employment_type = Some(kind.parse::<EmploymentType>().map_err(anyhow::Error::msg)?);
    }
    if let Some(size) = organization_size {
        options.organization_size =
            Some(size.parse::<OrganizationSize>().map_err(anyhow::Error::msg)?);
    }

    Ok(options)
}

fn write_csv(path: &PathBuf, results: &[MatchResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    writer.write_record([
        "score",
        "title",
        "organization",
        "location",
        "remote",
        "seniority",
        "employment_type",
        "source",
        "apply_url",
    ])?;

    for result in results {
        let listing = &result.listing;
        writer.write_record([
            result.score.to_string(),
            listing.raw.title.clone(),
            listing.raw.organization.clone(),
            listing.raw.location.clone(),
            listing.raw.remote.to_string(),
            listing
                .seniority
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unspecified".to_string()),
            listing.employment_type.to_string(),
            listing.raw.source.clone(),
            listing.raw.apply_url.clone(),
        ])?;
    }

    writer.flush().context("Failed to flush CSV file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_options_parses_enums() {
        let options = build_options(
            "rust".to_string(),
            Some("Berlin".to_string()),
            Some(true),
            Some("senior".to_string()),
            Some("full-time".to_string()),
            Some("startup".to_string()),
            None,
            Some(90_000),
            None,
        )
        .unwrap();

        assert_eq!(options.seniority, Some(SeniorityLevel::Senior));
        assert_eq!(options.employment_type, Some(EmploymentType::FullTime));
        assert_eq!(options.organization_size, Some(OrganizationSize::Startup));
        assert_eq!(options.remote_only, Some(true));
    }

    #[test]
    fn test_build_options_rejects_unknown_seniority() {
        let result = build_options(
            "rust".to_string(),
            None,
            None,
            Some("wizard".to_string()),
            None,
            None,
            None,
            None,
            None,
        );
        assert!(result.is_err());
    }
}
