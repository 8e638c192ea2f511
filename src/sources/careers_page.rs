// src/sources/careers_page.rs
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{info, warn};

use super::SourceFetcher;
use crate::error::{SourceError, SourceResult};
use crate::types::RawListing;

/// Scrapes configured company careers pages. Tries known posting selectors
/// first and falls back to treating the whole page as one listing.
pub struct CareersPageFetcher {
    client: Client,
    urls: Vec<String>,
    timeout: Duration,
}

impl CareersPageFetcher {
    pub fn new(urls: Vec<String>, timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            urls,
            timeout,
        })
    }

    fn parse_page(&self, html: &str, page_url: &str, query: &str) -> Vec<RawListing> {
        let document = Html::parse_document(html);
        let organization = Self::page_organization(&document, page_url);

        let mut listings = self.parse_posting_elements(&document, page_url, &organization);
        if listings.is_empty() {
            warn!("No posting elements on {}, falling back to whole page", page_url);
            listings = self
                .parse_whole_page(&document, page_url, &organization)
                .into_iter()
                .collect();
        }

        let tokens: Vec<String> = query
            .split_whitespace()
            .filter(|t| t.len() > 2)
            .map(|t| t.to_lowercase())
            .collect();
        if tokens.is_empty() {
            return listings;
        }

        listings
            .into_iter()
            .filter(|l| {
                let haystack = format!("{} {}", l.title, l.description).to_lowercase();
                tokens.iter().any(|t| haystack.contains(t))
            })
            .collect()
    }

    fn parse_posting_elements(
        &self,
        document: &Html,
        page_url: &str,
        organization: &str,
    ) -> Vec<RawListing> {
        let posting_selectors = [
            ".job-posting",
            "li.opening",
            ".posting",
            "[class*='job-listing']",
            "[class*='careers-item']",
        ];

        let title_selectors = ["h2", "h3", "[class*='title']", "a"];
        let location_selectors = ["[class*='location']", "[class*='office']"];

        let mut listings = Vec::new();
        for selector_str in &posting_selectors {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };

            for (index, element) in document.select(&selector).enumerate() {
                let Some(title) = Self::find_text_by_selectors(&element, &title_selectors) else {
                    continue;
                };

                let location = Self::find_text_by_selectors(&element, &location_selectors)
                    .unwrap_or_default();
                let apply_url = Self::find_link(&element, page_url);
                let description =
                    Self::clean_fragment(&element.text().collect::<Vec<_>>().join(" "));

                listings.push(RawListing {
                    id: format!("careers:{}:{}", page_url, index),
                    source: "careers-page".to_string(),
                    title,
                    organization: organization.to_string(),
                    remote: location.to_lowercase().contains("remote"),
                    location,
                    description,
                    apply_url,
                    salary_text: None,
                    posted_at: Utc::now(),
                    tags: Vec::new(),
                });
            }

            if !listings.is_empty() {
                break;
            }
        }

        listings
    }

    fn parse_whole_page(
        &self,
        document: &Html,
        page_url: &str,
        organization: &str,
    ) -> Option<RawListing> {
        let title_selectors = ["h1", "[class*='title']", "[class*='position']"];
        let description_selectors = ["[class*='description']", "main", "article", "body"];

        let root = document.root_element();
        let title = Self::find_text_by_selectors(&root, &title_selectors)?;
        let description = Self::find_text_by_selectors(&root, &description_selectors)?;

        Some(RawListing {
            id: format!("careers:{}:0", page_url),
            source: "careers-page".to_string(),
            title,
            organization: organization.to_string(),
            location: String::new(),
            remote: false,
            description,
            apply_url: page_url.to_string(),
            salary_text: None,
            posted_at: Utc::now(),
            tags: Vec::new(),
        })
    }

    fn page_organization(document: &Html, page_url: &str) -> String {
        if let Ok(selector) = Selector::parse("title") {
            if let Some(element) = document.select(&selector).next() {
                let text = Self::clean_fragment(&element.text().collect::<Vec<_>>().join(" "));
                if !text.is_empty() {
                    // "Careers at Acme" style page titles; first segment is enough.
                    return text
                        .split(['|', '-', '–'])
                        .next()
                        .unwrap_or(&text)
                        .trim()
                        .to_string();
                }
            }
        }

        page_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .split('/')
            .next()
            .unwrap_or(page_url)
            .to_string()
    }

    fn find_text_by_selectors(element: &ElementRef<'_>, selectors: &[&str]) -> Option<String> {
        for selector_str in selectors {
            if let Ok(selector) = Selector::parse(selector_str) {
                if let Some(found) = element.select(&selector).next() {
                    let text = Self::clean_fragment(&found.text().collect::<Vec<_>>().join(" "));
                    if !text.is_empty() && text.len() > 5 {
                        return Some(text);
                    }
                }
            }
        }
        None
    }

    fn find_link(element: &ElementRef<'_>, page_url: &str) -> String {
        if let Ok(selector) = Selector::parse("a[href]") {
            if let Some(anchor) = element.select(&selector).next() {
                if let Some(href) = anchor.value().attr("href") {
                    if href.starts_with("http") {
                        return href.to_string();
                    }
                    let base = page_url.trim_end_matches('/');
                    return format!("{}/{}", base, href.trim_start_matches('/'));
                }
            }
        }
        page_url.to_string()
    }

    fn clean_fragment(text: &str) -> String {
        text.lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl SourceFetcher for CareersPageFetcher {
    fn name(&self) -> &str {
        "careers-page"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self, query: &str, _location: Option<&str>) -> SourceResult<Vec<RawListing>> {
        let mut listings = Vec::new();

        for url in &self.urls {
            info!("Scraping careers page: {}", url);

            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    status: status.as_u16(),
                    body: format!("careers page {}", url),
                });
            }

            let html = response.text().await?;
            let mut page_listings = self.parse_page(&html, url, query);
            if page_listings.is_empty() {
                warn!("No listings extracted from {}", url);
            }
            listings.append(&mut page_listings);
        }

        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> CareersPageFetcher {
        CareersPageFetcher::new(vec![], Duration::from_secs(5)).unwrap()
    }

    const PAGE: &str = r#"
        <html>
          <head><title>Careers at Acme | Join us</title></head>
          <body>
            <ul>
              <li class="opening">
                <h3>Senior Rust Engineer</h3>
                <span class="location">Remote - Europe</span>
                <a href="/jobs/rust-engineer">Apply</a>
              </li>
              <li class="opening">
                <h3>Office Manager</h3>
                <span class="location">Berlin</span>
                <a href="/jobs/office-manager">Apply</a>
              </li>
            </ul>
          </body>
        </html>
    "#;

    #[test]
    fn test_parses_posting_elements() {
        let listings = fetcher().parse_page(PAGE, "https://acme.example/careers", "");
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "Senior Rust Engineer");
        assert_eq!(listings[0].organization, "Careers at Acme");
        assert!(listings[0].remote);
        assert_eq!(
            listings[0].apply_url,
            "https://acme.example/careers/jobs/rust-engineer"
        );
        assert!(!listings[1].remote);
    }

    #[test]
    fn test_query_filters_postings() {
        let listings = fetcher().parse_page(PAGE, "https://acme.example/careers", "rust");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "Senior Rust Engineer");
    }

    #[test]
    fn test_whole_page_fallback() {
        let page = r#"
            <html>
              <head><title>Acme</title></head>
              <body>
                <h1>Platform Engineer wanted</h1>
                <main>We are hiring a platform engineer to run our fleet.</main>
              </body>
            </html>
        "#;
        let listings = fetcher().parse_page(page, "https://acme.example/job", "");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "Platform Engineer wanted");
        assert_eq!(listings[0].apply_url, "https://acme.example/job");
    }
}
