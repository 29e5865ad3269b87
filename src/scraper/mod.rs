//! Sportsbook scraper module
//!
//! Provides the browser session, response capture, payload parsing and
//! normalization into the downstream record schema.

pub mod accumulator;
pub mod archive;
pub mod browser;
pub mod capture;
pub mod catalog;
pub mod normalizer;
pub mod page;
pub mod parsers;
pub mod payload;
pub mod rate_limiter;

pub use accumulator::CaptureReport;
pub use archive::CaptureArchive;
pub use browser::SessionHandle;
pub use capture::CaptureEngine;
pub use catalog::CatalogResolver;
pub use normalizer::Normalizer;
pub use payload::{CapturedPayload, JoinedPayload};

use crate::config::{CaptureConfig, SourceConfig};
use crate::types::Tournament;

/// URL builders for the target site
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base_url: String,
    deep_link_template: String,
    event_template: String,
    section_candidates: Vec<String>,
}

impl SiteUrls {
    pub fn new(source: &SourceConfig, capture: &CaptureConfig) -> Self {
        Self {
            base_url: source.base_url.trim_end_matches('/').to_string(),
            deep_link_template: capture.deep_link_template.clone(),
            event_template: capture.event_template.clone(),
            section_candidates: capture.section_candidates.clone(),
        }
    }

    pub fn home(&self) -> &str {
        &self.base_url
    }

    /// Deep link for a tournament page
    pub fn tournament_url(&self, tournament: &Tournament) -> String {
        let slug = tournament
            .slug
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| slugify(&tournament.name));
        self.deep_link_template
            .replace("{base}", &self.base_url)
            .replace("{slug}", &slug)
            .replace("{id}", &tournament.id.to_string())
    }

    /// Event detail page
    pub fn event_url(&self, event_id: &str) -> String {
        self.event_template
            .replace("{base}", &self.base_url)
            .replace("{event_id}", event_id)
    }

    /// Sport section pages, in the order they should be tried
    pub fn section_candidates(&self) -> Vec<String> {
        self.section_candidates
            .iter()
            .map(|t| t.replace("{base}", &self.base_url))
            .collect()
    }
}

/// URL slug for a tournament name: lowercase alphanumerics joined by '-'.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
