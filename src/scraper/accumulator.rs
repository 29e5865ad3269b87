//! Response admission and per-tournament accumulation.
//!
//! The page observer pushes [`ObservedResponse`]s onto a channel; the
//! capture coordinator drains them into a [`CaptureAccumulator`]. Nothing in
//! here touches the browser, so it can be fed synthetic responses.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

use super::normalizer::MarketKind;
use super::parsers::flat::FlatDocument;
use super::parsers::grouped::GroupedDocument;
use super::payload::{CapturedPayload, JoinedPayload};
use crate::types::TournamentId;

const STATIC_EXTENSIONS: [&str; 17] = [
    ".js", ".mjs", ".css", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".woff",
    ".woff2", ".ttf", ".otf", ".mp4", ".webm", ".map",
];

/// Unmatched responses kept for diagnostics
const MAX_UNMATCHED_KEPT: usize = 50;

/// A network response seen by the page observer
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// Reason a response was not parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    DataUri,
    StaticAsset,
    BadStatus,
    EmptyBody,
    NotJson,
}

fn is_static_asset(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    STATIC_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn is_json_like(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}

fn check_url(url: &str) -> Result<(), Rejection> {
    if url.starts_with("data:") {
        return Err(Rejection::DataUri);
    }
    if is_static_asset(url) {
        return Err(Rejection::StaticAsset);
    }
    Ok(())
}

fn check_status(status: u16) -> Result<(), Rejection> {
    if !(200..300).contains(&status) {
        return Err(Rejection::BadStatus);
    }
    Ok(())
}

fn check_content_type(content_type: Option<&str>) -> Result<(), Rejection> {
    if !is_json_like(content_type) {
        return Err(Rejection::NotJson);
    }
    Ok(())
}

/// Admission checks that need only the response head, in order: data URIs
/// and static assets, then non-2xx status, then non-JSON content type.
pub fn admit_head(url: &str, status: u16, content_type: Option<&str>) -> Result<(), Rejection> {
    check_url(url)?;
    check_status(status)?;
    check_content_type(content_type)
}

/// Full admission: head checks plus the empty-body check.
pub fn admit(response: &ObservedResponse) -> Result<(), Rejection> {
    check_url(&response.url)?;
    check_status(response.status)?;
    if response.body.trim().is_empty() {
        return Err(Rejection::EmptyBody);
    }
    check_content_type(response.content_type.as_deref())
}

/// JSON odds traffic that referenced none of the requested tournaments
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedResponse {
    pub url: String,
    pub shape: &'static str,
    pub tournament_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub observed: usize,
    pub rejected: usize,
    pub parse_failures: usize,
    pub unrecognized: usize,
    pub matched: usize,
    pub unmatched: usize,
}

/// Everything a capture run produced
#[derive(Debug, Clone, Default)]
pub struct CaptureReport {
    pub payloads: BTreeMap<TournamentId, Vec<CapturedPayload>>,
    pub unmatched: Vec<UnmatchedResponse>,
    pub stats: CaptureStats,
}

/// Per-tournament payload accumulator across page loads
#[derive(Debug)]
pub struct CaptureAccumulator {
    targets: BTreeSet<TournamentId>,
    payloads: BTreeMap<TournamentId, Vec<CapturedPayload>>,
    event_owner: HashMap<String, TournamentId>,
    unmatched: Vec<UnmatchedResponse>,
    stats: CaptureStats,
}

impl CaptureAccumulator {
    pub fn new(targets: impl IntoIterator<Item = TournamentId>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            payloads: BTreeMap::new(),
            event_owner: HashMap::new(),
            unmatched: Vec::new(),
            stats: CaptureStats::default(),
        }
    }

    /// Admit, parse and match one response. Never fails: anything that is
    /// not a recognizable odds payload for a requested tournament is
    /// counted and dropped.
    pub fn ingest(&mut self, response: ObservedResponse) {
        self.stats.observed += 1;

        if let Err(reason) = admit(&response) {
            self.stats.rejected += 1;
            debug!("Rejected {} ({:?})", response.url, reason);
            return;
        }

        let body: Value = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) => {
                self.stats.parse_failures += 1;
                debug!("Unparseable JSON from {}: {}", response.url, e);
                return;
            }
        };

        match CapturedPayload::decode(body) {
            Some(CapturedPayload::Grouped(doc)) => self.ingest_grouped(&response.url, doc),
            Some(CapturedPayload::Flat(doc)) => self.ingest_flat(&response.url, doc),
            None => {
                self.stats.unrecognized += 1;
                debug!("Ignoring non-odds JSON from {}", response.url);
            }
        }
    }

    fn target(&self, raw_id: &str) -> Option<TournamentId> {
        raw_id
            .parse::<TournamentId>()
            .ok()
            .filter(|id| self.targets.contains(id))
    }

    fn ingest_grouped(&mut self, url: &str, doc: GroupedDocument) {
        let Some(id) = self.target(doc.tournament_id()) else {
            self.record_unmatched(url, "grouped", vec![doc.tournament_id().to_string()]);
            return;
        };
        for event in &doc.event_group.events {
            self.event_owner.insert(event.event_id.clone(), id);
        }
        self.push(id, CapturedPayload::Grouped(doc));
    }

    fn ingest_flat(&mut self, url: &str, doc: FlatDocument) {
        let mut matched = false;
        let mut covered: HashSet<String> = HashSet::new();
        let league_ids = doc.league_ids();

        for league in &league_ids {
            let Some(id) = self.target(league) else {
                continue;
            };
            let slice = doc.slice_for_league(league);
            for event in &slice.events {
                covered.insert(event.id.clone());
                self.event_owner.insert(event.id.clone(), id);
            }
            self.push(id, CapturedPayload::Flat(slice));
            matched = true;
        }

        // Detail pages can return markets for events seen on an earlier page
        let mut by_owner: BTreeMap<TournamentId, HashSet<String>> = BTreeMap::new();
        for market in &doc.markets {
            if covered.contains(&market.event_id) {
                continue;
            }
            if let Some(owner) = self.event_owner.get(&market.event_id) {
                by_owner
                    .entry(*owner)
                    .or_default()
                    .insert(market.event_id.clone());
            }
        }
        for (owner, event_ids) in by_owner {
            let slice = doc.slice_for_events(&event_ids);
            if !slice.is_empty() {
                self.push(owner, CapturedPayload::Flat(slice));
                matched = true;
            }
        }

        if !matched {
            self.record_unmatched(url, "flat", league_ids);
        }
    }

    fn push(&mut self, id: TournamentId, payload: CapturedPayload) {
        self.stats.matched += 1;
        let entry = self.payloads.entry(id).or_default();
        entry.push(payload);
        debug!("Captured payload #{} for tournament {}", entry.len(), id);
    }

    fn record_unmatched(&mut self, url: &str, shape: &'static str, tournament_ids: Vec<String>) {
        self.stats.unmatched += 1;
        debug!(
            "Odds payload from {} matched no requested tournament (ids: {:?})",
            url, tournament_ids
        );
        if self.unmatched.len() < MAX_UNMATCHED_KEPT {
            self.unmatched.push(UnmatchedResponse {
                url: url.to_string(),
                shape,
                tournament_ids,
            });
        }
    }

    pub fn is_satisfied(&self, id: TournamentId) -> bool {
        self.payloads.get(&id).map(|p| !p.is_empty()).unwrap_or(false)
    }

    pub fn all_satisfied(&self) -> bool {
        self.targets.iter().all(|id| self.is_satisfied(*id))
    }

    pub fn missing(&self) -> Vec<TournamentId> {
        self.targets
            .iter()
            .copied()
            .filter(|id| !self.is_satisfied(*id))
            .collect()
    }

    /// Total payloads accumulated so far.
    pub fn payload_count(&self) -> usize {
        self.payloads.values().map(Vec::len).sum()
    }

    /// Captured events with no spread or no total market yet, in capture order.
    pub fn events_lacking_lines(&self) -> Vec<String> {
        let mut lacking = Vec::new();
        for payloads in self.payloads.values() {
            let joined = JoinedPayload::from_payloads(payloads);
            for event in joined.events() {
                let kinds: Vec<MarketKind> = joined
                    .markets_for(&event.id)
                    .iter()
                    .filter_map(|m| MarketKind::classify(&m.name))
                    .collect();
                if !kinds.contains(&MarketKind::Spread) || !kinds.contains(&MarketKind::Total) {
                    lacking.push(event.id.clone());
                }
            }
        }
        lacking
    }

    pub fn into_report(self) -> CaptureReport {
        info!(
            "Capture finished: {} responses observed, {} payloads matched, {} unmatched, {} rejected, {} unparseable",
            self.stats.observed,
            self.stats.matched,
            self.stats.unmatched,
            self.stats.rejected,
            self.stats.parse_failures
        );
        CaptureReport {
            payloads: self.payloads,
            unmatched: self.unmatched,
            stats: self.stats,
        }
    }
}
