//! One harvest cycle: catalog → capture → normalize → publish.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::error::{HarvestError, Result};
use crate::publisher::Publisher;
use crate::scraper::browser::SessionLease;
use crate::scraper::{
    CaptureArchive, CaptureEngine, CaptureReport, CapturedPayload, CatalogResolver, JoinedPayload,
    Normalizer, SessionHandle,
};
use crate::types::{NormalizedMatchRecord, PublishReceipt, Tournament, TournamentId};

/// Operator-facing outcome of a cycle
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub started_at: DateTime<Utc>,
    pub tournaments: Vec<Tournament>,
    /// Tournaments that produced at least one payload
    pub captured: usize,
    pub payloads: usize,
    pub records: Vec<NormalizedMatchRecord>,
    pub receipt: Option<PublishReceipt>,
}

impl CycleSummary {
    fn empty(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            tournaments: Vec::new(),
            captured: 0,
            payloads: 0,
            records: Vec::new(),
            receipt: None,
        }
    }
}

/// Normalize every tournament's captures. Tournaments with nothing captured
/// contribute no records.
pub fn normalize_captures(
    normalizer: &Normalizer,
    tournaments: &[Tournament],
    payloads: &BTreeMap<TournamentId, Vec<CapturedPayload>>,
    now: DateTime<Utc>,
) -> Vec<NormalizedMatchRecord> {
    let mut records = Vec::new();
    for tournament in tournaments {
        let Some(captured) = payloads.get(&tournament.id).filter(|p| !p.is_empty()) else {
            continue;
        };
        let joined = JoinedPayload::from_payloads(captured);
        let normalized = normalizer.normalize(&joined, &tournament.name, now);
        info!(
            "{}: {} record(s) from {} event(s)",
            tournament.name,
            normalized.len(),
            joined.events().len()
        );
        records.extend(normalized);
    }
    records
}

fn log_capture(tournaments: &[Tournament], report: &CaptureReport) {
    for tournament in tournaments {
        let payloads = report
            .payloads
            .get(&tournament.id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if payloads.is_empty() {
            continue;
        }
        let shapes: Vec<&str> = payloads.iter().map(CapturedPayload::shape).collect();
        info!(
            "{}: {} payload(s) captured ({})",
            tournament.name,
            payloads.len(),
            shapes.join(", ")
        );
    }
    for unmatched in &report.unmatched {
        debug!(
            "Unmatched {} payload from {} (ids {:?})",
            unmatched.shape, unmatched.url, unmatched.tournament_ids
        );
    }
}

/// Owns every stage and the shared browser session
pub struct Harvester {
    resolver: CatalogResolver,
    session: SessionHandle,
    engine: CaptureEngine,
    normalizer: Normalizer,
    publisher: Option<Publisher>,
    archive: Option<CaptureArchive>,
}

impl Harvester {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let archive = config
            .archive
            .enabled
            .then(|| CaptureArchive::from_config(&config.archive));
        Ok(Self {
            resolver: CatalogResolver::new(&config.source, &config.catalog, &config.browser)?,
            session: SessionHandle::new(config.browser.clone()),
            engine: CaptureEngine::new(&config.source, &config.capture),
            normalizer: Normalizer::new(&config.source.sport_label, &config.source.id_prefix),
            publisher: Publisher::from_config(&config.publish)?,
            archive,
        })
    }

    /// Run one cycle. With `dry_run` nothing is uploaded.
    ///
    /// Fails with [`HarvestError::CycleInProgress`] if another cycle holds
    /// the session. Any other failure except an upload rejection tears the
    /// browser session down so the next cycle starts clean.
    pub async fn run_cycle(&self, dry_run: bool) -> Result<CycleSummary> {
        let mut lease = self.session.lease()?;
        let started_at = Utc::now();
        info!("Starting harvest cycle");

        match self.cycle(&mut lease, started_at, dry_run).await {
            Ok(summary) => {
                info!(
                    "Cycle finished: {} tournament(s), {} captured, {} payload(s), {} record(s)",
                    summary.tournaments.len(),
                    summary.captured,
                    summary.payloads,
                    summary.records.len()
                );
                Ok(summary)
            }
            Err(e @ HarvestError::PublishStatus { .. }) => {
                error!("Cycle failed: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("Cycle failed: {}; tearing down browser session", e);
                lease.close().await;
                Err(e)
            }
        }
    }

    async fn cycle(
        &self,
        lease: &mut SessionLease<'_>,
        started_at: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<CycleSummary> {
        let tournaments = self.resolver.resolve().await?;
        if tournaments.is_empty() {
            info!("No tournaments to capture this cycle");
            return Ok(CycleSummary::empty(started_at));
        }
        for t in &tournaments {
            info!("  {} ({})", t.name, t.id);
        }

        if lease.is_open() {
            debug!("Reusing open browser session");
        }
        let page = lease.new_page().await?;
        let captured = self.engine.capture(&page, &tournaments).await;
        page.close().await;
        let report = captured?;
        log_capture(&tournaments, &report);

        self.archive_captures(&tournaments, &report);

        let records = normalize_captures(&self.normalizer, &tournaments, &report.payloads, Utc::now());
        info!("Normalized {} record(s)", records.len());

        let receipt = match (&self.publisher, dry_run) {
            (_, true) => {
                info!("Dry run, skipping upload");
                None
            }
            (None, false) => {
                warn!("No upload endpoint configured, records were not published");
                None
            }
            (Some(publisher), false) => publisher.publish(&records).await?,
        };

        Ok(CycleSummary {
            started_at,
            captured: report.payloads.values().filter(|p| !p.is_empty()).count(),
            payloads: report.stats.matched,
            tournaments,
            records,
            receipt,
        })
    }

    fn archive_captures(&self, tournaments: &[Tournament], report: &CaptureReport) {
        let Some(archive) = &self.archive else {
            return;
        };
        for tournament in tournaments {
            let Some(payloads) = report.payloads.get(&tournament.id) else {
                continue;
            };
            if let Err(e) = archive.store(tournament, payloads) {
                warn!("Failed to archive captures for {}: {}", tournament.name, e);
            }
        }
        match archive.prune() {
            Ok(0) => {}
            Ok(n) => info!("Pruned {} expired archive file(s)", n),
            Err(e) => warn!("Failed to prune archive: {}", e),
        }
    }

    /// Close the browser session, waiting for a running cycle first.
    pub async fn shutdown(&self) {
        self.session.close().await;
    }
}
