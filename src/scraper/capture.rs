//! Capture coordinator: drives page navigations and drains observed
//! responses into the accumulator.

use tokio::time::{timeout, timeout_at, Duration, Instant};
use tracing::{debug, info, warn};

use super::accumulator::{CaptureAccumulator, CaptureReport};
use super::page::{CapturePage, ResponseObserver};
use super::parsers::find_sport_link;
use super::rate_limiter::RateLimiter;
use super::SiteUrls;
use crate::config::{CaptureConfig, NavigationStrategy, SourceConfig};
use crate::error::{HarvestError, Result};
use crate::types::Tournament;

/// Runs the navigation strategies for one cycle
pub struct CaptureEngine {
    settings: CaptureConfig,
    urls: SiteUrls,
    sport_name: String,
    limiter: RateLimiter,
}

impl CaptureEngine {
    pub fn new(source: &SourceConfig, settings: &CaptureConfig) -> Self {
        Self {
            settings: settings.clone(),
            urls: SiteUrls::new(source, settings),
            sport_name: source.sport_name.clone(),
            limiter: RateLimiter::from_config(settings),
        }
    }

    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.navigation_timeout_secs)
    }

    fn settle_window(&self) -> Duration {
        Duration::from_secs(self.settings.settle_delay_secs)
    }

    /// Capture odds payloads for the given tournaments.
    ///
    /// Navigation failures are logged and skipped; whatever was captured is
    /// returned. Only failing to attach the response observer is an error.
    pub async fn capture<P>(&self, page: &P, tournaments: &[Tournament]) -> Result<CaptureReport>
    where
        P: CapturePage + ?Sized,
    {
        let mut acc = CaptureAccumulator::new(tournaments.iter().map(|t| t.id));
        if tournaments.is_empty() {
            return Ok(acc.into_report());
        }

        let mut observer = page.observe().await?;

        for strategy in &self.settings.primary_strategies {
            if acc.all_satisfied() {
                break;
            }
            debug!("Running {:?} strategy", strategy);
            match strategy {
                NavigationStrategy::DeepLink => {
                    self.deep_link(page, tournaments, &mut observer, &mut acc)
                        .await
                }
                NavigationStrategy::LinkDiscovery => {
                    self.link_discovery(page, &mut observer, &mut acc).await
                }
                NavigationStrategy::SectionCandidates => {
                    self.section_candidates(page, &mut observer, &mut acc)
                        .await
                }
            }
        }

        let deep_link_ran = self
            .settings
            .primary_strategies
            .contains(&NavigationStrategy::DeepLink);
        if self.settings.secondary_deep_link && !deep_link_ran && !acc.all_satisfied() {
            info!(
                "{} tournament(s) still missing data, trying deep links",
                acc.missing().len()
            );
            self.deep_link(page, tournaments, &mut observer, &mut acc)
                .await;
        }

        if self.settings.event_detail_pass {
            self.detail_pass(page, &mut observer, &mut acc).await;
        }

        observer.close();

        for id in acc.missing() {
            if let Some(t) = tournaments.iter().find(|t| t.id == id) {
                warn!("No odds captured for {} ({})", t.name, t.id);
            }
        }

        Ok(acc.into_report())
    }

    async fn deep_link<P>(
        &self,
        page: &P,
        tournaments: &[Tournament],
        observer: &mut ResponseObserver,
        acc: &mut CaptureAccumulator,
    ) where
        P: CapturePage + ?Sized,
    {
        for tournament in tournaments {
            if acc.is_satisfied(tournament.id) {
                continue;
            }
            let url = self.urls.tournament_url(tournament);
            self.visit(page, &url, observer, acc).await;
        }
    }

    async fn link_discovery<P>(
        &self,
        page: &P,
        observer: &mut ResponseObserver,
        acc: &mut CaptureAccumulator,
    ) where
        P: CapturePage + ?Sized,
    {
        let home = self.urls.home().to_string();
        if !self.visit(page, &home, observer, acc).await {
            return;
        }

        let html = match page.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Could not read page content of {}: {}", home, e);
                return;
            }
        };
        let Some(link) = find_sport_link(&html, &self.sport_name) else {
            warn!("No '{}' link found on {}", self.sport_name, home);
            return;
        };

        info!("Following '{}' link ({})", link.text, link.href);
        self.limiter.acquire().await;
        match timeout(self.navigation_timeout(), page.click(&link.selector())).await {
            Ok(Ok(())) => self.drain(observer, acc, self.settle_window()).await,
            Ok(Err(e)) => {
                debug!("Click on '{}' failed ({}), navigating directly", link.text, e);
                let url = link.absolute_url(&home);
                self.visit(page, &url, observer, acc).await;
            }
            Err(_) => warn!(
                "Click on '{}' timed out after {}s",
                link.text, self.settings.navigation_timeout_secs
            ),
        }
    }

    async fn section_candidates<P>(
        &self,
        page: &P,
        observer: &mut ResponseObserver,
        acc: &mut CaptureAccumulator,
    ) where
        P: CapturePage + ?Sized,
    {
        for url in self.urls.section_candidates() {
            if acc.all_satisfied() {
                break;
            }
            let before = acc.payload_count();
            self.visit(page, &url, observer, acc).await;
            if acc.payload_count() > before {
                break;
            }
        }
    }

    async fn detail_pass<P>(
        &self,
        page: &P,
        observer: &mut ResponseObserver,
        acc: &mut CaptureAccumulator,
    ) where
        P: CapturePage + ?Sized,
    {
        let events = acc.events_lacking_lines();
        if events.is_empty() {
            return;
        }
        info!(
            "Visiting up to {} of {} event page(s) for missing lines",
            self.settings.max_detail_pages,
            events.len()
        );
        for event_id in events.iter().take(self.settings.max_detail_pages) {
            let url = self.urls.event_url(event_id);
            self.visit(page, &url, observer, acc).await;
        }
    }

    /// Navigate and wait out the settle window. Returns whether the
    /// navigation itself succeeded.
    async fn visit<P>(
        &self,
        page: &P,
        url: &str,
        observer: &mut ResponseObserver,
        acc: &mut CaptureAccumulator,
    ) -> bool
    where
        P: CapturePage + ?Sized,
    {
        self.limiter.acquire().await;
        info!("Navigating to {}", url);

        let outcome = match timeout(self.navigation_timeout(), page.goto(url)).await {
            Ok(result) => result,
            Err(_) => Err(HarvestError::NavigationTimeout {
                url: url.to_string(),
                secs: self.settings.navigation_timeout_secs,
            }),
        };

        match outcome {
            Ok(()) => {
                self.drain(observer, acc, self.settle_window()).await;
                true
            }
            Err(e) => {
                warn!("Navigation failed: {}", e);
                self.drain(observer, acc, Duration::ZERO).await;
                false
            }
        }
    }

    /// Feed observed responses to the accumulator until the window closes.
    /// A zero window only takes what is already buffered.
    async fn drain(
        &self,
        observer: &mut ResponseObserver,
        acc: &mut CaptureAccumulator,
        window: Duration,
    ) {
        let deadline = Instant::now() + window;
        loop {
            match timeout_at(deadline, observer.recv()).await {
                Ok(Some(response)) => acc.ingest(response),
                Ok(None) => {
                    debug!("Response observer closed");
                    break;
                }
                Err(_) => break,
            }
        }
    }
}
