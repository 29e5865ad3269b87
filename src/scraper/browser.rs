//! Browser session management using chromiumoxide.
//!
//! One long-lived browser is shared across cycles. A cycle leases it
//! exclusively; a second concurrent lease is refused rather than queued.

use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig as ChromeConfig};
use futures::StreamExt;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use super::page::ChromiumPage;
use crate::config::BrowserConfig;
use crate::error::{HarvestError, Result};
use crate::retry::{retry_when, RetryConfig};

/// A launched browser process and its CDP handler task
struct BrowserInstance {
    browser: ChromeBrowser,
    handle: JoinHandle<()>,
}

impl BrowserInstance {
    async fn launch(settings: &BrowserConfig) -> Result<Self> {
        let mut builder = ChromeConfig::builder()
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .window_size(settings.viewport_width, settings.viewport_height);
        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        builder = if settings.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        let config = builder.build().map_err(HarvestError::Launch)?;

        let timeout = Duration::from_secs(settings.launch_timeout_secs);
        let (browser, mut handler) = tokio::time::timeout(timeout, ChromeBrowser::launch(config))
            .await
            .map_err(|_| {
                HarvestError::Launch(format!(
                    "browser did not start within {}s",
                    settings.launch_timeout_secs
                ))
            })??;

        // Spawn handler task - must keep running for browser to work
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(Self { browser, handle })
    }

    async fn is_alive(&self) -> bool {
        self.browser.version().await.is_ok()
    }

    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handle.abort();
    }
}

/// Shared owner of the browser session
pub struct SessionHandle {
    settings: BrowserConfig,
    slot: Mutex<Option<BrowserInstance>>,
}

impl SessionHandle {
    pub fn new(settings: BrowserConfig) -> Self {
        Self {
            settings,
            slot: Mutex::new(None),
        }
    }

    /// Take exclusive use of the session for one cycle.
    pub fn lease(&self) -> Result<SessionLease<'_>> {
        let guard = self
            .slot
            .try_lock()
            .map_err(|_| HarvestError::CycleInProgress)?;
        Ok(SessionLease {
            guard,
            settings: &self.settings,
        })
    }

    /// Close the browser, waiting for any running cycle to finish first.
    pub async fn close(&self) {
        let mut guard = self.slot.lock().await;
        if let Some(instance) = guard.take() {
            info!("Closing browser session");
            instance.shutdown().await;
        }
    }
}

/// Exclusive access to the session for the duration of a cycle
pub struct SessionLease<'a> {
    guard: MutexGuard<'a, Option<BrowserInstance>>,
    settings: &'a BrowserConfig,
}

impl SessionLease<'_> {
    pub fn is_open(&self) -> bool {
        self.guard.is_some()
    }

    /// Launch the browser unless a live one is already open.
    pub async fn open(&mut self) -> Result<()> {
        if let Some(instance) = self.guard.as_ref() {
            if instance.is_alive().await {
                return Ok(());
            }
            warn!("Browser session is no longer responsive, relaunching");
            if let Some(stale) = self.guard.take() {
                stale.shutdown().await;
            }
        }

        let settings = self.settings;
        let instance = retry_when(
            &RetryConfig::browser(),
            "browser launch",
            || BrowserInstance::launch(settings),
            HarvestError::is_transient,
        )
        .await?;
        info!(
            "Browser session opened ({})",
            if settings.headless { "headless" } else { "headed" }
        );
        *self.guard = Some(instance);
        Ok(())
    }

    /// A fresh, configured tab in the (opened if necessary) session.
    pub async fn new_page(&mut self) -> Result<ChromiumPage> {
        self.open().await?;
        let Some(instance) = self.guard.as_ref() else {
            return Err(HarvestError::Launch("browser session unavailable".to_string()));
        };
        let page = instance.browser.new_page("about:blank").await?;
        ChromiumPage::configure(page, self.settings).await
    }

    /// Tear the session down. A no-op when nothing is open.
    pub async fn close(&mut self) {
        if let Some(instance) = self.guard.take() {
            info!("Closing browser session");
            instance.shutdown().await;
        }
    }
}
