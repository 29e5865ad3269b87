//! Page abstraction used by the capture engine, and its chromiumoxide
//! implementation.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventResponseReceived,
    GetResponseBodyParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::accumulator::{admit_head, ObservedResponse};
use crate::config::BrowserConfig;
use crate::error::Result;

/// Responses buffered between the observer task and the coordinator
const OBSERVER_BUFFER: usize = 256;

/// Hides the automation flag before any site script runs
const STEALTH_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// Receiving end of a page's response stream.
///
/// The observing task is stopped when the observer is closed or dropped, so
/// no listener outlives a capture run.
pub struct ResponseObserver {
    rx: mpsc::Receiver<ObservedResponse>,
    task: Option<JoinHandle<()>>,
}

impl ResponseObserver {
    pub fn new(rx: mpsc::Receiver<ObservedResponse>, task: Option<JoinHandle<()>>) -> Self {
        Self { rx, task }
    }

    /// Next observed response, or `None` once the page stopped reporting.
    pub async fn recv(&mut self) -> Option<ObservedResponse> {
        self.rx.recv().await
    }

    /// Stop observing. Responses already buffered are discarded.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.rx.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ResponseObserver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// What the capture engine needs from a browser page
#[async_trait]
pub trait CapturePage: Send + Sync {
    /// Start observing responses. Must be called before the first navigation.
    async fn observe(&self) -> Result<ResponseObserver>;

    async fn goto(&self, url: &str) -> Result<()>;

    /// Rendered HTML of the current document.
    async fn content(&self) -> Result<String>;

    /// Click the first element matching a CSS selector.
    async fn click(&self, selector: &str) -> Result<()>;
}

struct PendingResponse {
    url: String,
    status: u16,
    content_type: String,
}

/// A configured chromiumoxide tab
pub struct ChromiumPage {
    page: Page,
}

impl ChromiumPage {
    /// Prepare a blank tab: stealth script, user agent, viewport and network
    /// events, all before anything is loaded.
    pub async fn configure(page: Page, settings: &BrowserConfig) -> Result<Self> {
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await?;
        page.execute(SetUserAgentOverrideParams::new(settings.user_agent.clone()))
            .await?;
        page.execute(SetDeviceMetricsOverrideParams::new(
            i64::from(settings.viewport_width),
            i64::from(settings.viewport_height),
            1.0,
            false,
        ))
        .await?;
        page.execute(EnableParams::default()).await?;
        Ok(Self { page })
    }

    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!("Failed to close page: {}", e);
        }
    }
}

fn decode_body(body: String, base64_encoded: bool) -> String {
    if !base64_encoded {
        return body;
    }
    match STANDARD.decode(body.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!("Failed to decode base64 response body: {}", e);
            String::new()
        }
    }
}

#[async_trait]
impl CapturePage for ChromiumPage {
    async fn observe(&self) -> Result<ResponseObserver> {
        let mut received = self.page.event_listener::<EventResponseReceived>().await?;
        let mut finished = self.page.event_listener::<EventLoadingFinished>().await?;
        let mut failed = self.page.event_listener::<EventLoadingFailed>().await?;

        let (tx, rx) = mpsc::channel(OBSERVER_BUFFER);
        let page = self.page.clone();

        // Bodies are only available once loading finished, so heads that pass
        // admission are parked until then.
        let task = tokio::spawn(async move {
            let mut pending: HashMap<String, PendingResponse> = HashMap::new();
            loop {
                tokio::select! {
                    Some(event) = received.next() => {
                        let status = u16::try_from(event.response.status).unwrap_or(0);
                        let url = event.response.url.clone();
                        let content_type = event.response.mime_type.clone();
                        match admit_head(&url, status, Some(&content_type)) {
                            Ok(()) => {
                                pending.insert(
                                    event.request_id.inner().clone(),
                                    PendingResponse { url, status, content_type },
                                );
                            }
                            Err(reason) => trace!("Skipping {} ({:?})", url, reason),
                        }
                    }
                    Some(event) = finished.next() => {
                        let Some(head) = pending.remove(event.request_id.inner()) else {
                            continue;
                        };
                        let body = match page
                            .execute(GetResponseBodyParams::new(event.request_id.clone()))
                            .await
                        {
                            Ok(response) => {
                                let result = response.result;
                                decode_body(result.body, result.base64_encoded)
                            }
                            Err(e) => {
                                debug!("Response body unavailable for {}: {}", head.url, e);
                                continue;
                            }
                        };
                        let observed = ObservedResponse {
                            url: head.url,
                            status: head.status,
                            content_type: Some(head.content_type),
                            body,
                        };
                        if tx.send(observed).await.is_err() {
                            break;
                        }
                    }
                    Some(event) = failed.next() => {
                        pending.remove(event.request_id.inner());
                    }
                    else => break,
                }
            }
        });

        Ok(ResponseObserver::new(rx, Some(task)))
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page.find_element(selector).await?.click().await?;
        Ok(())
    }
}
