//! Headless Chrome renderer speaking the DevTools protocol.
//!
//! Every surface launches its own browser process, on its own throwaway profile directory,
//! with a single blank page. Releasing the surface closes the page and the browser, waits
//! for the process to exit and removes the profile. If a surface is dropped without being
//! released, the event handler task is aborted, the browser child process is killed when
//! `chromiumoxide` drops it and the profile directory is removed afterwards.
//!
//! A loaded page counts as settled once its load event has fired, no network request has
//! been in flight for [`NETWORK_QUIET_WINDOW`] and web fonts are ready.

use super::{PdfRenderer, RenderError, RenderSurface};
use crate::pdf::PdfOptions;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Resolves once web fonts referenced by the letter have finished loading.
const FONTS_READY: &str = "document.fonts.ready.then(() => true)";

/// How long the page must go without in-flight requests to count as idle.
const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct ChromiumConfig {
    /// Browser binary; `None` lets `chromiumoxide` search the usual install locations.
    pub executable: Option<PathBuf>,
    /// Keep Chrome's sandbox enabled. Containers usually need it off.
    pub sandbox: bool,
    /// Upper bound for any single DevTools request.
    pub request_timeout: Duration,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            executable: None,
            sandbox: false,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChromiumRenderer {
    config: ChromiumConfig,
}

impl ChromiumRenderer {
    pub fn new(config: ChromiumConfig) -> Self {
        Self { config }
    }

    fn browser_config(&self, profile: &Path) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.config.request_timeout)
            .user_data_dir(profile);
        if !self.config.sandbox {
            builder = builder.no_sandbox().arg("--disable-setuid-sandbox");
        }
        if let Some(executable) = &self.config.executable {
            builder = builder.chrome_executable(executable);
        }
        builder.build().map_err(RenderError::Launch)
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn open_surface(&self) -> Result<Box<dyn RenderSurface>, RenderError> {
        let profile = profile_dir()?;
        let (mut browser, mut handler) = Browser::launch(self.browser_config(profile.path())?)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("devtools handler error: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    tracing::warn!("failed to close browser after page error: {}", close_err);
                }
                handler.abort();
                return Err(RenderError::Surface(e.to_string()));
            }
        };

        Ok(Box::new(ChromiumSurface {
            browser,
            page: Some(page),
            handler,
            settle_timeout: self.config.request_timeout,
            profile: Some(profile),
        }))
    }
}

/// Fresh user data directory for one browser launch.
fn profile_dir() -> Result<TempDir, RenderError> {
    tempfile::Builder::new()
        .prefix("letterpdf-chrome-")
        .tempdir()
        .map_err(|e| RenderError::Launch(format!("failed to create browser profile: {e}")))
}

// Field order matters: the browser is dropped (and killed) before its profile is removed.
struct ChromiumSurface {
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
    settle_timeout: Duration,
    profile: Option<TempDir>,
}

impl ChromiumSurface {
    fn page(&self) -> Result<&Page, RenderError> {
        self.page
            .as_ref()
            .ok_or_else(|| RenderError::Surface("page already closed".into()))
    }
}

#[async_trait]
impl RenderSurface for ChromiumSurface {
    async fn load_html(&mut self, html: &str) -> Result<(), RenderError> {
        let page = self.page()?;
        let content_err = |e: chromiumoxide::error::CdpError| RenderError::Content(e.to_string());

        // Subscribed before the markup goes in so no request is missed.
        let started = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(content_err)?
            .map(|e| NetworkActivity::Started(e.request_id.inner().clone()));
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(content_err)?
            .map(|e| NetworkActivity::Finished(e.request_id.inner().clone()));
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(content_err)?
            .map(|e| NetworkActivity::Finished(e.request_id.inner().clone()));

        // Waits for the load event of the written document.
        page.set_content(html).await.map_err(content_err)?;

        let activity = futures::stream::select(started, futures::stream::select(finished, failed));
        wait_for_network_idle(activity, NETWORK_QUIET_WINDOW, self.settle_timeout).await?;

        let fonts_ready = EvaluateParams::builder()
            .expression(FONTS_READY)
            .await_promise(true)
            .build()
            .map_err(RenderError::Content)?;
        page.evaluate_expression(fonts_ready)
            .await
            .map_err(content_err)?;
        Ok(())
    }

    async fn print_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, RenderError> {
        self.page()?
            .pdf(print_params(options))
            .await
            .map_err(|e| RenderError::Print(e.to_string()))
    }

    async fn release(self: Box<Self>) -> Result<(), RenderError> {
        let mut surface = self;
        if let Some(page) = surface.page.take() {
            if let Err(e) = page.close().await {
                tracing::debug!("failed to close page: {}", e);
            }
        }
        surface
            .browser
            .close()
            .await
            .map_err(|e| RenderError::Release(e.to_string()))?;
        surface
            .browser
            .wait()
            .await
            .map_err(|e| RenderError::Release(e.to_string()))?;
        if let Some(profile) = surface.profile.take() {
            profile
                .close()
                .map_err(|e| RenderError::Release(format!("failed to remove browser profile: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for ChromiumSurface {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// One network event, keyed by DevTools request id.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NetworkActivity {
    Started(String),
    Finished(String),
}

/// Resolves once no request has been in flight for `quiet`.
///
/// Every event restarts the quiet window. Fails if the network is still busy after
/// `limit`. An ended stream means the page is gone and counts as idle.
async fn wait_for_network_idle<S>(
    activity: S,
    quiet: Duration,
    limit: Duration,
) -> Result<(), RenderError>
where
    S: Stream<Item = NetworkActivity>,
{
    let mut activity = std::pin::pin!(activity);
    let deadline = tokio::time::sleep(limit);
    let mut deadline = std::pin::pin!(deadline);
    let mut in_flight = HashSet::new();

    loop {
        tokio::select! {
            _ = &mut deadline => {
                return Err(RenderError::Content(format!(
                    "network still busy after {limit:?} ({} requests in flight)",
                    in_flight.len()
                )));
            }
            event = activity.next() => match event {
                Some(NetworkActivity::Started(id)) => {
                    in_flight.insert(id);
                }
                Some(NetworkActivity::Finished(id)) => {
                    in_flight.remove(&id);
                }
                None => return Ok(()),
            },
            _ = tokio::time::sleep(quiet), if in_flight.is_empty() => return Ok(()),
        }
    }
}

fn print_params(options: &PdfOptions) -> PrintToPdfParams {
    let (width, height) = options.paper_size_in_inches();
    let mut builder = PrintToPdfParams::builder()
        .paper_width(width)
        .paper_height(height)
        .margin_top(options.margin.top.as_inches())
        .margin_right(options.margin.right.as_inches())
        .margin_bottom(options.margin.bottom.as_inches())
        .margin_left(options.margin.left.as_inches())
        .print_background(options.print_background)
        .landscape(options.landscape)
        .scale(options.scale)
        .prefer_css_page_size(options.prefer_css_page_size);
    if let Some(ranges) = &options.page_ranges {
        builder = builder.page_ranges(ranges.clone());
    }
    builder.build()
}
