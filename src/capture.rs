//! Browser capture pipeline
//!
//! One capture owns one browser and one page for its whole lifetime:
//!
//! `launch -> new page -> navigate -> set viewport -> apply scale -> screenshot -> close`
//!
//! Each stage is awaited before the next one is issued and its wall-clock
//! duration is logged. Once the browser is up it is closed on every exit
//! path; a stage error takes precedence over a close error.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{info, warn};

use crate::{Error, LaunchConfig, Result, Viewport};

/// Sets the root element's transform so the page renders at `factor`
/// without a re-layout at the larger size.
pub const SCALE_SCRIPT: &str = "function(factor) {
    var root = document.querySelector('html');
    root.style.transform = 'scale(' + factor + ')';
    root.style.transformOrigin = 'top left';
}";

/// The ordered stages of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    Launch,
    NewPage,
    Navigate,
    SetViewport,
    ApplyScale,
    Screenshot,
    Close,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureStage::Launch => "browser launch",
            CaptureStage::NewPage => "page open",
            CaptureStage::Navigate => "navigation",
            CaptureStage::SetViewport => "viewport setup",
            CaptureStage::ApplyScale => "scale script",
            CaptureStage::Screenshot => "screenshot",
            CaptureStage::Close => "browser close",
        };
        f.write_str(name)
    }
}

/// Starts browser processes
#[async_trait]
pub trait Launcher: Send + Sync {
    type Browser: BrowserSession;

    async fn launch(&self, config: &LaunchConfig) -> Result<Self::Browser>;
}

/// A running browser exclusively owned by one capture
#[async_trait]
pub trait BrowserSession: Send + Sync + Sized {
    type Page: PageSession;

    async fn new_page(&self) -> Result<Self::Page>;

    /// Terminate the browser process
    async fn close(self) -> Result<()>;
}

/// A single page/tab
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate and wait for the navigation to complete. `timeout` is the
    /// caller's navigation bound; backends that block while waiting should
    /// give up on their own once it passes.
    async fn goto(&self, url: &str, timeout: Option<Duration>) -> Result<()>;

    async fn set_viewport(&self, viewport: Viewport) -> Result<()>;

    /// Call the JS function `function` with JSON `args` in the page context.
    /// Failures are reported against `stage`.
    async fn evaluate(
        &self,
        stage: CaptureStage,
        function: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value>;

    /// PNG of the region `(0, 0)..(clip.width, clip.height)` with the page
    /// background left transparent
    async fn screenshot(&self, clip: Viewport) -> Result<Vec<u8>>;
}

/// Everything the controller needs for one capture
#[derive(Debug, Clone)]
pub struct CaptureRequest<'a> {
    pub url: &'a str,
    /// Already scaled viewport and clip size
    pub viewport: Viewport,
    pub scale: f64,
    pub launch: &'a LaunchConfig,
    pub launch_timeout: Option<Duration>,
    pub navigation_timeout: Option<Duration>,
}

/// Result of a capture
#[derive(Debug, Clone)]
pub struct Captured {
    pub png: Vec<u8>,
    pub timings: Vec<(CaptureStage, Duration)>,
}

#[derive(Default)]
struct Timings(Vec<(CaptureStage, Duration)>);

impl Timings {
    async fn time<T, F>(&mut self, stage: CaptureStage, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let res = fut.await;
        let elapsed = started.elapsed();
        info!("{} took {:.3} ms", stage, elapsed.as_secs_f64() * 1000.0);
        self.0.push((stage, elapsed));
        res
    }
}

async fn bounded<T, F>(stage: CaptureStage, limit: Option<Duration>, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| Error::Timeout {
            stage,
            ms: limit.as_millis() as u64,
        })?,
        None => fut.await,
    }
}

/// Run the full capture against `launcher`
pub async fn capture<L: Launcher>(launcher: &L, req: &CaptureRequest<'_>) -> Result<Captured> {
    let mut timings = Timings::default();

    let browser = timings
        .time(
            CaptureStage::Launch,
            bounded(CaptureStage::Launch, req.launch_timeout, launcher.launch(req.launch)),
        )
        .await?;

    let outcome = drive(&browser, req, &mut timings).await;
    let closed = timings.time(CaptureStage::Close, browser.close()).await;

    match (outcome, closed) {
        (Ok(png), Ok(())) => Ok(Captured { png, timings: timings.0 }),
        (Err(err), Ok(())) => Err(err),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Err(close_err)) => {
            warn!("browser close failed after {}: {}", err, close_err);
            Err(err)
        }
    }
}

async fn drive<B: BrowserSession>(
    browser: &B,
    req: &CaptureRequest<'_>,
    timings: &mut Timings,
) -> Result<Vec<u8>> {
    let page = timings.time(CaptureStage::NewPage, browser.new_page()).await?;

    timings
        .time(
            CaptureStage::Navigate,
            bounded(
                CaptureStage::Navigate,
                req.navigation_timeout,
                page.goto(req.url, req.navigation_timeout),
            ),
        )
        .await?;

    timings
        .time(CaptureStage::SetViewport, page.set_viewport(req.viewport))
        .await?;

    let factor = serde_json::json!(req.scale);
    timings
        .time(
            CaptureStage::ApplyScale,
            page.evaluate(CaptureStage::ApplyScale, SCALE_SCRIPT, std::slice::from_ref(&factor)),
        )
        .await?;

    timings
        .time(CaptureStage::Screenshot, page.screenshot(req.viewport))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_read_naturally() {
        assert_eq!(CaptureStage::Navigate.to_string(), "navigation");
        assert_eq!(
            Error::Timeout { stage: CaptureStage::Launch, ms: 5 }.to_string(),
            "browser launch timed out after 5ms"
        );
    }

    #[tokio::test]
    async fn bounded_reports_stage_on_expiry() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, Error>(())
        };
        let err = bounded(CaptureStage::Navigate, Some(Duration::from_millis(5)), slow)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { stage: CaptureStage::Navigate, ms: 5 }));
    }
}
