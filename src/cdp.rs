//! Chrome DevTools Protocol backend (uses the `headless_chrome` crate)
//!
//! `headless_chrome` is synchronous, so each launched browser lives on a
//! dedicated worker thread that executes commands sent from async tasks.
//! Dropping every handle ends the worker, which drops the browser and
//! terminates the Chrome process.
//!
//! Commands run one at a time, so a close queued behind a hung navigation
//! only runs once the navigation returns. Navigation therefore uses the
//! capture's navigation timeout as the tab's wait timeout, which lets the
//! worker come back to its queue shortly after the caller stops waiting.

use std::ffi::OsStr;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page};
use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use tokio::sync::oneshot;

use crate::capture::{BrowserSession, CaptureStage, Launcher, PageSession};
use crate::{Error, LaunchConfig, Result, Viewport};

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    NewPage(Reply<()>),
    Goto(String, Option<Duration>, Reply<()>),
    SetViewport(Viewport, Reply<()>),
    Evaluate(CaptureStage, String, Reply<serde_json::Value>),
    Screenshot(Viewport, Reply<Vec<u8>>),
    Close(Reply<()>),
}

/// Launches a fresh headless Chrome per capture
#[derive(Debug, Default, Clone, Copy)]
pub struct CdpLauncher;

/// Handle to a Chrome instance owned by a worker thread
pub struct CdpBrowser {
    cmd_tx: Sender<Command>,
}

/// Handle to the page opened in a [`CdpBrowser`]
pub struct CdpPage {
    cmd_tx: Sender<Command>,
}

fn dispatch<T>(
    cmd_tx: &Sender<Command>,
    stage: CaptureStage,
    make: impl FnOnce(Reply<T>) -> Command,
) -> Result<oneshot::Receiver<Result<T>>> {
    let (tx, rx) = oneshot::channel();
    cmd_tx
        .send(make(tx))
        .map_err(|_| Error::automation(stage, "browser worker has exited"))?;
    Ok(rx)
}

async fn reply<T>(rx: oneshot::Receiver<Result<T>>, stage: CaptureStage) -> Result<T> {
    rx.await
        .map_err(|e| Error::automation(stage, format!("worker dropped the request: {}", e)))?
}

#[async_trait]
impl Launcher for CdpLauncher {
    type Browser = CdpBrowser;

    async fn launch(&self, config: &LaunchConfig) -> Result<CdpBrowser> {
        let config = config.clone();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::spawn(move || {
            let mut worker = match Worker::launch(&config) {
                Ok(w) => w,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            // The caller gave up waiting (launch timeout); drop the browser
            if init_tx.send(Ok(())).is_err() {
                return;
            }

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::NewPage(resp) => {
                        let _ = resp.send(worker.new_page());
                    }
                    Command::Goto(url, timeout, resp) => {
                        let _ = resp.send(worker.goto(&url, timeout));
                    }
                    Command::SetViewport(viewport, resp) => {
                        let _ = resp.send(worker.set_viewport(viewport));
                    }
                    Command::Evaluate(stage, expression, resp) => {
                        let _ = resp.send(worker.evaluate(stage, &expression));
                    }
                    Command::Screenshot(clip, resp) => {
                        let _ = resp.send(worker.screenshot(clip));
                    }
                    Command::Close(resp) => {
                        drop(worker);
                        let _ = resp.send(Ok(()));
                        return;
                    }
                }
            }
        });

        init_rx
            .await
            .map_err(|e| Error::automation(CaptureStage::Launch, format!("worker init canceled: {}", e)))??;

        Ok(CdpBrowser { cmd_tx })
    }
}

#[async_trait]
impl BrowserSession for CdpBrowser {
    type Page = CdpPage;

    async fn new_page(&self) -> Result<CdpPage> {
        let rx = dispatch(&self.cmd_tx, CaptureStage::NewPage, Command::NewPage)?;
        reply(rx, CaptureStage::NewPage).await?;
        Ok(CdpPage {
            cmd_tx: self.cmd_tx.clone(),
        })
    }

    async fn close(self) -> Result<()> {
        let rx = dispatch(&self.cmd_tx, CaptureStage::Close, Command::Close)?;
        reply(rx, CaptureStage::Close).await
    }
}

#[async_trait]
impl PageSession for CdpPage {
    async fn goto(&self, url: &str, timeout: Option<Duration>) -> Result<()> {
        let url = url.to_string();
        let rx = dispatch(&self.cmd_tx, CaptureStage::Navigate, |tx| {
            Command::Goto(url, timeout, tx)
        })?;
        reply(rx, CaptureStage::Navigate).await
    }

    async fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        let rx = dispatch(&self.cmd_tx, CaptureStage::SetViewport, |tx| {
            Command::SetViewport(viewport, tx)
        })?;
        reply(rx, CaptureStage::SetViewport).await
    }

    async fn evaluate(
        &self,
        stage: CaptureStage,
        function: &str,
        args: &[serde_json::Value],
    ) -> Result<serde_json::Value> {
        let args = args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
        let expression = format!("({})({})", function, args);
        let rx = dispatch(&self.cmd_tx, stage, |tx| Command::Evaluate(stage, expression, tx))?;
        reply(rx, stage).await
    }

    async fn screenshot(&self, clip: Viewport) -> Result<Vec<u8>> {
        let rx = dispatch(&self.cmd_tx, CaptureStage::Screenshot, |tx| {
            Command::Screenshot(clip, tx)
        })?;
        reply(rx, CaptureStage::Screenshot).await
    }
}

/// State owned by the worker thread
struct Worker {
    browser: Browser,
    tab: Option<Arc<Tab>>,
}

impl Worker {
    fn launch(config: &LaunchConfig) -> Result<Self> {
        let args: Vec<&OsStr> = config.args.iter().map(OsStr::new).collect();
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(config.sandbox)
            .path(config.executable.clone())
            .args(args)
            .idle_browser_timeout(Duration::from_millis(config.idle_timeout_ms))
            .build()
            .map_err(|e| {
                Error::automation(CaptureStage::Launch, format!("invalid launch options: {}", e))
            })?;

        let browser = Browser::new(options).map_err(|e| Error::automation(CaptureStage::Launch, e))?;
        debug!("launched chrome (headless: {})", config.headless);
        Ok(Self { browser, tab: None })
    }

    fn tab(&self, stage: CaptureStage) -> Result<&Arc<Tab>> {
        self.tab
            .as_ref()
            .ok_or_else(|| Error::automation(stage, "no page has been opened"))
    }

    fn new_page(&mut self) -> Result<()> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| Error::automation(CaptureStage::NewPage, e))?;
        self.tab = Some(tab);
        Ok(())
    }

    fn goto(&self, url: &str, timeout: Option<Duration>) -> Result<()> {
        let stage = CaptureStage::Navigate;
        let tab = self.tab(stage)?;
        if let Some(timeout) = timeout {
            tab.set_default_timeout(timeout);
        }
        tab.navigate_to(url).map_err(|e| Error::automation(stage, e))?;
        tab.wait_until_navigated().map_err(|e| Error::automation(stage, e))?;
        Ok(())
    }

    fn set_viewport(&self, viewport: Viewport) -> Result<()> {
        let stage = CaptureStage::SetViewport;
        let metrics: Emulation::SetDeviceMetricsOverride = serde_json::from_value(serde_json::json!({
            "width": viewport.width,
            "height": viewport.height,
            "deviceScaleFactor": 1,
            "mobile": false,
        }))
        .map_err(|e| Error::automation(stage, e))?;
        self.tab(stage)?
            .call_method(metrics)
            .map_err(|e| Error::automation(stage, e))?;
        Ok(())
    }

    fn evaluate(&self, stage: CaptureStage, expression: &str) -> Result<serde_json::Value> {
        let remote = self
            .tab(stage)?
            .evaluate(expression, false)
            .map_err(|e| Error::automation(stage, e))?;
        Ok(remote.value.unwrap_or(serde_json::Value::Null))
    }

    fn screenshot(&self, clip: Viewport) -> Result<Vec<u8>> {
        let stage = CaptureStage::Screenshot;
        let tab = self.tab(stage)?;

        let transparent: Emulation::SetDefaultBackgroundColorOverride =
            serde_json::from_value(serde_json::json!({
                "color": { "r": 0, "g": 0, "b": 0, "a": 0 }
            }))
            .map_err(|e| Error::automation(stage, e))?;
        tab.call_method(transparent)
            .map_err(|e| Error::automation(stage, e))?;

        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: clip.width as f64,
            height: clip.height as f64,
            scale: 1.0,
        };
        tab.capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| Error::automation(stage, e))
    }
}
