//! rendershot
//!
//! Render a component to static HTML, load it in headless Chrome and capture
//! the result as a PNG.
//!
//! # Pipeline
//!
//! 1. render the component with its props (optionally extracting styles
//!    through a style library)
//! 2. assemble a complete HTML document (base CSS, webfont, caller CSS,
//!    extracted styles, body) and encode it as a data URI
//! 3. launch a browser, navigate to the data URI, size the viewport to
//!    `width*scale x height*scale`, scale the root element by `scale`,
//!    screenshot that region with a transparent background, close the browser
//!
//! # Example
//!
//! ```no_run
//! use rendershot::{RenderOptions, Template};
//!
//! # async fn run() -> rendershot::Result<()> {
//! let card = Template::new("<h1 class=\"{{css color:rebeccapurple}}\">{{title}}</h1>");
//! let mut options = RenderOptions::new(400, 300);
//! options.props.insert("title".into(), "Hello".into());
//! options.scale = 2.0;
//! options.css_library = Some("styled-components".into());
//!
//! let png = rendershot::screenshot(&card, &options).await?;
//! assert!(!png.is_empty());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

pub mod capture;
pub mod document;
pub mod error;
pub mod font;
pub mod markup;
pub mod styles;

#[cfg(feature = "cdp")]
pub mod cdp;

pub use capture::{BrowserSession, CaptureStage, Launcher, PageSession};
pub use error::{Error, ErrorKind, Result};
pub use markup::{Component, Element, Props, RenderContext, Template};
pub use styles::{RenderedFragment, StyleLibraries, StyleLibrary};

/// Browser launch configuration, forwarded untouched to the backend
///
/// # Examples
///
/// ```
/// let cfg = rendershot::LaunchConfig::default();
/// assert!(cfg.headless);
/// assert!(cfg.sandbox);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Keep Chrome's sandbox enabled
    pub sandbox: bool,
    /// Browser executable; auto-detected when unset
    #[serde(alias = "executablePath")]
    pub executable: Option<PathBuf>,
    /// Extra command line switches
    pub args: Vec<String>,
    /// How long an idle browser connection is kept alive
    pub idle_timeout_ms: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            executable: None,
            args: Vec::new(),
            idle_timeout_ms: 30000,
        }
    }
}

/// Pixel dimensions of the viewport and of the captured region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// `width*scale x height*scale`, rounded to whole pixels
    pub fn scaled(width: u32, height: u32, scale: f64) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InputError(format!(
                "width and height must be positive integers (got {}x{})",
                width, height
            )));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InputError(format!("scale must be a positive number (got {})", scale)));
        }
        let w = (width as f64 * scale).round();
        let h = (height as f64 * scale).round();
        if w < 1.0 || h < 1.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
            return Err(Error::InputError(format!(
                "scaled size {}x{} is out of range",
                w, h
            )));
        }
        Ok(Self {
            width: w as u32,
            height: h as u32,
        })
    }
}

/// Options for a single screenshot
///
/// Deserializes from camelCase JSON, so an options file such as
/// `{"width": 400, "height": 300, "cssLibrary": "emotion"}` works as-is.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderOptions {
    /// Property bag handed to the component
    pub props: Props,
    /// Raw CSS injected into the document head
    pub css: String,
    /// Browser launch configuration
    #[serde(alias = "puppeteer")]
    pub launch: LaunchConfig,
    /// Output file name; only used by callers writing the image to disk
    pub filename: Option<String>,
    /// Output directory; only used by callers writing the image to disk
    pub out_dir: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    /// Zoom applied to both the viewport and the captured region
    pub scale: f64,
    /// Font file embedded as a `@font-face` rule
    pub webfont: Option<PathBuf>,
    /// Style library name, e.g. `"styled-components"` or `"emotion"`
    pub css_library: Option<String>,
    /// Bound on browser launch (0 disables)
    pub launch_timeout_ms: u64,
    /// Bound on navigation to the document (0 disables)
    pub navigation_timeout_ms: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            props: Props::new(),
            css: String::new(),
            launch: LaunchConfig::default(),
            filename: None,
            out_dir: None,
            width: 0,
            height: 0,
            scale: 1.0,
            webfont: None,
            css_library: None,
            launch_timeout_ms: 30000,
            navigation_timeout_ms: 30000,
        }
    }
}

impl RenderOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Check dimensions and scale, returning the scaled viewport
    pub fn validate(&self) -> Result<Viewport> {
        Viewport::scaled(self.width, self.height, self.scale)
    }

    /// Where a caller should write the image: `out_dir/filename`
    pub fn output_path(&self) -> PathBuf {
        let dir = self.out_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        dir.join(self.filename.as_deref().unwrap_or("screenshot.png"))
    }

    fn timeout(ms: u64) -> Option<Duration> {
        (ms > 0).then(|| Duration::from_millis(ms))
    }
}

/// Render `component` and assemble the document as a data URI.
///
/// No browser is involved; style library and webfont failures surface here.
pub fn prepare_document(
    libraries: &StyleLibraries,
    component: &dyn Component,
    options: &RenderOptions,
) -> Result<String> {
    let library = libraries.resolve(options.css_library.as_deref())?;
    let element = Element::new(component, options.props.clone());
    let fragment = library.extract(&element)?;

    let font_css = match &options.webfont {
        Some(path) => font::webfont_css(path)?,
        None => String::new(),
    };

    let uri = document::to_data_uri(&document::DocumentParts {
        body: &fragment.body,
        base_css: document::BASE_CSS,
        font_css: &font_css,
        css: &options.css,
        styles: &fragment.styles,
    });
    debug!(
        "assembled document: body {} bytes, styles {} bytes, data URI {} bytes",
        fragment.body.len(),
        fragment.styles.len(),
        uri.len()
    );
    Ok(uri)
}

/// Render and capture `component` with an explicit browser launcher and
/// style library registry.
pub async fn screenshot_with<L: Launcher>(
    launcher: &L,
    libraries: &StyleLibraries,
    component: &dyn Component,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    let viewport = options.validate()?;
    let url = prepare_document(libraries, component, options)?;

    let captured = capture::capture(
        launcher,
        &capture::CaptureRequest {
            url: &url,
            viewport,
            scale: options.scale,
            launch: &options.launch,
            launch_timeout: RenderOptions::timeout(options.launch_timeout_ms),
            navigation_timeout: RenderOptions::timeout(options.navigation_timeout_ms),
        },
    )
    .await?;
    Ok(captured.png)
}

/// Render and capture `component` in a fresh headless Chrome, using the
/// built-in style libraries.
#[cfg(feature = "cdp")]
pub async fn screenshot(component: &dyn Component, options: &RenderOptions) -> Result<Vec<u8>> {
    screenshot_with(&cdp::CdpLauncher, &StyleLibraries::default(), component, options).await
}
