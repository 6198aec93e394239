#![cfg_attr(not(feature = "cdp"), allow(dead_code, unused_imports))]

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use rendershot::{RenderOptions, Template};

/// Render an HTML template with props and capture it as a PNG in headless Chrome
#[derive(Parser, Debug)]
#[command(name = "rendershot", version, about)]
struct Cli {
    /// HTML template file (`{{key}}` placeholders are filled from props)
    template: PathBuf,

    /// Props as inline JSON, or `@path` to a JSON file
    #[arg(long)]
    props: Option<String>,

    /// CSS file injected into the document head
    #[arg(long)]
    css: Option<PathBuf>,

    /// JSON options file; command line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Zoom applied to the viewport and the captured region
    #[arg(long)]
    scale: Option<f64>,

    /// Font file to embed
    #[arg(long)]
    webfont: Option<PathBuf>,

    /// Style library: styled-components or emotion
    #[arg(long)]
    css_library: Option<String>,

    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[arg(long)]
    filename: Option<String>,

    /// Browser executable to launch
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Disable Chrome's sandbox (needed in some containers)
    #[arg(long)]
    no_sandbox: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,
}

impl Cli {
    fn options(&self) -> anyhow::Result<RenderOptions> {
        let mut opts = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str::<RenderOptions>(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => RenderOptions::default(),
        };

        if let Some(props) = &self.props {
            let raw = match props.strip_prefix('@') {
                Some(path) => fs::read_to_string(path).with_context(|| format!("reading props {}", path))?,
                None => props.clone(),
            };
            opts.props = serde_json::from_str(&raw).context("props must be a JSON object")?;
        }
        if let Some(path) = &self.css {
            opts.css = fs::read_to_string(path).with_context(|| format!("reading css {}", path.display()))?;
        }
        if let Some(w) = self.width {
            opts.width = w;
        }
        if let Some(h) = self.height {
            opts.height = h;
        }
        if let Some(s) = self.scale {
            opts.scale = s;
        }
        if self.webfont.is_some() {
            opts.webfont = self.webfont.clone();
        }
        if self.css_library.is_some() {
            opts.css_library = self.css_library.clone();
        }
        if self.out_dir.is_some() {
            opts.out_dir = self.out_dir.clone();
        }
        if self.filename.is_some() {
            opts.filename = self.filename.clone();
        }
        if self.chrome.is_some() {
            opts.launch.executable = self.chrome.clone();
        }
        if self.no_sandbox {
            opts.launch.sandbox = false;
        }
        if self.headful {
            opts.launch.headless = false;
        }
        Ok(opts)
    }
}

#[cfg(feature = "cdp")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let opts = cli.options()?;
    let source = fs::read_to_string(&cli.template)
        .with_context(|| format!("reading template {}", cli.template.display()))?;

    let png = rendershot::screenshot(&Template::new(source), &opts).await?;

    let out = opts.output_path();
    if let Some(dir) = out.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    fs::write(&out, &png).with_context(|| format!("writing {}", out.display()))?;
    info!("wrote {} ({} bytes)", out.display(), png.len());
    Ok(())
}

#[cfg(not(feature = "cdp"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    eprintln!(
        "rendershot was built without the `cdp` feature; cannot capture {}",
        cli.template.display()
    );
    std::process::exit(1);
}
