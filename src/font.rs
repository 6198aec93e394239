//! Webfont embedding
//!
//! A single font file is inlined into the document as a `@font-face` rule
//! whose `src` is a data URI of the file's bytes.

use std::path::{Path, PathBuf};

use crate::document;
use crate::{Error, Result};

/// A font file loaded into memory
#[derive(Debug, Clone)]
pub struct WebFont {
    pub family: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl WebFont {
    /// Read a font from disk. Read failures are fatal for the invocation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let family = font_family_name(path)?;
        let bytes = std::fs::read(path).map_err(|source| Error::IoError {
            path: PathBuf::from(path),
            source,
        })?;
        Ok(Self {
            family,
            mime: font_mime_type(path),
            bytes,
        })
    }

    pub fn to_css(&self) -> String {
        format!(
            "@font-face {{\n  font-family: '{}';\n  font-style: normal;\n  font-weight: 400;\n  src: url({});\n}}",
            self.family,
            document::encode(&self.bytes, self.mime)
        )
    }
}

/// Family name for a font path: the file name minus its final extension
pub fn font_family_name(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InputError(format!("webfont path has no file name: {}", path.display())))
}

pub fn font_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "eot" => "application/vnd.ms-fontobject",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Load `path` and produce its `@font-face` declaration
pub fn webfont_css(path: impl AsRef<Path>) -> Result<String> {
    Ok(WebFont::load(path)?.to_css())
}
