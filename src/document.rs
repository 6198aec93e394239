//! HTML document assembly and data URI encoding

use base64::Engine as Base64Engine;

use crate::{Error, Result};

/// Reset applied before any caller CSS
pub const BASE_CSS: &str = "*{box-sizing:border-box}body{margin:0;font-family:system-ui,sans-serif}";

/// The pieces a document is assembled from
#[derive(Debug, Clone, Default)]
pub struct DocumentParts<'a> {
    pub body: &'a str,
    pub base_css: &'a str,
    pub font_css: &'a str,
    pub css: &'a str,
    pub styles: &'a str,
}

/// Build the HTML document. The head carries one `<style>` block with base,
/// font and caller CSS in that order, followed by any extracted style tags;
/// the rendered body comes last.
pub fn assemble(parts: &DocumentParts<'_>) -> String {
    format!(
        "<!DOCTYPE html>\n<head>\n<meta charset=\"utf-8\"><style>{}{}{}</style>\n{}\n</head>\n{}",
        parts.base_css, parts.font_css, parts.css, parts.styles, parts.body
    )
}

/// Assemble the document and encode it as a `text/html` data URI
pub fn to_data_uri(parts: &DocumentParts<'_>) -> String {
    encode(assemble(parts).as_bytes(), "text/html")
}

/// Encode bytes as a base64 data URI
pub fn encode(bytes: &[u8], mime: &str) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, payload)
}

/// Decode a base64 data URI into its MIME type and payload bytes
pub fn decode(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::InputError("data URI must start with 'data:'".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::InputError("data URI has no payload separator".into()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| Error::InputError("only base64 data URIs are supported".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::InputError(format!("invalid base64 payload: {}", e)))?;
    Ok((mime.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_orders_css_then_styles_then_body() {
        let html = assemble(&DocumentParts {
            body: "<main>BODY</main>",
            base_css: "BASE{}",
            font_css: "FONT{}",
            css: "CALLER{}",
            styles: "<style>EXTRACTED</style>",
        });
        assert!(html.contains("<meta charset=\"utf-8\"><style>BASE{}FONT{}CALLER{}</style>"));
        let styles = html.find("EXTRACTED").unwrap();
        let head_end = html.find("</head>").unwrap();
        let body = html.find("<main>").unwrap();
        assert!(styles < head_end && head_end < body);
    }

    #[test]
    fn encode_uses_html_mime() {
        let uri = to_data_uri(&DocumentParts { body: "x", ..Default::default() });
        assert!(uri.starts_with("data:text/html;base64,"));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("http://example.com").is_err());
        assert!(decode("data:text/html,plain").is_err());
        assert!(decode("data:text/html;base64,@@@").is_err());
    }
}
