use rendershot::document::{self, assemble, to_data_uri, DocumentParts, BASE_CSS};
use rendershot::font::{self, WebFont};
use rendershot::{Error, ErrorKind};

#[test]
fn data_uri_decodes_to_the_assembled_bytes() {
    let bodies = [
        "<p>plain ascii</p>",
        "<p>naïve café — 日本語 🚀</p>",
        "<svg><text>&lt;&amp;&gt;</text></svg>\n\t",
    ];
    for body in bodies {
        let parts = DocumentParts {
            body,
            base_css: BASE_CSS,
            font_css: "",
            css: "p{color:#c0ffee}",
            styles: "<style>b{}</style>",
        };
        let (mime, bytes) = document::decode(&to_data_uri(&parts)).unwrap();
        assert_eq!(mime, "text/html");
        assert_eq!(bytes, assemble(&parts).into_bytes());
    }
}

#[test]
fn document_declares_utf8_and_doctype() {
    let html = assemble(&DocumentParts {
        body: "<b>x</b>",
        ..Default::default()
    });
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<meta charset=\"utf-8\">"));
}

#[test]
fn webfont_is_embedded_as_font_face() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Inter.Variable.woff2");
    std::fs::write(&path, [0u8, 1, 2, 3, 255]).unwrap();

    let css = font::webfont_css(&path).unwrap();
    assert!(css.starts_with("@font-face {"));
    assert!(css.contains("font-family: 'Inter.Variable';"));
    assert!(css.contains("font-style: normal;"));
    assert!(css.contains("font-weight: 400;"));

    let font = WebFont::load(&path).unwrap();
    let uri = document::encode(&font.bytes, font.mime);
    assert!(css.contains(&format!("src: url({});", uri)));
    let (mime, bytes) = document::decode(&uri).unwrap();
    assert_eq!(mime, "font/woff2");
    assert_eq!(bytes, vec![0u8, 1, 2, 3, 255]);
}

#[test]
fn unreadable_font_reports_path() {
    let err = font::webfont_css("/missing/Brand.otf").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    match err {
        Error::IoError { path, .. } => assert!(path.ends_with("Brand.otf")),
        other => panic!("unexpected error: {other}"),
    }
}
