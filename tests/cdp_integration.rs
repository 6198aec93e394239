//! Captures against a real headless Chrome

#![cfg(feature = "cdp")]

use rendershot::{Error, RenderOptions, Template};

fn no_sandbox(mut opts: RenderOptions) -> RenderOptions {
    // Containers usually lack the namespaces Chrome's sandbox needs
    opts.launch.sandbox = false;
    opts
}

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn test_capture_dimensions_with_scale() {
    let card = Template::new(r#"<div style="width:400px;height:300px;background:#36c">{{label}}</div>"#);
    let mut opts = no_sandbox(RenderOptions::new(400, 300));
    opts.scale = 2.0;
    opts.props.insert("label".into(), "hello".into());

    let png = rendershot::screenshot(&card, &opts).await.expect("capture failed");

    assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
    let img = image::load_from_memory(&png).unwrap();
    assert_eq!((img.width(), img.height()), (800, 600));
}

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn test_background_is_transparent() {
    let empty = Template::new("<div></div>");
    let opts = no_sandbox(RenderOptions::new(40, 40));

    let png = rendershot::screenshot(&empty, &opts).await.expect("capture failed");
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(20, 20)[3], 0);
}

#[tokio::test]
#[ignore] // Requires Chrome to be installed
async fn test_styled_library_renders() {
    let card = Template::new(r#"<p class="{{css color:red;margin:0}}">styled</p>"#);
    let mut opts = no_sandbox(RenderOptions::new(120, 40));
    opts.css_library = Some("styled-components".into());

    let png = rendershot::screenshot(&card, &opts).await.expect("capture failed");
    assert!(png.len() > 100, "PNG data seems too small");
}

#[tokio::test]
async fn test_missing_executable_fails_at_launch() {
    let mut opts = no_sandbox(RenderOptions::new(10, 10));
    opts.launch.executable = Some("/nonexistent/chrome-binary".into());

    let err = rendershot::screenshot(&Template::new("<p></p>"), &opts)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::AutomationError { stage: rendershot::CaptureStage::Launch, .. }
    ));
}
