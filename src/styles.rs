//! Style extraction strategies
//!
//! Rules registered on a [`RenderContext`] during rendering end up in the
//! document in one of three ways, selected by library name:
//!
//! - no library: rules are discarded, the body is plain static markup
//! - `"styled-components"`: rules are collected by a [`ServerStyleSheet`]
//!   and emitted as a separate `<style>` tag in the document head
//! - `"emotion"`: rules are inlined into the markup right before the first
//!   element that uses them

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::markup::{render_to_static_markup, Element, RenderContext, StyleRule};
use crate::{Error, Result};

pub const STYLED_COMPONENTS: &str = "styled-components";
pub const EMOTION: &str = "emotion";

/// Output of the markup stage: the body plus an optional style-tag string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedFragment {
    pub body: String,
    pub styles: String,
}

/// A strategy turning an element into markup plus extracted styles
pub trait StyleLibrary: Send + Sync {
    fn extract(&self, element: &Element<'_>) -> Result<RenderedFragment>;
}

/// Plain static markup, no style extraction
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStyles;

impl StyleLibrary for NoStyles {
    fn extract(&self, element: &Element<'_>) -> Result<RenderedFragment> {
        let mut cx = RenderContext::new();
        let body = render_to_static_markup(element, &mut cx)?;
        Ok(RenderedFragment {
            body,
            styles: String::new(),
        })
    }
}

/// Collects style rules emitted while rendering.
///
/// A sheet is single use: [`ServerStyleSheet::style_tags`] consumes it.
#[derive(Debug, Default)]
pub struct ServerStyleSheet {
    cx: RenderContext,
}

impl ServerStyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `element` inside this sheet's collecting context
    pub fn collect_styles(&mut self, element: &Element<'_>) -> Result<String> {
        render_to_static_markup(element, &mut self.cx)
    }

    /// Emit every collected rule as a single style tag (empty if none)
    pub fn style_tags(self) -> String {
        let rules = self.cx.rules();
        if rules.is_empty() {
            return String::new();
        }
        let css: String = rules.iter().map(|r| r.css.as_str()).collect();
        format!("<style data-styled=\"active\">{}</style>", css)
    }
}

/// The `"styled-components"` strategy
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectedStyles;

impl StyleLibrary for CollectedStyles {
    fn extract(&self, element: &Element<'_>) -> Result<RenderedFragment> {
        let mut sheet = ServerStyleSheet::new();
        let body = sheet.collect_styles(element)?;
        Ok(RenderedFragment {
            body,
            styles: sheet.style_tags(),
        })
    }
}

/// The `"emotion"` strategy
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineStyles;

impl StyleLibrary for InlineStyles {
    fn extract(&self, element: &Element<'_>) -> Result<RenderedFragment> {
        let mut cx = RenderContext::new();
        let markup = render_to_static_markup(element, &mut cx)?;
        Ok(RenderedFragment {
            body: render_styles_to_string(&markup, cx.rules()),
            styles: String::new(),
        })
    }
}

/// Insert a `<style>` tag for each rule right before the first start tag
/// whose `class` attribute references it. Unreferenced rules are dropped.
pub fn render_styles_to_string(html: &str, rules: &[StyleRule]) -> String {
    let mut pending: Vec<&StyleRule> = rules.iter().collect();
    let mut out = String::with_capacity(html.len());
    let mut copied = 0;
    let mut cursor = 0;

    while !pending.is_empty() {
        let start = match html[cursor..].find('<') {
            Some(i) => cursor + i,
            None => break,
        };
        let end = match tag_end(html, start) {
            Some(end) => end,
            None => break,
        };
        let classes = class_tokens(&html[start..end]);

        let mut inserted = String::new();
        pending.retain(|rule| {
            if classes.contains(&rule.class.as_str()) {
                let id = rule.class.trim_start_matches("css-");
                inserted.push_str(&format!("<style data-emotion-css=\"{}\">{}</style>", id, rule.css));
                false
            } else {
                true
            }
        });
        if !inserted.is_empty() {
            out.push_str(&html[copied..start]);
            out.push_str(&inserted);
            copied = start;
        }
        cursor = end;
    }
    out.push_str(&html[copied..]);
    out
}

/// Offset just past the `>` closing the tag opened at `start`; a `>` inside
/// a quoted attribute value does not close the tag.
fn tag_end(html: &str, start: usize) -> Option<usize> {
    let mut quote = None;
    for (i, c) in html[start..].char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(start + i + 1),
            None => {}
        }
    }
    None
}

fn class_tokens(tag: &str) -> Vec<&str> {
    if tag.starts_with("</") || tag.starts_with("<!") {
        return Vec::new();
    }
    let mut offset = 0;
    while let Some(i) = tag[offset..].find("class=") {
        let at = offset + i;
        let value_start = at + "class=".len();
        if tag[..at].ends_with(|c: char| c.is_ascii_whitespace()) {
            let value = &tag[value_start..];
            let value = match value.chars().next() {
                Some(q @ ('"' | '\'')) => value[1..].split(q).next().unwrap_or(""),
                _ => value
                    .split(|c: char| c.is_ascii_whitespace() || c == '>' || c == '/')
                    .next()
                    .unwrap_or(""),
            };
            return value.split_ascii_whitespace().collect();
        }
        offset = value_start;
    }
    Vec::new()
}

/// Name-to-strategy registry used to resolve `css_library`
#[derive(Clone)]
pub struct StyleLibraries {
    libs: HashMap<String, Arc<dyn StyleLibrary>>,
}

impl Default for StyleLibraries {
    fn default() -> Self {
        #[allow(unused_mut)]
        let mut libs = Self::empty();
        #[cfg(feature = "styled-components")]
        libs.register(STYLED_COMPONENTS, CollectedStyles);
        #[cfg(feature = "emotion")]
        libs.register(EMOTION, InlineStyles);
        libs
    }
}

impl StyleLibraries {
    /// A registry with no libraries installed
    pub fn empty() -> Self {
        Self { libs: HashMap::new() }
    }

    pub fn register(&mut self, name: impl Into<String>, lib: impl StyleLibrary + 'static) {
        self.libs.insert(name.into(), Arc::new(lib));
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.libs.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a library by name; `None` selects plain static markup
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn StyleLibrary>> {
        match name {
            None => Ok(Arc::new(NoStyles)),
            Some(name) => {
                let lib = self.libs.get(name).cloned().ok_or_else(|| {
                    Error::DependencyError(format!(
                        "style library '{}' is not installed (available: [{}])",
                        name,
                        self.names().join(", ")
                    ))
                })?;
                debug!("resolved style library '{}'", name);
                Ok(lib)
            }
        }
    }
}
