//! Static markup rendering for components
//!
//! A [`Component`] turns a property bag into an HTML fragment. While
//! rendering, components may register style rules on the [`RenderContext`];
//! what happens to those rules is decided by the selected style library
//! (see [`crate::styles`]).

use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Opaque property bag handed to a component
pub type Props = serde_json::Map<String, serde_json::Value>;

/// A style rule registered during rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    /// Generated class name, e.g. `css-1a2b3c4d`
    pub class: String,
    /// Full rule text, e.g. `.css-1a2b3c4d{color:red}`
    pub css: String,
}

/// Per-render state shared with components.
///
/// Rules are deduplicated by declaration text and kept in the order they
/// were first registered.
#[derive(Debug, Default)]
pub struct RenderContext {
    rules: Vec<StyleRule>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `declarations` (e.g. `"color:red;padding:4px"`) and return
    /// the class name components should put on their element.
    pub fn css(&mut self, declarations: &str) -> String {
        let declarations = declarations.trim();
        let class = class_name(declarations);
        if !self.rules.iter().any(|r| r.class == class) {
            self.rules.push(StyleRule {
                css: format!(".{}{{{}}}", class, declarations),
                class: class.clone(),
            });
        }
        class
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// Drain the registered rules, leaving the context empty
    pub fn take_rules(&mut self) -> Vec<StyleRule> {
        std::mem::take(&mut self.rules)
    }
}

fn class_name(declarations: &str) -> String {
    let digest = Sha256::digest(declarations.as_bytes());
    format!("css-{}", hex::encode(&digest[..4]))
}

/// A renderable UI component
pub trait Component: Send + Sync {
    /// Render the component's static markup for `props`
    fn render(&self, props: &Props, cx: &mut RenderContext) -> Result<String>;
}

impl<F> Component for F
where
    F: Fn(&Props, &mut RenderContext) -> Result<String> + Send + Sync,
{
    fn render(&self, props: &Props, cx: &mut RenderContext) -> Result<String> {
        self(props, cx)
    }
}

/// A component paired with the props it should render with
#[derive(Clone)]
pub struct Element<'a> {
    pub component: &'a dyn Component,
    pub props: Props,
}

impl<'a> Element<'a> {
    pub fn new(component: &'a dyn Component, props: Props) -> Self {
        Self { component, props }
    }
}

/// Render an element to a static markup string
pub fn render_to_static_markup(element: &Element<'_>, cx: &mut RenderContext) -> Result<String> {
    element.component.render(&element.props, cx)
}

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A component backed by an HTML template string.
///
/// Placeholders:
/// - `{{key}}` inserts the escaped prop value (missing keys render empty)
/// - `{{{key}}}` inserts the value verbatim
/// - `{{css color:red;padding:4px}}` registers a rule and inserts its class name
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Component for Template {
    fn render(&self, props: &Props, cx: &mut RenderContext) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start..];

            let (raw, open, close) = if after.starts_with("{{{") {
                (true, 3, "}}}")
            } else {
                (false, 2, "}}")
            };
            let end = after[open..].find(close).ok_or_else(|| {
                Error::RenderError(format!(
                    "unclosed placeholder at byte {}",
                    self.source.len() - rest.len() + start
                ))
            })?;
            let key = after[open..open + end].trim();

            if let Some(declarations) = key.strip_prefix("css ") {
                out.push_str(&cx.css(declarations));
            } else {
                let value = props.get(key).map(prop_to_string).unwrap_or_default();
                if raw {
                    out.push_str(&value);
                } else {
                    out.push_str(&escape_html(&value));
                }
            }
            rest = &after[open + end + close.len()..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn prop_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
