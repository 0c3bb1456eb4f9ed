//! Server-rendered HTML pages
//!
//! Templates live in `templates/` and are compiled into the binary with
//! rust-embed, then loaded into a single Tera instance at startup. Every page
//! context carries the public site settings under `site`.

mod error;
mod pages;

use anyhow::{Context, Result};
use rust_embed::RustEmbed;
use std::collections::HashMap;
use std::error::Error as _;
use tera::{Context as TeraContext, Tera, Value};

use crate::services::markdown;

pub use error::PageError;
pub use pages::{not_found, router};

/// Embedded page templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct TemplateAssets;

/// Tera wrapper holding the embedded templates
pub struct PageRenderer {
    tera: Tera,
}

impl PageRenderer {
    /// Load every embedded template. Fails on a template syntax error.
    pub fn new() -> Result<Self> {
        let mut templates: Vec<(String, String)> = Vec::new();
        for name in TemplateAssets::iter() {
            let file = TemplateAssets::get(&name)
                .with_context(|| format!("Embedded template vanished: {}", name))?;
            let content = String::from_utf8(file.data.into_owned())
                .with_context(|| format!("Template is not UTF-8: {}", name))?;
            templates.push((name.into_owned(), content));
        }

        // Base templates first so children can resolve their parent
        templates.sort_by(|a, b| {
            let a_is_base = a.0 == "base.html";
            let b_is_base = b.0 == "base.html";
            b_is_base.cmp(&a_is_base).then_with(|| a.0.cmp(&b.0))
        });

        let mut tera = Tera::default();
        for (name, content) in &templates {
            tera.add_raw_template(name, content)
                .map_err(|e| anyhow::anyhow!("Failed to add template {}: {}", name, e))?;
        }
        tera.build_inheritance_chains()
            .map_err(|e| anyhow::anyhow!("Failed to build template inheritance: {}", e))?;

        tera.register_filter("poem", poem_filter);
        tera.register_filter("markdown", markdown_filter);

        tracing::debug!("Loaded {} page templates", templates.len());
        Ok(Self { tera })
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, PageError> {
        self.tera.render(template, context).map_err(|e| {
            let mut message = format!("Failed to render '{}': {}", template, e);
            let mut source = e.source();
            while let Some(s) = source {
                message.push_str(&format!("\n  Caused by: {}", s));
                source = s.source();
            }
            PageError::Render(message)
        })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }
}

/// `{{ poem.content | poem | safe }}`: stanza-preserving Markdown
fn poem_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value.as_str().unwrap_or_default();
    Ok(Value::String(markdown::render_poem(text)))
}

/// `{{ text | markdown | safe }}`: regular Markdown
fn markdown_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value.as_str().unwrap_or_default();
    Ok(Value::String(markdown::render(text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_pages_embedded() {
        let pages = PageRenderer::new().unwrap();
        for name in [
            "base.html",
            "index.html",
            "poems.html",
            "poem.html",
            "performances.html",
            "events.html",
            "books.html",
            "book.html",
            "contact.html",
            "404.html",
            "error.html",
        ] {
            assert!(pages.has_template(name), "missing {}", name);
        }
    }

    #[test]
    fn test_poem_filter_keeps_line_breaks() {
        let out = poem_filter(&json!("first line\nsecond line"), &HashMap::new()).unwrap();
        assert!(out.as_str().unwrap().contains("<br"));
        let out = markdown_filter(&json!("**bold**"), &HashMap::new()).unwrap();
        assert!(out.as_str().unwrap().contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_render_missing_template_is_error() {
        let pages = PageRenderer::new().unwrap();
        let err = pages.render("nope.html", &TeraContext::new()).unwrap_err();
        assert!(matches!(err, PageError::Render(_)));
    }
}
