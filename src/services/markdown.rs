//! Markdown rendering
//!
//! Poems are written one line per verse, so single newlines must survive as
//! `<br>` instead of being folded into the paragraph the way CommonMark does.
//! Raw HTML in poem text is shown as text.

use pulldown_cmark::{html, Event, Options, Parser};

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options
}

/// Render poem text: soft breaks become hard breaks.
pub fn render_poem(text: &str) -> String {
    let parser = Parser::new_ext(text, options()).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render regular prose (descriptions, homepage sections).
pub fn render(text: &str) -> String {
    let parser = Parser::new_ext(text, options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// First non-empty lines of a poem, joined with " / ", for listings
pub fn excerpt(text: &str, max_lines: usize) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(max_lines)
        .collect::<Vec<_>>()
        .join(" / ")
}
