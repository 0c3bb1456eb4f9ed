//! Slug generation
//!
//! Slugs keep ASCII letters and digits plus any non-ASCII characters, so
//! Devanagari titles stay readable in URLs. Everything else collapses to a
//! single `-`.

/// Turn a title (or a user-supplied slug) into a URL slug.
pub fn slugify(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_hyphen = false;

    for c in title.to_lowercase().chars() {
        let mapped = if c.is_ascii_alphanumeric() || !c.is_ascii() {
            if c.is_whitespace() {
                '-'
            } else {
                c
            }
        } else {
            '-'
        };

        if mapped == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push('-');
                prev_hyphen = true;
            }
        } else {
            result.push(mapped);
            prev_hyphen = false;
        }
    }

    result.trim_end_matches('-').to_string()
}

/// Slug for a record: the given slug when non-blank, else derived from `title`.
pub fn slug_or_title(slug: Option<&str>, title: &str) -> String {
    match slug.map(str::trim) {
        Some(s) if !s.is_empty() => slugify(s),
        _ => slugify(title),
    }
}
