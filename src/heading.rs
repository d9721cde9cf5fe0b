//! Markdown heading and anchor lookup for doc refs.

use std::path::Path;

use regex::RegexBuilder;

/// Check whether `anchor` is declared in the file by any common idiom:
/// `<a id="...">`, `<a name="...">`, `{#...}`, or a bare `id="..."` attribute.
/// Case-insensitive. Unreadable files report `false`.
pub fn find_anchor_in_file(file: &Path, anchor: &str) -> bool {
    let Some(content) = read_document(file) else {
        return false;
    };

    let id = regex::escape(anchor);
    let pattern = format!(
        r#"<a\s+id=["']?{id}["']?\s*>|<a\s+name=["']?{id}["']?\s*>|\{{#{id}\}}|id=["']?{id}["']?"#
    );
    return match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.is_match(&content),
        Err(e) => {
            tracing::warn!(anchor, error = %e, "anchor pattern failed to compile");
            false
        },
    };
}

/// Find a markdown heading matching `heading` (with or without `#` markers)
/// and return its anchor slug.
///
/// Comparison ignores case, surrounding whitespace, runs of inner
/// whitespace, and a trailing `{#id}`. The slug is taken from the whole
/// matched line, `{#id}` included.
pub fn find_markdown_heading(file: &Path, heading: &str) -> Option<String> {
    let content = read_document(file)?;
    let wanted = normalize_heading_text(strip_heading_markers(heading));

    for line in content.lines() {
        let Some(text) = atx_heading_text(line) else {
            continue;
        };
        if normalize_heading_text(strip_explicit_id(text)) != wanted {
            continue;
        }
        return Some(slugify_heading(line));
    }

    return None;
}

/// Convert a markdown heading to a URL fragment slug.
///
/// Leading `#` markers are dropped, the text is lowercased, characters other
/// than letters, digits, `_`, whitespace, and `-` are removed, and whitespace
/// and hyphen runs become a single hyphen with none at either end.
///
/// Kept characters follow the regex `\w` class rather than `[a-z0-9]`:
/// `_` and non-ASCII letters and digits survive (`Über_Cache` -> `über_cache`).
pub fn slugify_heading(heading: &str) -> String {
    let lowered = strip_heading_markers(heading).to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut prev_hyphen = true; // Start true to trim leading hyphens.

    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            if !prev_hyphen {
                slug.push('-');
                prev_hyphen = true;
            }
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            slug.push(c);
            prev_hyphen = false;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }
    return slug;
}

/// Heading text of an ATX heading line (`#+` then whitespace then text), if the line is one.
fn atx_heading_text(line: &str) -> Option<&str> {
    let rest = line.trim_start_matches('#');
    if rest.len() == line.len() || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    return (!text.is_empty()).then_some(text);
}

/// Lowercase and collapse whitespace for comparison.
fn normalize_heading_text(text: &str) -> String {
    return text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
}

/// Read a document as UTF-8, logging and swallowing failures.
fn read_document(file: &Path) -> Option<String> {
    return match std::fs::read_to_string(file) {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::debug!(file = %file.display(), error = %e, "cannot read document");
            None
        },
    };
}

/// Drop a trailing `{#custom-id}` from heading text.
fn strip_explicit_id(text: &str) -> &str {
    let trimmed = text.trim_end();
    let Some(inner) = trimmed.strip_suffix('}') else {
        return text;
    };
    let Some(open) = inner.rfind("{#") else {
        return text;
    };
    let id = inner.get(open.saturating_add(2)..).unwrap_or_default();
    if id.is_empty() || id.contains('}') {
        return text;
    }
    return inner.get(..open).unwrap_or_default().trim_end();
}

/// Drop leading `#` markers and the whitespace after them.
fn strip_heading_markers(heading: &str) -> &str {
    let rest = heading.trim_start_matches('#');
    if rest.len() == heading.len() {
        return heading;
    }
    return rest.trim_start();
}
