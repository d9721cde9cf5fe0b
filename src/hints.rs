//! Shell-style search suggestions for refs that failed to resolve.
//! Advisory text only: nothing here runs them.

use std::path::Path;

use crate::resolver::is_glob;
use crate::types::{Ref, RefKind, SymbolQuery};

/// Glob used when a ref has no file pattern.
const ANY_FILE: &str = "**/*";

/// Suggestions for locating a ref by hand, best first.
///
/// Code symbols and doc headings/anchors come first, then the literal text,
/// then the commit, then a filename search when `f` is a plain path.
pub fn search_hints(reference: &Ref) -> Vec<String> {
    let glob = quote(reference.file().unwrap_or(ANY_FILE));
    let mut hints = Vec::new();

    match reference.kind() {
        RefKind::Code => {
            if let Some(query) = reference.symbol_query() {
                push_symbol_hints(&query, &glob, &mut hints);
            }
        },
        RefKind::Doc => {
            if let Some(heading) = reference.heading() {
                let text = regex::escape(heading.trim_start_matches('#').trim());
                hints.push(format!(r"rg -i {} --glob {glob}", quote(&format!(r"^#+\s*{text}"))));
            }
            if let Some(anchor) = reference.anchor() {
                let id = regex::escape(anchor);
                hints.push(format!("rg {} --glob {glob}", quote(&format!("(id|name)=.?{id}"))));
            }
        },
    }

    if let Some(text) = reference.text() {
        hints.push(format!("rg -F {} --glob {glob}", quote(text)));
    }

    if let Some(commit) = reference.commit() {
        match reference.file() {
            Some(file) => hints.push(format!("git show {commit} -- {}", quote(file))),
            None => hints.push(format!("git show {commit} --stat")),
        }
    }

    if let Some(file) = reference.file()
        && !is_glob(file)
        && let Some(name) = Path::new(file).file_name()
    {
        let pattern = format!("**/{}", name.to_string_lossy());
        hints.push(format!("rg --files --glob {}", quote(&pattern)));
    }

    return hints;
}

/// Class/def searches for a dotted symbol, one combined search for a bare one.
fn push_symbol_hints(query: &SymbolQuery, glob: &str, hints: &mut Vec<String>) {
    match query {
        SymbolQuery::Bare(name) => {
            let pattern = format!(r"(class|def|function)\s+{}", regex::escape(name));
            hints.push(format!("rg {} --glob {glob}", quote(&pattern)));
        },
        SymbolQuery::Scoped { member, owner } => {
            let owner_pattern = format!(r"(class|def)\s+{}", regex::escape(owner));
            let member_pattern = format!(r"def\s+{}", regex::escape(member));
            hints.push(format!("rg {} --glob {glob}", quote(&owner_pattern)));
            hints.push(format!("rg {} --glob {glob}", quote(&member_pattern)));
        },
    }
}

/// Wrap in double quotes, escaping what the shell expands inside them.
fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().saturating_add(2));
    out.push('"');
    for c in raw.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    return out;
}
