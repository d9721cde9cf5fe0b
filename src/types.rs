//! Core domain types: refs, their kinds, symbol queries, and resolved locations.
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A concrete place a ref resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// `path#fragment`: a heading slug, an anchor id, or `page=N`.
    Anchored {
        /// Fragment after `#`, without the `#`.
        fragment: String,
        /// Resolved file.
        path: PathBuf,
    },
    /// A bare file path.
    File(
        /// Resolved file.
        PathBuf,
    ),
    /// `path:line`.
    Line {
        /// One-based line number.
        line: u32,
        /// Resolved file.
        path: PathBuf,
    },
}

/// A validated pointer from a journal entry to a code or document location.
///
/// Only obtainable through `Ref::try_from(RefFields)` (serde routes through the
/// same conversion), so every `Ref` satisfies the by-kind locator invariant.
/// Serializes to the JSON wire shape with absent fields omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RefFields")]
pub struct Ref {
    /// Anchor id (doc refs).
    #[serde(rename = "a", skip_serializing_if = "Option::is_none")]
    anchor: Option<String>,
    /// Commit the ref was written against. Informational only.
    #[serde(rename = "c", skip_serializing_if = "Option::is_none")]
    commit: Option<String>,
    /// File path or glob.
    #[serde(rename = "f", skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    /// Markdown heading text, `#` markers allowed (doc refs).
    #[serde(rename = "h", skip_serializing_if = "Option::is_none")]
    heading: Option<String>,
    /// Code or doc.
    kind: RefKind,
    /// Line-number hint. May be stale.
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    /// Name, unique within the owning entry.
    name: String,
    /// PDF page number (doc refs).
    #[serde(rename = "p", skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    /// Symbol path such as `Class.method` or `method` (code refs).
    #[serde(rename = "s", skip_serializing_if = "Option::is_none")]
    symbol: Option<String>,
    /// Literal text to search for.
    #[serde(rename = "t", skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

/// Loosely-typed ref fields as they arrive from the DSL parser or a JSON object.
/// Keys mirror the wire format; nothing here is validated yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RefFields {
    /// Anchor id.
    pub a: Option<String>,
    /// Commit id.
    pub c: Option<String>,
    /// File path or glob.
    pub f: Option<String>,
    /// Heading text.
    pub h: Option<String>,
    /// Raw kind string; `code` when absent.
    pub kind: Option<String>,
    /// Line hint. `l` is accepted on input.
    #[serde(alias = "l")]
    pub line: Option<i64>,
    /// Ref name.
    pub name: Option<String>,
    /// Page number.
    pub p: Option<i64>,
    /// Symbol path.
    pub s: Option<String>,
    /// Literal text.
    pub t: Option<String>,
}

/// What a ref points into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    /// Source code, located by symbol, text, or file.
    #[default]
    Code,
    /// A document, located by heading, anchor, page, or text within one file.
    Doc,
}

/// Parsed from a symbol path. Either bare ("validate") or dot-scoped
/// ("Config.validate"), split on the last dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolQuery {
    /// Unscoped symbol name such as `validate`.
    Bare(String),
    /// Dot-scoped symbol such as `Config.validate`.
    Scoped {
        /// Member name after the last dot.
        member: String,
        /// Everything before the last dot.
        owner: String,
    },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Self::Anchored { fragment, path } => write!(f, "{}#{fragment}", path.display()),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Line { line, path } => write!(f, "{}:{line}", path.display()),
        };
    }
}

impl Serialize for Location {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        return serializer.collect_str(self);
    }
}

impl Ref {
    /// Anchor id, if any.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        return self.anchor.as_deref();
    }

    /// Commit id, if any.
    #[must_use]
    pub fn commit(&self) -> Option<&str> {
        return self.commit.as_deref();
    }

    /// File path or glob, if any.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        return self.file.as_deref();
    }

    /// Heading text as written, `#` markers included.
    #[must_use]
    pub fn heading(&self) -> Option<&str> {
        return self.heading.as_deref();
    }

    /// Code or doc.
    #[must_use]
    pub const fn kind(&self) -> RefKind {
        return self.kind;
    }

    /// Line-number hint, if any.
    #[must_use]
    pub const fn line(&self) -> Option<u32> {
        return self.line;
    }

    /// The ref's name.
    #[must_use]
    pub fn name(&self) -> &str {
        return &self.name;
    }

    /// Page number, if any.
    #[must_use]
    pub const fn page(&self) -> Option<u32> {
        return self.page;
    }

    /// Raw symbol path, if any.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        return self.symbol.as_deref();
    }

    /// The symbol path split into bare or owner/member form.
    #[must_use]
    pub fn symbol_query(&self) -> Option<SymbolQuery> {
        return self.symbol.as_deref().map(SymbolQuery::parse);
    }

    /// Literal text pattern, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        return self.text.as_deref();
    }

    /// Check the by-kind locator invariant.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingCodeLocator` for a code ref without `s`, `f`, or `t`,
    /// or `Error::MissingDocFile` for a doc ref without `f`.
    fn enforce_locator_invariant(&self) -> Result<(), Error> {
        return match self.kind {
            RefKind::Code if self.symbol.is_none() && self.file.is_none() && self.text.is_none() => {
                Err(Error::MissingCodeLocator { name: self.name.clone() })
            },
            RefKind::Doc if self.file.is_none() => Err(Error::MissingDocFile { name: self.name.clone() }),
            RefKind::Code | RefKind::Doc => Ok(()),
        };
    }
}

impl TryFrom<RefFields> for Ref {
    type Error = Error;

    fn try_from(fields: RefFields) -> Result<Self, Error> {
        let name = non_blank(fields.name)
            .map(|n| return n.trim().to_string())
            .ok_or_else(|| return Error::EmptyName { input: "<structured ref>".to_string() })?;
        let kind = match non_blank(fields.kind) {
            None => RefKind::Code,
            Some(raw) => raw.parse()?,
        };
        let line = fields.line.map(|v| return positive_integer("line", v)).transpose()?;
        let page = fields.p.map(|v| return positive_integer("page", v)).transpose()?;

        let reference = Self {
            anchor: non_blank(fields.a),
            commit: non_blank(fields.c),
            file: non_blank(fields.f),
            heading: non_blank(fields.h),
            kind,
            line,
            name,
            page,
            symbol: non_blank(fields.s),
            text: non_blank(fields.t),
        };
        reference.enforce_locator_invariant()?;
        return Ok(reference);
    }
}

impl FromStr for RefKind {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Error> {
        return match raw.trim() {
            "code" => Ok(Self::Code),
            "doc" => Ok(Self::Doc),
            other => Err(Error::InvalidKind { value: other.to_string() }),
        };
    }
}

impl SymbolQuery {
    /// The display name used in hints and log lines.
    #[must_use]
    pub fn display_name(&self) -> String {
        return match self {
            Self::Bare(name) => name.clone(),
            Self::Scoped { member, owner } => format!("{owner}.{member}"),
        };
    }

    /// Split a symbol path on its last dot. A leading or trailing dot leaves it bare.
    #[must_use]
    pub fn parse(symbol: &str) -> Self {
        return match symbol.rsplit_once('.') {
            Some((owner, member)) if !owner.is_empty() && !member.is_empty() => Self::Scoped {
                member: member.to_string(),
                owner: owner.to_string(),
            },
            _ => Self::Bare(symbol.to_string()),
        };
    }
}

/// Treat empty and whitespace-only strings as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    return value.filter(|v| return !v.trim().is_empty());
}

/// Narrow a raw integer to a positive `u32`.
///
/// # Errors
///
/// Returns `Error::InvalidInteger` for zero, negatives, or values past `u32::MAX`.
fn positive_integer(field: &'static str, value: i64) -> Result<u32, Error> {
    return u32::try_from(value)
        .ok()
        .filter(|n| return *n > 0)
        .ok_or_else(|| return Error::InvalidInteger { field, value: value.to_string() });
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test code")]
mod tests {
    use super::*;

    fn fields(name: &str) -> RefFields {
        return RefFields { name: Some(name.to_string()), ..RefFields::default() };
    }

    #[test]
    fn code_ref_requires_a_locator() {
        let err = Ref::try_from(RefFields { c: Some("abc123".into()), ..fields("impl") }).unwrap_err();
        assert!(err.to_string().contains("at least one of"), "{err}");
    }

    #[test]
    fn doc_ref_requires_file() {
        let err = Ref::try_from(RefFields {
            kind: Some("doc".into()),
            h: Some("## Setup".into()),
            ..fields("spec")
        })
        .unwrap_err();
        assert!(err.to_string().contains("requires file pattern"), "{err}");
    }

    #[test]
    fn kind_defaults_to_code() {
        let r = Ref::try_from(RefFields { t: Some("def foo(".into()), ..fields("impl") }).unwrap();
        assert_eq!(r.kind(), RefKind::Code);
        assert_eq!(r.file(), None);
        assert_eq!(r.line(), None);
    }

    #[test]
    fn invalid_kind_rejected() {
        let err = Ref::try_from(RefFields {
            kind: Some("invalid".into()),
            t: Some("x".into()),
            ..fields("impl")
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidKind { .. }));
    }

    #[test]
    fn blank_name_rejected() {
        let err = Ref::try_from(RefFields { t: Some("x".into()), ..fields("  ") }).unwrap_err();
        assert!(matches!(err, Error::EmptyName { .. }));
    }

    #[test]
    fn zero_line_rejected() {
        let err = Ref::try_from(RefFields { f: Some("a.py".into()), line: Some(0), ..fields("impl") })
            .unwrap_err();
        assert!(err.to_string().contains("line"), "{err}");
    }

    #[test]
    fn empty_locator_strings_count_as_absent() {
        let err = Ref::try_from(RefFields { f: Some(String::new()), ..fields("impl") }).unwrap_err();
        assert!(matches!(err, Error::MissingCodeLocator { .. }));
    }

    #[test]
    fn serializes_without_absent_fields() {
        let r = Ref::try_from(RefFields {
            s: Some("CircuitBreaker.call".into()),
            f: Some("**/resilience.py".into()),
            t: Some("def call(self".into()),
            c: Some("abc123".into()),
            ..fields("impl")
        })
        .unwrap();
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "impl",
                "kind": "code",
                "s": "CircuitBreaker.call",
                "f": "**/resilience.py",
                "t": "def call(self",
                "c": "abc123",
            })
        );
    }

    #[test]
    fn deserializes_through_validation() {
        let r: Ref = serde_json::from_value(serde_json::json!({
            "name": "spec", "kind": "doc", "f": "docs/arch.md", "h": "## Overview", "l": 4,
        }))
        .unwrap();
        assert_eq!(r.kind(), RefKind::Doc);
        assert_eq!(r.heading(), Some("## Overview"));
        assert_eq!(r.line(), Some(4));

        let bad = serde_json::from_value::<Ref>(serde_json::json!({"name": "x", "kind": "code"}));
        assert!(bad.is_err());
    }

    #[test]
    fn symbol_splits_on_last_dot() {
        assert_eq!(
            SymbolQuery::parse("pkg.Config.validate"),
            SymbolQuery::Scoped { member: "validate".into(), owner: "pkg.Config".into() }
        );
        assert_eq!(SymbolQuery::parse("validate"), SymbolQuery::Bare("validate".into()));
        assert_eq!(SymbolQuery::parse("trailing."), SymbolQuery::Bare("trailing.".into()));
    }

    #[test]
    fn location_display() {
        let path = PathBuf::from("/p/docs/api.pdf");
        let page = Location::Anchored { fragment: "page=12".into(), path: path.clone() };
        assert_eq!(page.to_string(), "/p/docs/api.pdf#page=12");
        assert_eq!(Location::Line { line: 10, path: path.clone() }.to_string(), "/p/docs/api.pdf:10");
        assert_eq!(Location::File(path).to_string(), "/p/docs/api.pdf");
    }
}
