//! Compact ref DSL: `name:key=value,key=value,...`.
//!
//! The key alphabet is closed. A comma splits the body only when it is
//! immediately followed by one of these keys and `=`, so values such as
//! `t=def call(self, arg)` keep their commas.

use crate::error::Error;
use crate::types::{Ref, RefFields};

/// Single-letter keys that may start a segment.
const SEGMENT_KEYS: &[u8] = b"acfhklpst";

/// Parse a DSL string into unvalidated fields. `kind` defaults to `code`.
///
/// # Errors
///
/// Returns `Error::MissingSeparator` without a `:`, `Error::EmptyName` for a
/// blank name, `Error::EmptyBody` when nothing follows the colon,
/// `Error::InvalidSegment` for a segment without `=`, or
/// `Error::InvalidInteger` when `l`/`p` is not numeric.
pub fn parse_fields(input: &str) -> Result<RefFields, Error> {
    let Some((raw_name, body)) = input.split_once(':') else {
        return Err(Error::MissingSeparator { input: input.to_string() });
    };

    let name = raw_name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName { input: input.to_string() });
    }
    if body.trim().is_empty() {
        return Err(Error::EmptyBody { name: name.to_string() });
    }

    let mut fields = RefFields { name: Some(name.to_string()), ..RefFields::default() };
    for segment in split_body_on_key_commas(body) {
        apply_segment(&mut fields, segment)?;
    }
    if fields.kind.is_none() {
        fields.kind = Some("code".to_string());
    }

    return Ok(fields);
}

/// Parse and validate a DSL string in one step.
///
/// # Errors
///
/// Returns any parse error from `parse_fields`, or the validation error from
/// `Ref::try_from` when the by-kind locator invariant does not hold.
pub fn parse_ref(input: &str) -> Result<Ref, Error> {
    return Ref::try_from(parse_fields(input)?);
}

/// Store one `key=value` segment into the field map. Unknown keys are dropped.
///
/// # Errors
///
/// Returns `Error::InvalidSegment` or `Error::InvalidInteger`.
fn apply_segment(fields: &mut RefFields, segment: &str) -> Result<(), Error> {
    let Some((raw_key, value)) = segment.split_once('=') else {
        return Err(Error::InvalidSegment { segment: segment.to_string() });
    };

    match raw_key.trim() {
        "a" => fields.a = Some(value.trim().to_string()),
        "c" => fields.c = Some(value.trim().to_string()),
        "f" => fields.f = Some(value.trim().to_string()),
        "h" => fields.h = Some(value.trim().to_string()),
        "k" => fields.kind = Some(value.trim().to_string()),
        "l" => fields.line = Some(parse_integer("line", value)?),
        "p" => fields.p = Some(parse_integer("page", value)?),
        "s" => fields.s = Some(value.trim().to_string()),
        // Text is matched verbatim, leading indentation included.
        "t" => fields.t = Some(value.to_string()),
        other => tracing::debug!(key = other, "ignoring unknown ref key"),
    }

    return Ok(());
}

/// Parse an integer field value, naming the field on failure.
///
/// # Errors
///
/// Returns `Error::InvalidInteger` when the value is not a base-10 integer.
fn parse_integer(field: &'static str, value: &str) -> Result<i64, Error> {
    return value
        .trim()
        .parse()
        .map_err(|_err| return Error::InvalidInteger { field, value: value.to_string() });
}

/// Split on commas that are directly followed by a known key and `=`.
fn split_body_on_key_commas(body: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0_usize;

    for (idx, window) in body.as_bytes().windows(3).enumerate() {
        if let &[b',', key, b'='] = window
            && SEGMENT_KEYS.contains(&key)
        {
            segments.push(body.get(start..idx).unwrap_or_default());
            start = idx.saturating_add(1);
        }
    }
    segments.push(body.get(start..).unwrap_or_default());

    return segments;
}
