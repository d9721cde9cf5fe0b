//! Normalization of mixed ref lists (DSL strings and JSON objects) into the
//! persisted JSON shape.

use serde_json::Value;

use crate::dsl;
use crate::error::Error;
use crate::types::{Ref, RefFields};

/// Parse and validate every element of a mixed list into `Ref`s, preserving order.
///
/// # Errors
///
/// Returns the first parse or validation error. Elements that are neither
/// strings nor objects yield `Error::InvalidRefEntry` naming their index.
pub fn parse_ref_values(entries: &[Value]) -> Result<Vec<Ref>, Error> {
    return entries
        .iter()
        .enumerate()
        .map(|(index, entry)| return ref_from_value(index, entry))
        .collect();
}

/// Validate a mixed list and return JSON-ready objects with absent fields omitted.
///
/// Idempotent: feeding the output back in yields the same output.
///
/// # Errors
///
/// Returns the first parse or validation error, or `Error::Json` if a ref
/// cannot be serialized.
pub fn validate_refs(entries: &[Value]) -> Result<Vec<Value>, Error> {
    let refs = parse_ref_values(entries)?;
    return refs
        .iter()
        .map(|r| return serde_json::to_value(r).map_err(Error::from))
        .collect();
}

/// Short description of a JSON value's type for error messages.
const fn json_type_name(value: &Value) -> &'static str {
    return match value {
        Value::Array(_) => "an array",
        Value::Bool(_) => "a boolean",
        Value::Null => "null",
        Value::Number(_) => "a number",
        Value::Object(_) => "an object",
        Value::String(_) => "a string",
    };
}

/// Interpret one list element as a DSL string or a structured map.
///
/// # Errors
///
/// Returns parse/validation errors, or `Error::InvalidRefEntry` for
/// unsupported element types and malformed objects.
fn ref_from_value(index: usize, entry: &Value) -> Result<Ref, Error> {
    return match entry {
        Value::String(dsl) => dsl::parse_ref(dsl),
        Value::Object(_) => {
            let fields: RefFields = serde_json::from_value(entry.clone())
                .map_err(|e| return Error::InvalidRefEntry { index, reason: e.to_string() })?;
            Ref::try_from(fields)
        },
        other => Err(Error::InvalidRefEntry {
            index,
            reason: format!("expected a ref string or an object, found {}", json_type_name(other)),
        }),
    };
}
