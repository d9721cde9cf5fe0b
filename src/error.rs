/// Crate-level error types for refpin diagnostics.
use std::path::PathBuf;

/// All errors in refpin carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the ref, field, value, or path at fault.
///
/// Resolution misses are not errors: they surface as `None` from the resolver.
#[allow(clippy::error_impl_error, reason = "crate-level error type re-exported as refpin::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The DSL body after `name:` is empty.
    #[error("ref `{name}` has no locator fields (expected `{name}:key=value,...`)")]
    EmptyBody {
        /// Name parsed before the colon.
        name: String,
    },

    /// The ref name is missing or blank.
    #[error("ref name is empty in `{input}`")]
    EmptyName {
        /// The raw DSL string or a placeholder for structured input.
        input: String,
    },

    /// `l`/`line` or `p`/`page` is not a positive integer.
    #[error("invalid {field} value `{value}`: expected a positive integer")]
    InvalidInteger {
        /// Field name (`line` or `page`).
        field: &'static str,
        /// The offending raw value.
        value: String,
    },

    /// `k`/`kind` is neither `code` nor `doc`.
    #[error("invalid kind `{value}`: expected `code` or `doc`")]
    InvalidKind {
        /// The offending raw value.
        value: String,
    },

    /// An element of a mixed ref list could not be interpreted as a ref.
    #[error("invalid ref at index {index}: {reason}")]
    InvalidRefEntry {
        /// Zero-based position in the input list.
        index: usize,
        /// Why the element was rejected.
        reason: String,
    },

    /// A DSL segment lacks the `key=value` shape.
    #[error("invalid ref segment `{segment}`: expected key=value")]
    InvalidSegment {
        /// The segment text as split from the body.
        segment: String,
    },

    /// `[search] timeout_secs` in `.refpin.toml` is zero or too large.
    #[error("invalid search timeout_secs `{value}`: expected 1 to {max}")]
    InvalidTimeout {
        /// Largest accepted value.
        max: u64,
        /// The configured value.
        value: u64,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON (de)serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A code ref has none of `s`, `f`, `t`.
    #[error("code ref `{name}` requires at least one of: s (symbol), f (file), t (text)")]
    MissingCodeLocator {
        /// Name of the offending ref.
        name: String,
    },

    /// A doc ref has no `f`.
    #[error("doc ref `{name}` requires file pattern (f)")]
    MissingDocFile {
        /// Name of the offending ref.
        name: String,
    },

    /// The DSL string has no `:` separating the name from the body.
    #[error("invalid ref `{input}`: expected `name:key=value,...`")]
    MissingSeparator {
        /// The raw DSL string.
        input: String,
    },

    /// The project root handed to the resolver does not exist.
    #[error("project root not found: {}", path.display())]
    RootNotFound {
        /// Path that was supplied as the project root.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}
