//! CLI commands for refpin: parse, resolve, hints.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde_json::{Value, json};

use crate::config::Config;
use crate::dsl;
use crate::error::Error;
use crate::hints;
use crate::resolver::{self, Outcome, Resolution};
use crate::types::{Location, Ref};
use crate::validate;

/// How `resolve` prints its report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON array of `{name, location, hints}` objects.
    Json,
    /// `RESOLVED` / `UNRESOLVED` lines with indented hints.
    #[default]
    Text,
}

/// Inputs to the `resolve` command.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Report format.
    pub format: OutputFormat,
    /// Overrides the configured hints-per-ref limit.
    pub hint_limit: Option<usize>,
    /// DSL strings given on the command line.
    pub inline: Vec<String>,
    /// JSON file holding an array of DSL strings and/or ref objects.
    pub refs_file: Option<PathBuf>,
    /// Project root to resolve against.
    pub root: PathBuf,
}

/// Print every search hint for each ref, grouped under its name.
///
/// # Errors
///
/// Returns the first DSL parse or validation error.
pub fn hints(inputs: &[String]) -> Result<(), Error> {
    let refs = parse_inline(inputs)?;
    for reference in &refs {
        println!("{}", reference.name());
        let all = hints::search_hints(reference);
        if all.is_empty() {
            println!("  (no hints)");
        }
        for hint in &all {
            println!("  {hint}");
        }
    }
    return Ok(());
}

/// Collect refs from the `--refs` file (first) and inline DSL strings (after).
///
/// # Errors
///
/// Returns `Error::Io` or `Error::Json` if the refs file is unreadable or not
/// a JSON array, and validation errors for any malformed ref.
fn load_refs(options: &ResolveOptions) -> Result<Vec<Ref>, Error> {
    let mut refs = Vec::new();
    if let Some(path) = &options.refs_file {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<Value> = serde_json::from_str(&content)?;
        refs.extend(validate::parse_ref_values(&entries)?);
    }
    refs.extend(parse_inline(&options.inline)?);
    return Ok(refs);
}

/// Validate DSL strings and print the normalized JSON array.
///
/// # Errors
///
/// Returns the first DSL parse or validation error.
pub fn parse(inputs: &[String]) -> Result<(), Error> {
    let refs = parse_inline(inputs)?;
    println!("{}", serde_json::to_string_pretty(&refs)?);
    return Ok(());
}

/// Parse DSL strings in order, stopping at the first bad one.
///
/// # Errors
///
/// Returns the DSL parse or validation error of the first malformed string.
fn parse_inline(inputs: &[String]) -> Result<Vec<Ref>, Error> {
    return inputs.iter().map(|input| return dsl::parse_ref(input)).collect();
}

/// Print the JSON report: one object per ref, hints capped at `limit`.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
fn print_json_report(resolutions: &[Resolution], root: &Path, limit: usize) -> Result<(), Error> {
    let report: Vec<Value> = resolutions
        .iter()
        .map(|resolution| {
            return match &resolution.outcome {
                Outcome::Resolved(location) => json!({
                    "hints": [],
                    "location": relative_location(location, root).to_string(),
                    "name": resolution.name,
                }),
                Outcome::Unresolved { hints } => json!({
                    "hints": hints.iter().take(limit).collect::<Vec<_>>(),
                    "location": null,
                    "name": resolution.name,
                }),
            };
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&report)?);
    return Ok(());
}

/// Print `RESOLVED` / `UNRESOLVED` lines, hints indented, then a summary.
fn print_text_report(resolutions: &[Resolution], root: &Path, limit: usize) {
    let mut unresolved = 0_usize;
    for resolution in resolutions {
        match &resolution.outcome {
            Outcome::Resolved(location) => {
                println!("RESOLVED    {}  {}", resolution.name, relative_location(location, root));
            },
            Outcome::Unresolved { hints } => {
                unresolved = unresolved.saturating_add(1);
                println!("UNRESOLVED  {}", resolution.name);
                for hint in hints.iter().take(limit) {
                    println!("  try: {hint}");
                }
            },
        }
    }

    let resolved = resolutions.len().saturating_sub(unresolved);
    println!();
    println!("{resolved} resolved, {unresolved} unresolved");
    return;
}

/// Rewrite a location's path relative to the project root for display.
fn relative_location(location: &Location, root: &Path) -> Location {
    let strip = |path: &PathBuf| {
        return path
            .strip_prefix(root)
            .map_or_else(|_err| return path.clone(), Path::to_path_buf);
    };
    return match location {
        Location::Anchored { fragment, path } => Location::Anchored {
            fragment: fragment.clone(),
            path: strip(path),
        },
        Location::File(path) => Location::File(strip(path)),
        Location::Line { line, path } => Location::Line { line: *line, path: strip(path) },
    };
}

/// Resolve refs against a project root and print a report.
///
/// Exit code: 0 when every ref resolved, 1 when any did not.
///
/// # Errors
///
/// Returns `Error::RootNotFound` for a missing root, config errors from
/// `.refpin.toml`, and validation errors for malformed refs.
pub fn resolve(options: &ResolveOptions) -> Result<ExitCode, Error> {
    if !options.root.is_dir() {
        return Err(Error::RootNotFound { path: options.root.clone() });
    }

    let mut config = Config::load(&options.root)?;
    if let Some(limit) = options.hint_limit {
        config = config.with_hint_limit(limit);
    }

    let refs = load_refs(options)?;
    if refs.is_empty() {
        eprintln!("No refs given. Pass DSL strings or --refs <FILE>.");
        return Ok(ExitCode::SUCCESS);
    }

    let search = config.search_provider();
    let resolutions = resolver::resolve_all(&refs, &options.root, search.as_ref());

    match options.format {
        OutputFormat::Json => print_json_report(&resolutions, &options.root, config.hint_limit())?,
        OutputFormat::Text => print_text_report(&resolutions, &options.root, config.hint_limit()),
    }

    let all_resolved = resolutions
        .iter()
        .all(|resolution| return matches!(resolution.outcome, Outcome::Resolved(_)));
    if all_resolved {
        return Ok(ExitCode::SUCCESS);
    }
    return Ok(ExitCode::from(1));
}
