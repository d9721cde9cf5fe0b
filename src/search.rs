//! Text search adapter: first-match lookup behind the `SearchProvider` trait.
//!
//! `RipgrepSearch` shells out to a ripgrep-compatible binary under a hard
//! timeout. `BuiltinSearch` honours the same contract in-process. Both fold
//! tool failures and timeouts into "no match".

use std::ffi::OsStr;
use std::fmt;
use std::io::{BufRead as _, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use glob::{MatchOptions, Pattern};
use regex::Regex;
use walkdir::WalkDir;

use crate::types::Location;

/// Wall-clock budget for a single search.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// In-process search: walks the tree in file-name order, skipping hidden entries.
/// Does not read `.gitignore`.
#[derive(Debug, Clone)]
pub struct BuiltinSearch {
    /// Deadline for the whole walk.
    timeout: Duration,
}

/// Subprocess search through a ripgrep-compatible program.
#[derive(Debug, Clone)]
pub struct RipgrepSearch {
    /// Program name or path, resolved through `PATH`.
    program: String,
    /// Kill the subprocess after this long.
    timeout: Duration,
}

/// First matching line of a search. `path` is absolute when the request root is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// One-based line number.
    pub line: u32,
    /// File containing the match.
    pub path: PathBuf,
}

/// How the pattern is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Verbatim substring match.
    Literal,
    /// Regular expression (ripgrep / `regex` crate syntax).
    Regex,
}

/// One search: pattern, mode, project root, and scope.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// Literal or regex.
    pub mode: SearchMode,
    /// The text or expression to look for.
    pub pattern: &'a str,
    /// Working directory; relative globs and paths resolve against it.
    pub root: &'a Path,
    /// Where to look.
    pub scope: SearchScope<'a>,
}

/// Which files a search covers.
#[derive(Debug, Clone, Copy)]
pub enum SearchScope<'a> {
    /// Exactly one file.
    File(&'a Path),
    /// Every file under the root, optionally filtered by a glob.
    Tree(Option<&'a str>),
}

/// Compiled per-line predicate for the builtin search.
enum LineMatcher<'a> {
    /// Substring match.
    Literal(&'a str),
    /// Regex match.
    Pattern(Regex),
}

/// Finds the first line matching a request. Implementations must treat tool
/// failures and timeouts as `None` and be callable from many threads at once.
pub trait SearchProvider: Send + Sync {
    /// Return the first match, or `None` on no match, failure, or timeout.
    fn first_match(&self, request: &SearchRequest<'_>) -> Option<SearchHit>;
}

impl BuiltinSearch {
    /// Builtin search with the given deadline.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        return Self { timeout };
    }
}

impl Default for BuiltinSearch {
    fn default() -> Self {
        return Self::new(DEFAULT_TIMEOUT);
    }
}

impl SearchProvider for BuiltinSearch {
    fn first_match(&self, request: &SearchRequest<'_>) -> Option<SearchHit> {
        let matcher = LineMatcher::for_request(request)?;
        let Some(deadline) = Instant::now().checked_add(self.timeout) else {
            tracing::warn!(timeout_secs = self.timeout.as_secs_f64(), "search timeout out of range");
            return None;
        };

        return match request.scope {
            SearchScope::File(path) => {
                let full = request.root.join(path);
                let line = first_matching_line(&full, &matcher)?;
                Some(SearchHit { line, path: full })
            },
            SearchScope::Tree(glob) => walk_for_first_match(request.root, glob, &matcher, deadline),
        };
    }
}

impl LineMatcher<'_> {
    /// Compile the request's pattern. An invalid regex is logged and yields `None`.
    fn for_request<'a>(request: &SearchRequest<'a>) -> Option<LineMatcher<'a>> {
        return match request.mode {
            SearchMode::Literal => Some(LineMatcher::Literal(request.pattern)),
            SearchMode::Regex => match Regex::new(request.pattern) {
                Ok(re) => Some(LineMatcher::Pattern(re)),
                Err(e) => {
                    tracing::warn!(pattern = request.pattern, error = %e, "invalid search regex");
                    None
                },
            },
        };
    }

    /// Whether a single line matches.
    fn is_match(&self, line: &str) -> bool {
        return match self {
            Self::Literal(text) => line.contains(text),
            Self::Pattern(re) => re.is_match(line),
        };
    }
}

impl RipgrepSearch {
    /// Search through `program` with the given timeout.
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        return Self { program: program.into(), timeout };
    }

    /// Build the command line: line numbers, no heading, file names forced,
    /// one match per file, path-sorted output, run from the project root.
    fn command(&self, request: &SearchRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "--line-number",
            "--no-heading",
            "--with-filename",
            "--max-count=1",
            "--sort=path",
            "--color=never",
        ]);
        if request.mode == SearchMode::Literal {
            cmd.arg("--fixed-strings");
        }

        let target = match request.scope {
            SearchScope::File(path) => path.strip_prefix(request.root).unwrap_or(path).as_os_str(),
            SearchScope::Tree(glob) => {
                if let Some(glob) = glob {
                    cmd.arg("--glob").arg(glob);
                }
                OsStr::new(".")
            },
        };
        cmd.arg("--regexp").arg(request.pattern).arg("--").arg(target);

        cmd.current_dir(request.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        return cmd;
    }
}

impl Default for RipgrepSearch {
    fn default() -> Self {
        return Self::new("rg", DEFAULT_TIMEOUT);
    }
}

impl SearchProvider for RipgrepSearch {
    fn first_match(&self, request: &SearchRequest<'_>) -> Option<SearchHit> {
        let mut child = match self.command(request).spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(program = %self.program, "search tool not found");
                return None;
            },
            Err(e) => {
                tracing::warn!(program = %self.program, error = %e, "search tool failed to start");
                return None;
            },
        };
        let Some(stdout) = child.stdout.take() else {
            reap(&mut child);
            return None;
        };

        // Only the first line matters; the reader thread ends at EOF, which
        // the kill below guarantees.
        let (tx, rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || {
            let mut first = String::new();
            let read = BufReader::new(stdout).read_line(&mut first);
            let _ = tx.send(read.ok().filter(|n| return *n > 0).map(|_n| return first));
        });

        let outcome = rx.recv_timeout(self.timeout);
        reap(&mut child);

        return match outcome {
            Ok(Some(line)) => parse_match_line(request.root, &line),
            Ok(None) | Err(RecvTimeoutError::Disconnected) => None,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    pattern = request.pattern,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "search timed out"
                );
                None
            },
        };
    }
}

impl fmt::Display for SearchHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}:{}", self.path.display(), self.line);
    }
}

impl From<SearchHit> for Location {
    fn from(hit: SearchHit) -> Self {
        return Self::Line { line: hit.line, path: hit.path };
    }
}

/// Read a file and return the one-based number of its first matching line.
/// Unreadable and non-UTF-8 files never match.
fn first_matching_line(path: &Path, matcher: &LineMatcher<'_>) -> Option<u32> {
    let content = std::fs::read_to_string(path).ok()?;
    let idx = content.lines().position(|line| return matcher.is_match(line))?;
    return u32::try_from(idx.saturating_add(1)).ok();
}

/// Ripgrep glob semantics: a glob without `/` matches the file name at any
/// depth, otherwise the path relative to the root, where `*` and `?` stop at
/// `/` and only `**` crosses directories.
fn glob_matches(pattern: &Pattern, has_separator: bool, relative: &Path) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: has_separator,
        require_literal_leading_dot: false,
    };
    if has_separator {
        return pattern.matches_path_with(relative, options);
    }
    return relative
        .file_name()
        .is_some_and(|name| return pattern.matches_path_with(Path::new(name), options));
}

/// Hidden files and directories (dot-prefixed), never the walk root itself.
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    return entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.');
}

/// Parse a `path:line:text` output line into an absolute hit.
fn parse_match_line(root: &Path, output_line: &str) -> Option<SearchHit> {
    let mut parts = output_line.trim_end_matches(['\r', '\n']).splitn(3, ':');
    let raw_path = parts.next().filter(|p| return !p.is_empty())?;
    let line = parts.next()?.trim().parse::<u32>().ok()?;
    let relative = raw_path.strip_prefix("./").unwrap_or(raw_path);
    return Some(SearchHit { line, path: root.join(relative) });
}

/// Kill (if still running) and reap a search subprocess.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Walk the tree in sorted order and return the first matching line.
fn walk_for_first_match(
    root: &Path,
    glob: Option<&str>,
    matcher: &LineMatcher<'_>,
    deadline: Instant,
) -> Option<SearchHit> {
    let filter = match glob.map(Pattern::new).transpose() {
        Ok(filter) => filter,
        Err(e) => {
            tracing::warn!(glob, error = %e, "invalid search glob");
            return None;
        },
    };
    let has_separator = glob.is_some_and(|g| return g.contains('/'));

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| return !is_hidden(e))
        .filter_map(Result::ok)
    {
        if Instant::now() >= deadline {
            tracing::warn!(root = %root.display(), "builtin search timed out");
            return None;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if let Some(pattern) = &filter
            && !glob_matches(pattern, has_separator, relative)
        {
            continue;
        }
        if let Some(line) = first_matching_line(entry.path(), matcher) {
            return Some(SearchHit { line, path: entry.path().to_path_buf() });
        }
    }

    return None;
}
