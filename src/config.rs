use std::path::Path;
use std::time::Duration;

use crate::error::Error;
use crate::search::{BuiltinSearch, DEFAULT_TIMEOUT, RipgrepSearch, SearchProvider};

/// Config file name, looked up in the project root.
pub const CONFIG_FILE: &str = ".refpin.toml";

/// Hints shown per unresolved ref unless configured otherwise.
const DEFAULT_HINT_LIMIT: usize = 3;

/// Longest accepted search timeout: one day.
const MAX_TIMEOUT_SECS: u64 = 86_400;

/// Project configuration loaded from `.refpin.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How many hints to show per unresolved ref.
    hint_limit: usize,
    /// Search program for the ripgrep provider.
    program: String,
    /// Which search provider to build.
    provider: ProviderKind,
    /// Wall-clock limit per search.
    timeout: Duration,
}

/// Search backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// In-process tree walk.
    Builtin,
    /// Ripgrep-compatible subprocess.
    #[default]
    Ripgrep,
}

/// Raw `[hints]` table.
#[derive(Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct HintsTable {
    /// Hints shown per unresolved ref.
    limit: Option<usize>,
}

/// Raw TOML structure for `.refpin.toml`.
#[derive(Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RefpinTomlConfig {
    /// `[hints]` table.
    #[serde(default)]
    hints: HintsTable,
    /// `[search]` table.
    #[serde(default)]
    search: SearchTable,
}

/// Raw `[search]` table.
#[derive(Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SearchTable {
    /// Program name or path for the ripgrep provider.
    program: Option<String>,
    /// Backend selection.
    provider: Option<ProviderKind>,
    /// Seconds before a search is abandoned.
    timeout_secs: Option<u64>,
}

impl Config {
    /// Hints to display per unresolved ref.
    #[must_use]
    pub const fn hint_limit(&self) -> usize {
        return self.hint_limit;
    }

    /// Load config from `.refpin.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist. Returns an error if the file
    /// exists but is malformed: a config the user wrote is never silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the content is not a valid config, or
    /// `Error::InvalidTimeout` when `timeout_secs` is zero or above one day.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: RefpinTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        let timeout = match raw.search.timeout_secs {
            None => defaults.timeout,
            Some(secs) if (1..=MAX_TIMEOUT_SECS).contains(&secs) => Duration::from_secs(secs),
            Some(secs) => return Err(Error::InvalidTimeout { max: MAX_TIMEOUT_SECS, value: secs }),
        };
        return Ok(Self {
            hint_limit: raw.hints.limit.unwrap_or(defaults.hint_limit),
            program: raw.search.program.unwrap_or(defaults.program),
            provider: raw.search.provider.unwrap_or(defaults.provider),
            timeout,
        });
    }

    /// Build the configured search provider.
    #[must_use]
    pub fn search_provider(&self) -> Box<dyn SearchProvider> {
        return match self.provider {
            ProviderKind::Builtin => Box::new(BuiltinSearch::new(self.timeout)),
            ProviderKind::Ripgrep => Box::new(RipgrepSearch::new(self.program.clone(), self.timeout)),
        };
    }

    /// Return a copy that shows `limit` hints per unresolved ref.
    #[must_use]
    pub fn with_hint_limit(self, limit: usize) -> Self {
        return Self { hint_limit: limit, ..self };
    }
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            hint_limit: DEFAULT_HINT_LIMIT,
            program: "rg".to_string(),
            provider: ProviderKind::default(),
            timeout: DEFAULT_TIMEOUT,
        };
    }
}
