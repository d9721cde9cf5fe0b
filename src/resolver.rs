//! Tiered resolution of refs to concrete locations.
//!
//! Code refs try symbol, then text, then file (+ line). An explicit text
//! pattern that misses ends resolution: it never degrades to a bare file.
//! Doc refs locate their file first, then try heading, anchor, page, text.

use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::heading;
use crate::hints;
use crate::search::{SearchMode, SearchProvider, SearchRequest, SearchScope};
use crate::types::{Location, Ref, RefKind, SymbolQuery};

/// Per-ref outcome of a batch resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The ref points somewhere concrete.
    Resolved(Location),
    /// Nothing matched; `hints` are shell commands for finding it by hand.
    Unresolved {
        /// Every generated hint, best first. Callers cap what they display.
        hints: Vec<String>,
    },
}

/// A ref name paired with its outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Name of the ref.
    pub name: String,
    /// Resolved location or hints.
    pub outcome: Outcome,
}

/// Whether a file pattern contains glob wildcards.
pub fn is_glob(pattern: &str) -> bool {
    return pattern.contains(['*', '?']);
}

/// Resolve one ref against a project root. `None` means "could not resolve";
/// it is not an error and the caller may ask `hints::search_hints` for help.
pub fn resolve(reference: &Ref, root: &Path, search: &dyn SearchProvider) -> Option<Location> {
    let location = match reference.kind() {
        RefKind::Code => resolve_code_ref(reference, root, search),
        RefKind::Doc => resolve_doc_ref(reference, root, search),
    };
    match &location {
        Some(found) => tracing::debug!(name = reference.name(), location = %found, "resolved ref"),
        None => tracing::debug!(name = reference.name(), "ref did not resolve"),
    }
    return location;
}

/// Resolve every ref independently, in input order. A miss on one ref
/// never affects the others.
pub fn resolve_all(refs: &[Ref], root: &Path, search: &dyn SearchProvider) -> Vec<Resolution> {
    return refs
        .iter()
        .map(|reference| {
            let outcome = match resolve(reference, root, search) {
                Some(location) => Outcome::Resolved(location),
                None => Outcome::Unresolved { hints: hints::search_hints(reference) },
            };
            return Resolution { name: reference.name().to_string(), outcome };
        })
        .collect();
}

/// Map a file pattern to one existing file under `root`.
///
/// Globs take the first file in sorted enumeration order; anything else is a
/// literal path relative to `root`.
pub fn resolve_file_pattern(root: &Path, pattern: &str) -> Option<PathBuf> {
    if !is_glob(pattern) {
        let path = root.join(pattern);
        return path.is_file().then_some(path);
    }

    let escaped_root = Pattern::escape(&root.to_string_lossy());
    let full = Path::new(&escaped_root).join(pattern);
    let paths = match glob::glob(&full.to_string_lossy()) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid file glob");
            return None;
        },
    };
    return paths.filter_map(Result::ok).find(|p| return p.is_file());
}

/// Symbol, then text, then file + line, then file.
fn resolve_code_ref(reference: &Ref, root: &Path, search: &dyn SearchProvider) -> Option<Location> {
    let scope = SearchScope::Tree(reference.file());

    if let Some(query) = reference.symbol_query() {
        let pattern = symbol_pattern(&query);
        let request = SearchRequest { mode: SearchMode::Regex, pattern: &pattern, root, scope };
        if let Some(hit) = search.first_match(&request) {
            return Some(hit.into());
        }
        tracing::debug!(symbol = %query.display_name(), "symbol tier missed");
    }

    if let Some(text) = reference.text() {
        let request = SearchRequest { mode: SearchMode::Literal, pattern: text, root, scope };
        return search.first_match(&request).map(Location::from);
    }

    // An explicit symbol that missed does not degrade to a bare file.
    if reference.symbol().is_some() {
        return None;
    }

    let path = resolve_file_pattern(root, reference.file()?)?;
    return Some(match reference.line() {
        Some(line) => Location::Line { line, path },
        None => Location::File(path),
    });
}

/// Locate the file, then heading, anchor, page, text; bare file otherwise.
fn resolve_doc_ref(reference: &Ref, root: &Path, search: &dyn SearchProvider) -> Option<Location> {
    let Some(path) = reference.file().and_then(|f| return resolve_file_pattern(root, f)) else {
        tracing::debug!(file = reference.file(), "doc file not found");
        return None;
    };

    if let Some(wanted) = reference.heading() {
        let fragment = heading::find_markdown_heading(&path, wanted).unwrap_or_else(|| {
            tracing::debug!(heading = wanted, "heading not found, using its slug");
            return heading::slugify_heading(wanted);
        });
        return Some(Location::Anchored { fragment, path });
    }

    if let Some(anchor) = reference.anchor() {
        if !heading::find_anchor_in_file(&path, anchor) {
            tracing::debug!(anchor, "anchor not declared in file, keeping it");
        }
        return Some(Location::Anchored { fragment: anchor.to_string(), path });
    }

    if let Some(page) = reference.page() {
        return Some(Location::Anchored { fragment: format!("page={page}"), path });
    }

    if let Some(text) = reference.text() {
        let request = SearchRequest {
            mode: SearchMode::Literal,
            pattern: text,
            root,
            scope: SearchScope::File(&path),
        };
        return search.first_match(&request).map(Location::from);
    }

    return Some(Location::File(path));
}

/// Definition-site regex for a symbol. Owner and member are matched
/// independently, so `Owner.member` hits either `class Owner` or `def member`.
fn symbol_pattern(query: &SymbolQuery) -> String {
    return match query {
        SymbolQuery::Bare(name) => format!(r"(class|def|function)\s+{}", regex::escape(name)),
        SymbolQuery::Scoped { member, owner } => {
            format!(r"(class\s+{}|def\s+{})", regex::escape(owner), regex::escape(member))
        },
    };
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "test code")]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::dsl::parse_ref;
    use crate::search::{BuiltinSearch, SearchHit};

    /// Canned hits keyed by pattern; records every request it sees.
    #[derive(Default)]
    struct FakeSearch {
        hits: HashMap<String, SearchHit>,
        seen: Mutex<Vec<String>>,
    }

    impl FakeSearch {
        fn with_hit(mut self, pattern: &str, path: &Path, line: u32) -> Self {
            self.hits.insert(pattern.to_string(), SearchHit { line, path: path.to_path_buf() });
            return self;
        }

        fn seen(&self) -> Vec<String> {
            return self.seen.lock().unwrap().clone();
        }
    }

    impl SearchProvider for FakeSearch {
        fn first_match(&self, request: &SearchRequest<'_>) -> Option<SearchHit> {
            let scope = match request.scope {
                SearchScope::File(path) => format!("file={}", path.display()),
                SearchScope::Tree(glob) => format!("glob={}", glob.unwrap_or("-")),
            };
            self.seen.lock().unwrap().push(format!("{:?} {} {scope}", request.mode, request.pattern));
            return self.hits.get(request.pattern).cloned();
        }
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src/handlers")).unwrap();
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::write(root.join("src/auth.py"), "class Auth:\n    def login(self, user):\n        pass\n").unwrap();
        std::fs::write(root.join("src/handlers/b.py"), "def b():\n    pass\n").unwrap();
        std::fs::write(root.join("src/handlers/a.py"), "def a():\n    pass\n").unwrap();
        std::fs::write(
            root.join("docs/security.md"),
            "# Security\n\n<a id=\"threat-model\"></a>\n\n## Token Validation\n\nTokens expire after one hour.\n",
        )
        .unwrap();
        std::fs::write(root.join("docs/api.pdf"), "not really a pdf\n").unwrap();
        return dir;
    }

    fn resolved(dsl: &str, root: &Path, search: &dyn SearchProvider) -> Option<String> {
        return resolve(&parse_ref(dsl).unwrap(), root, search).map(|l| return l.to_string());
    }

    #[test]
    fn dotted_symbol_searches_owner_or_member() {
        let dir = project();
        let file = dir.path().join("src/auth.py");
        let search = FakeSearch::default().with_hit(r"(class\s+Auth|def\s+login)", &file, 1);

        let got = resolved("impl:s=Auth.login,f=**/auth.py", dir.path(), &search);
        assert_eq!(got, Some(format!("{}:1", file.display())));
        assert_eq!(search.seen(), vec![r"Regex (class\s+Auth|def\s+login) glob=**/auth.py".to_string()]);
    }

    #[test]
    fn bare_symbol_pattern() {
        let dir = project();
        let search = FakeSearch::default();
        assert_eq!(resolved("impl:s=validate", dir.path(), &search), None);
        assert_eq!(search.seen(), vec![r"Regex (class|def|function)\s+validate glob=-".to_string()]);
    }

    #[test]
    fn symbol_miss_falls_through_to_text() {
        let dir = project();
        let file = dir.path().join("src/auth.py");
        let search = FakeSearch::default().with_hit("def login(", &file, 2);

        let got = resolved("impl:s=Auth.login,t=def login(", dir.path(), &search);
        assert_eq!(got, Some(format!("{}:2", file.display())));
        assert_eq!(search.seen().len(), 2);
        assert!(search.seen()[1].starts_with("Literal def login("));
    }

    #[test]
    fn text_miss_does_not_fall_back_to_file() {
        let dir = project();
        let search = FakeSearch::default();
        assert_eq!(resolved("impl:t=def totally_missing_fn(,f=src/auth.py,l=10", dir.path(), &search), None);
    }

    #[test]
    fn symbol_miss_does_not_fall_back_to_file() {
        let dir = project();
        let search = FakeSearch::default();
        assert_eq!(resolved("impl:s=Gone.away,f=src/auth.py", dir.path(), &search), None);
    }

    #[test]
    fn file_and_line_hint() {
        let dir = project();
        let search = FakeSearch::default();
        let got = resolved("impl:f=src/auth.py,l=10", dir.path(), &search);
        assert_eq!(got, Some(format!("{}:10", dir.path().join("src/auth.py").display())));
        assert!(search.seen().is_empty());
    }

    #[test]
    fn file_only() {
        let dir = project();
        let got = resolved("impl:f=src/auth.py", dir.path(), &FakeSearch::default());
        assert_eq!(got, Some(dir.path().join("src/auth.py").display().to_string()));
    }

    #[test]
    fn missing_file_fails() {
        let dir = project();
        assert_eq!(resolved("impl:f=src/gone.py,l=3", dir.path(), &FakeSearch::default()), None);
        assert_eq!(resolved("impl:f=src/*.rs", dir.path(), &FakeSearch::default()), None);
    }

    #[test]
    fn glob_takes_first_sorted_match_every_time() {
        let dir = project();
        let search = FakeSearch::default();
        let want = Some(format!("{}:4", dir.path().join("src/handlers/a.py").display()));
        for _ in 0..3 {
            assert_eq!(resolved("impl:f=src/handlers/*.py,l=4", dir.path(), &search), want);
        }
        let recursive = resolved("impl:f=**/b.py", dir.path(), &search);
        assert_eq!(recursive, Some(dir.path().join("src/handlers/b.py").display().to_string()));
    }

    #[test]
    fn doc_heading_found() {
        let dir = project();
        let got = resolved("spec:k=doc,f=docs/security.md,h=## Token Validation", dir.path(), &FakeSearch::default());
        assert_eq!(got, Some(format!("{}#token-validation", dir.path().join("docs/security.md").display())));
    }

    #[test]
    fn doc_heading_missing_uses_requested_slug() {
        let dir = project();
        let got = resolved("spec:k=doc,f=docs/security.md,h=### Key Rotation!", dir.path(), &FakeSearch::default());
        assert_eq!(got, Some(format!("{}#key-rotation", dir.path().join("docs/security.md").display())));
    }

    #[test]
    fn doc_anchor_is_kept_whether_or_not_declared() {
        let dir = project();
        let file = dir.path().join("docs/security.md").display().to_string();
        let search = FakeSearch::default();
        assert_eq!(
            resolved("spec:k=doc,f=docs/security.md,a=threat-model", dir.path(), &search),
            Some(format!("{file}#threat-model"))
        );
        assert_eq!(
            resolved("spec:k=doc,f=docs/security.md,a=nowhere", dir.path(), &search),
            Some(format!("{file}#nowhere"))
        );
    }

    #[test]
    fn heading_beats_anchor() {
        let dir = project();
        let got = resolved("spec:k=doc,f=docs/security.md,h=Security,a=threat-model", dir.path(), &FakeSearch::default());
        assert_eq!(got, Some(format!("{}#security", dir.path().join("docs/security.md").display())));
    }

    #[test]
    fn doc_page_without_content_check() {
        let dir = project();
        let got = resolved("pdf:k=doc,f=docs/api.pdf,p=12", dir.path(), &FakeSearch::default());
        assert_eq!(got, Some(format!("{}#page=12", dir.path().join("docs/api.pdf").display())));
    }

    #[test]
    fn doc_text_searches_only_that_file() {
        let dir = project();
        let file = dir.path().join("docs/security.md");
        let search = FakeSearch::default().with_hit("expire after", &file, 7);

        let got = resolved("spec:k=doc,f=docs/security.md,t=expire after", dir.path(), &search);
        assert_eq!(got, Some(format!("{}:7", file.display())));
        assert_eq!(search.seen(), vec![format!("Literal expire after file={}", file.display())]);
    }

    #[test]
    fn doc_text_miss_fails() {
        let dir = project();
        assert_eq!(resolved("spec:k=doc,f=docs/security.md,t=nope", dir.path(), &FakeSearch::default()), None);
    }

    #[test]
    fn doc_without_locators_is_the_file() {
        let dir = project();
        let got = resolved("spec:k=doc,f=docs/*.md", dir.path(), &FakeSearch::default());
        assert_eq!(got, Some(dir.path().join("docs/security.md").display().to_string()));
    }

    #[test]
    fn doc_missing_file_fails_regardless_of_page() {
        let dir = project();
        assert_eq!(resolved("pdf:k=doc,f=docs/other.pdf,p=3", dir.path(), &FakeSearch::default()), None);
    }

    #[test]
    fn builtin_search_end_to_end() {
        let dir = project();
        let search = BuiltinSearch::default();
        assert_eq!(
            resolved("impl:s=Auth.login,f=**/*.py", dir.path(), &search),
            Some(format!("{}:1", dir.path().join("src/auth.py").display()))
        );
        assert_eq!(
            resolved("impl:t=Tokens expire", dir.path(), &search),
            Some(format!("{}:7", dir.path().join("docs/security.md").display()))
        );
        assert_eq!(resolved("impl:t=def totally_missing_fn(", dir.path(), &search), None);
    }

    #[test]
    fn resolve_all_keeps_order_and_isolates_failures() {
        let dir = project();
        let refs = vec![
            parse_ref("gone:t=def totally_missing_fn(").unwrap(),
            parse_ref("impl:f=src/auth.py,l=2").unwrap(),
        ];
        let results = resolve_all(&refs, dir.path(), &BuiltinSearch::default());

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "gone");
        let Outcome::Unresolved { hints } = &results[0].outcome else {
            panic!("expected unresolved, got {:?}", results[0].outcome);
        };
        assert!(hints.iter().any(|h| h.contains("def totally_missing_fn(")), "{hints:?}");
        assert_eq!(
            results[1].outcome,
            Outcome::Resolved(Location::Line { line: 2, path: dir.path().join("src/auth.py") })
        );
    }

    #[test]
    fn concurrent_resolution_is_independent() {
        let dir = project();
        let search: &dyn SearchProvider = &BuiltinSearch::default();
        let root = dir.path();
        let refs: Vec<Ref> = ["a:s=a,f=**/*.py", "b:s=b,f=**/*.py", "c:t=def login("]
            .iter()
            .map(|dsl| return parse_ref(dsl).unwrap())
            .collect();

        let found: Vec<Option<Location>> = std::thread::scope(|s| {
            let handles: Vec<_> = refs.iter().map(|r| return s.spawn(move || return resolve(r, root, search))).collect();
            return handles.into_iter().map(|h| return h.join().unwrap()).collect();
        });

        assert_eq!(found[0], Some(Location::Line { line: 1, path: root.join("src/handlers/a.py") }));
        assert_eq!(found[1], Some(Location::Line { line: 1, path: root.join("src/handlers/b.py") }));
        assert_eq!(found[2], Some(Location::Line { line: 2, path: root.join("src/auth.py") }));
    }
}
