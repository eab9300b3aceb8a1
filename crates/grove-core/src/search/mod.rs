//! Search facade consumed by the CLI and picker UI
//!
//! Resolves named filter groups to repository sets, runs queries through the
//! store, and shapes raw rows into display-ready results.

mod preview;

use std::path::Path;

use crate::db::IndexStore;
use crate::error::{Error, Result};
use crate::index::Indexer;
use crate::models::{CommitEntry, FileEntry, IndexStats, RepoSpec, ResultKind, SearchResult};

/// Longest accepted search term, in characters.
const MAX_TERM_LEN: usize = 200;

/// Character sequences rejected by [`validate_search_term`]. A defensive
/// heuristic against malformed queries, not a security boundary: the store's
/// parameterized queries are already injection-safe.
const TERM_DENYLIST: &[&str] = &["'", "\"", ";", "--", "/*", "*/"];

/// Commit subjects are truncated to this many characters for display.
const SUBJECT_DISPLAY_LEN: usize = 60;

/// External collaborator that maps a named filter group to the repository
/// aliases belonging to it.
pub trait GroupResolver: Send + Sync {
    /// Resolve a group name to its member aliases.
    fn resolve(&self, group: &str) -> Result<Vec<String>>;
}

/// Query facade over the index store.
pub struct Searcher {
    store: IndexStore,
    indexer: Indexer,
    resolver: Option<Box<dyn GroupResolver>>,
}

impl Searcher {
    /// Create a searcher over a store handle.
    pub fn new(store: IndexStore) -> Self {
        Self {
            indexer: Indexer::new(store.clone()),
            store,
            resolver: None,
        }
    }

    /// Attach a group resolver collaborator.
    #[must_use]
    pub fn with_group_resolver(mut self, resolver: Box<dyn GroupResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Lazy-initialization contract: build the index when the staleness
    /// heuristic says so, or when `force` is set. Callers rely on this
    /// before issuing their first query.
    pub fn ensure_index(&self, repos: &[RepoSpec], force: bool) -> Result<()> {
        if force || self.indexer.needs_indexing(repos)? {
            self.indexer.build_index(repos, None)?;
        }
        Ok(())
    }

    /// Search indexed files. An empty query returns the unfiltered set for
    /// the given scope.
    pub fn search_files(&self, query: &str, group: Option<&str>) -> Result<Vec<SearchResult>> {
        let filter = self.resolve_group(group);
        let files = if query.trim().is_empty() {
            self.store.all_files(&filter)?
        } else {
            validate_search_term(query)?;
            self.store.search_files(&fts_query(query), &filter)?
        };

        Ok(files.iter().map(file_result).collect())
    }

    /// Search indexed commits. An empty query returns the unfiltered set,
    /// newest first.
    pub fn search_commits(&self, query: &str, group: Option<&str>) -> Result<Vec<SearchResult>> {
        let filter = self.resolve_group(group);
        let commits = if query.trim().is_empty() {
            self.store.all_commits(&filter)?
        } else {
            validate_search_term(query)?;
            self.store.search_commits(&fts_query(query), &filter)?
        };

        Ok(commits.iter().map(commit_result).collect())
    }

    /// Aggregate index statistics.
    pub fn stats(&self) -> Result<IndexStats> {
        self.store.stats()
    }

    /// Preview text for a selected file result.
    pub fn file_preview(&self, path: &Path) -> Result<String> {
        preview::file_preview(path)
    }

    /// Preview text for a selected commit result.
    pub fn commit_preview(&self, repo_path: &Path, hash: &str) -> Result<String> {
        preview::commit_preview(repo_path, hash)
    }

    /// Resolve an optional group name to a repository allow-list.
    ///
    /// Lookup failure or an unknown group degrades to "all configured
    /// repositories" (an empty, unfiltered list) rather than erroring.
    fn resolve_group(&self, group: Option<&str>) -> Vec<String> {
        let Some(group) = group else {
            return Vec::new();
        };
        let Some(resolver) = self.resolver.as_ref() else {
            tracing::warn!(group, "no group resolver configured; searching all repositories");
            return Vec::new();
        };

        match resolver.resolve(group) {
            Ok(aliases) if !aliases.is_empty() => aliases,
            Ok(_) => {
                tracing::warn!(group, "unknown group; searching all repositories");
                Vec::new()
            }
            Err(error) => {
                tracing::warn!(group, %error, "group lookup failed; searching all repositories");
                Vec::new()
            }
        }
    }
}

/// Reject terms that are too long or carry denylisted character sequences.
pub fn validate_search_term(term: &str) -> Result<()> {
    if term.chars().count() > MAX_TERM_LEN {
        return Err(Error::InvalidQuery(format!(
            "term exceeds {MAX_TERM_LEN} characters"
        )));
    }
    for token in TERM_DENYLIST {
        if term.contains(token) {
            return Err(Error::InvalidQuery(format!(
                "term contains forbidden sequence {token:?}"
            )));
        }
    }
    Ok(())
}

/// Quote each whitespace-separated token as an FTS5 phrase.
///
/// Barewords containing `/` or `.` are FTS5 syntax errors, so a path
/// fragment like `src/main` must be passed as the phrase `"src/main"`.
/// Multiple tokens keep FTS5's implicit AND. [`validate_search_term`]
/// rejects embedded quotes before this runs.
fn fts_query(term: &str) -> String {
    term.split_whitespace()
        .map(|token| format!("\"{token}\""))
        .collect::<Vec<_>>()
        .join(" ")
}

fn file_result(entry: &FileEntry) -> SearchResult {
    SearchResult {
        kind: ResultKind::File,
        repo_alias: entry.repo_alias.clone(),
        display: format!("{}: {}", entry.repo_alias, entry.relative_path),
        path: Some(entry.relative_path.clone()),
        hash: None,
    }
}

fn commit_result(entry: &CommitEntry) -> SearchResult {
    let short_hash: String = entry.hash.chars().take(8).collect();
    SearchResult {
        kind: ResultKind::Commit,
        repo_alias: entry.repo_alias.clone(),
        display: format!(
            "{}: {} {} {}",
            entry.repo_alias,
            short_hash,
            entry.author,
            truncate_subject(&entry.subject)
        ),
        path: None,
        hash: Some(entry.hash.clone()),
    }
}

fn truncate_subject(subject: &str) -> String {
    if subject.chars().count() <= SUBJECT_DISPLAY_LEN {
        return subject.to_string();
    }
    let cut: String = subject.chars().take(SUBJECT_DISPLAY_LEN).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded_store() -> IndexStore {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .insert_files(&[
                FileEntry {
                    repo_alias: "a".to_string(),
                    relative_path: "src/main.rs".to_string(),
                    absolute_path: "/work/a/src/main.rs".to_string(),
                    mod_time: 1,
                    file_size: 10,
                },
                FileEntry {
                    repo_alias: "b".to_string(),
                    relative_path: "docs/guide.md".to_string(),
                    absolute_path: "/work/b/docs/guide.md".to_string(),
                    mod_time: 2,
                    file_size: 20,
                },
            ])
            .unwrap();
        store
            .insert_commits(&[CommitEntry {
                repo_alias: "a".to_string(),
                hash: "0123456789abcdef".to_string(),
                author: "Ada".to_string(),
                subject: "Fix critical bug".to_string(),
                commit_time: 100,
                files_changed: 2,
            }])
            .unwrap();
        store
    }

    struct FixedResolver(Vec<String>);

    impl GroupResolver for FixedResolver {
        fn resolve(&self, _group: &str) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingResolver;

    impl GroupResolver for FailingResolver {
        fn resolve(&self, group: &str) -> Result<Vec<String>> {
            Err(Error::InvalidQuery(format!("no such group {group}")))
        }
    }

    #[test]
    fn empty_query_returns_everything() {
        let searcher = Searcher::new(seeded_store());
        let results = searcher.search_files("", None).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn file_results_are_display_ready() {
        let searcher = Searcher::new(seeded_store());
        let results = searcher.search_files("main", None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, ResultKind::File);
        assert_eq!(results[0].display, "a: src/main.rs");
        assert_eq!(results[0].path.as_deref(), Some("src/main.rs"));
        assert_eq!(results[0].hash, None);
    }

    #[test]
    fn path_fragments_with_separators_match_files() {
        // `src/main` as a bareword is an FTS5 syntax error; the phrase
        // rewrite must keep it searchable.
        let searcher = Searcher::new(seeded_store());
        let results = searcher.search_files("src/main", None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display, "a: src/main.rs");

        let results = searcher.search_files("guide.md", None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].repo_alias, "b");
    }

    #[test]
    fn fts_query_quotes_each_token() {
        assert_eq!(fts_query("src/main"), "\"src/main\"");
        assert_eq!(fts_query("fix  bug"), "\"fix\" \"bug\"");
    }

    #[test]
    fn commit_results_use_short_hash_and_subject() {
        let searcher = Searcher::new(seeded_store());
        let results = searcher.search_commits("bug", None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].kind, ResultKind::Commit);
        assert_eq!(results[0].display, "a: 01234567 Ada Fix critical bug");
        assert_eq!(results[0].hash.as_deref(), Some("0123456789abcdef"));
        assert_eq!(results[0].path, None);
    }

    #[test]
    fn group_filter_narrows_scope() {
        let searcher = Searcher::new(seeded_store())
            .with_group_resolver(Box::new(FixedResolver(vec!["b".to_string()])));

        let results = searcher.search_files("", Some("backend")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].repo_alias, "b");
    }

    #[test]
    fn failed_group_lookup_degrades_to_all_repositories() {
        let searcher = Searcher::new(seeded_store()).with_group_resolver(Box::new(FailingResolver));

        let results = searcher.search_files("", Some("missing")).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn unknown_group_degrades_to_all_repositories() {
        let searcher =
            Searcher::new(seeded_store()).with_group_resolver(Box::new(FixedResolver(Vec::new())));

        let results = searcher.search_files("", Some("empty")).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn validate_rejects_long_terms() {
        let long = "x".repeat(MAX_TERM_LEN + 1);
        assert!(validate_search_term(&long).is_err());
        let ok = "x".repeat(MAX_TERM_LEN);
        assert!(validate_search_term(&ok).is_ok());
    }

    #[test]
    fn validate_rejects_denylisted_sequences() {
        for term in ["it's", "say \"hi\"", "a;b", "a--b", "a/*b", "a*/b"] {
            assert!(validate_search_term(term).is_err(), "accepted {term:?}");
        }
        assert!(validate_search_term("ordinary query").is_ok());
    }

    #[test]
    fn long_subjects_are_truncated_with_ellipsis() {
        let subject = "a".repeat(80);
        let truncated = truncate_subject(&subject);
        assert_eq!(truncated.chars().count(), SUBJECT_DISPLAY_LEN + 3);
        assert!(truncated.ends_with("..."));

        assert_eq!(truncate_subject("short"), "short");
    }

    #[test]
    fn ensure_index_builds_when_stale() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("main.rs"), "fn main() {}").unwrap();

        let store = IndexStore::open_in_memory().unwrap();
        let searcher = Searcher::new(store.clone());
        let repos = vec![RepoSpec::new("a", tmp.path())];

        searcher.ensure_index(&repos, false).unwrap();
        assert_eq!(store.stats().unwrap().file_count, 1);

        // Already fresh; a second call is a no-op, force rebuilds anyway
        searcher.ensure_index(&repos, false).unwrap();
        searcher.ensure_index(&repos, true).unwrap();
        assert_eq!(store.stats().unwrap().file_count, 1);
    }
}
