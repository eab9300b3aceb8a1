//! Index build orchestration

use std::path::Path;

use crate::db::IndexStore;
use crate::error::{Error, RepoFailure, Result, TaskKind};
use crate::models::RepoSpec;

use super::{harvest, walker};

/// File rows written per transaction; bounds per-transaction memory.
pub const FILE_BATCH_SIZE: usize = 1000;
/// Commit rows written per transaction.
pub const COMMIT_BATCH_SIZE: usize = 100;

/// Progress callback: `(message, completed, total)`.
pub type ProgressFn<'a> = &'a mut dyn FnMut(&str, usize, usize);

/// Orchestrates data acquisition and batch writes into the store.
///
/// Stateless between calls; the only durable state is the store itself.
#[derive(Clone)]
pub struct Indexer {
    store: IndexStore,
}

impl Indexer {
    /// Create an indexer over a store handle.
    pub fn new(store: IndexStore) -> Self {
        Self { store }
    }

    /// Build the index sequentially: for each repository walk files, then
    /// harvest commits.
    ///
    /// Sequential on purpose: it bounds peak resource usage during a first
    /// cold scan and keeps progress reporting deterministic. Progress is
    /// reported as `(message, completed, total)` with
    /// `total = 2 * repos.len()`.
    pub fn build_index(
        &self,
        repos: &[RepoSpec],
        mut on_progress: Option<ProgressFn<'_>>,
    ) -> Result<()> {
        let total = repos.len() * 2;
        let mut completed = 0;

        for repo in repos {
            self.index_repo_files(&repo.alias, &repo.path)?;
            completed += 1;
            if let Some(report) = on_progress.as_mut() {
                report(&format!("Indexed files in {}", repo.alias), completed, total);
            }

            self.index_repo_commits(&repo.alias, &repo.path)?;
            completed += 1;
            if let Some(report) = on_progress.as_mut() {
                report(
                    &format!("Indexed commits in {}", repo.alias),
                    completed,
                    total,
                );
            }
        }

        Ok(())
    }

    /// Refresh every repository concurrently: two blocking tasks per
    /// repository, one walking files and one harvesting commits.
    ///
    /// A failing repository never blocks or cancels the others. If anything
    /// failed, the combined error names every failing repository and its
    /// cause; repositories that succeeded are still reflected in the store.
    pub async fn update_index(&self, repos: &[RepoSpec]) -> Result<()> {
        let mut tasks = Vec::with_capacity(repos.len() * 2);

        for repo in repos {
            let indexer = self.clone();
            let spec = repo.clone();
            tasks.push((
                repo.alias.clone(),
                TaskKind::Files,
                tokio::task::spawn_blocking(move || {
                    indexer.index_repo_files(&spec.alias, &spec.path)
                }),
            ));

            let indexer = self.clone();
            let spec = repo.clone();
            tasks.push((
                repo.alias.clone(),
                TaskKind::Commits,
                tokio::task::spawn_blocking(move || {
                    indexer.index_repo_commits(&spec.alias, &spec.path)
                }),
            ));
        }

        let mut failures = Vec::new();
        for (alias, task, handle) in tasks {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => failures.push(RepoFailure {
                    alias,
                    task,
                    message: error.to_string(),
                }),
                Err(join_error) => failures.push(RepoFailure {
                    alias,
                    task,
                    message: format!("task panicked: {join_error}"),
                }),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::IndexUpdate(failures))
        }
    }

    /// Clear every listed repository, then build from scratch.
    ///
    /// Guarantees no stale rows survive a change to the ignore policy or
    /// the schema.
    pub fn rebuild_index(
        &self,
        repos: &[RepoSpec],
        on_progress: Option<ProgressFn<'_>>,
    ) -> Result<()> {
        for repo in repos {
            self.store.clear_repository(&repo.alias)?;
        }
        self.build_index(repos, on_progress)
    }

    /// Clear and fully reindex one repository, synchronously. Used when a
    /// repository is newly added or explicitly refreshed.
    pub fn update_single_repository(&self, alias: &str, path: &Path) -> Result<()> {
        self.store.clear_repository(alias)?;
        self.index_repo_files(alias, path)?;
        self.index_repo_commits(alias, path)
    }

    /// Coarse whole-store staleness check: true when the store has no files
    /// at all, or the distinct-repository count (by files) does not match
    /// the configured set. Cannot detect a single changed file inside an
    /// already-indexed repository.
    pub fn needs_indexing(&self, repos: &[RepoSpec]) -> Result<bool> {
        let stats = self.store.stats()?;
        Ok(stats.file_count == 0 || stats.repository_count != repos.len() as i64)
    }

    fn index_repo_files(&self, alias: &str, path: &Path) -> Result<()> {
        let entries = walker::walk_repo_files(alias, path)?;
        for batch in entries.chunks(FILE_BATCH_SIZE) {
            self.store.insert_files(batch)?;
        }
        tracing::info!(repo = alias, files = entries.len(), "indexed working tree");
        Ok(())
    }

    fn index_repo_commits(&self, alias: &str, path: &Path) -> Result<()> {
        let commits = harvest::harvest_commits(alias, path);
        for batch in commits.chunks(COMMIT_BATCH_SIZE) {
            self.store.insert_commits(batch)?;
        }
        tracing::info!(repo = alias, commits = commits.len(), "indexed history");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (Indexer, IndexStore) {
        let store = IndexStore::open_in_memory().unwrap();
        (Indexer::new(store.clone()), store)
    }

    fn repo_with_files(files: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for file in files {
            let path = tmp.path().join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, "content").unwrap();
        }
        tmp
    }

    #[test]
    fn build_index_reports_progress() {
        let (indexer, store) = setup();
        let repo_a = repo_with_files(&["main.rs", "lib.rs"]);
        let repo_b = repo_with_files(&["app.py"]);
        let repos = vec![
            RepoSpec::new("a", repo_a.path()),
            RepoSpec::new("b", repo_b.path()),
        ];

        let mut events = Vec::new();
        let mut callback = |message: &str, completed: usize, total: usize| {
            events.push((message.to_string(), completed, total));
        };
        indexer.build_index(&repos, Some(&mut callback)).unwrap();

        assert_eq!(events.len(), 4);
        assert!(events.iter().all(|(_, _, total)| *total == 4));
        assert_eq!(events.last().unwrap().1, 4);

        assert_eq!(store.stats().unwrap().file_count, 3);
    }

    #[test]
    fn build_index_without_progress_callback() {
        let (indexer, store) = setup();
        let repo = repo_with_files(&["main.rs"]);
        let repos = vec![RepoSpec::new("a", repo.path())];

        indexer.build_index(&repos, None).unwrap();
        assert_eq!(store.stats().unwrap().file_count, 1);
    }

    #[test]
    fn needs_indexing_on_empty_store() {
        let (indexer, _store) = setup();
        let repos = vec![RepoSpec::new("a", "/tmp/a")];
        assert!(indexer.needs_indexing(&repos).unwrap());
    }

    #[test]
    fn needs_indexing_false_once_all_repos_have_files() {
        let (indexer, _store) = setup();
        let repo = repo_with_files(&["main.rs"]);
        let repos = vec![RepoSpec::new("a", repo.path())];

        indexer.build_index(&repos, None).unwrap();
        assert!(!indexer.needs_indexing(&repos).unwrap());

        // A second configured repository makes the store stale again
        let more = vec![
            RepoSpec::new("a", repo.path()),
            RepoSpec::new("b", "/tmp/b"),
        ];
        assert!(indexer.needs_indexing(&more).unwrap());
    }

    #[test]
    fn rebuild_drops_stale_rows() {
        let (indexer, store) = setup();
        let repo = repo_with_files(&["keep.rs"]);
        let repos = vec![RepoSpec::new("a", repo.path())];

        // A row the walk would no longer produce
        store
            .insert_files(&[crate::models::FileEntry {
                repo_alias: "a".to_string(),
                relative_path: "stale.rs".to_string(),
                absolute_path: "/gone/stale.rs".to_string(),
                mod_time: 0,
                file_size: 1,
            }])
            .unwrap();

        indexer.rebuild_index(&repos, None).unwrap();

        let files = store.all_files(&[]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "keep.rs");
    }

    #[test]
    fn update_single_repository_replaces_rows() {
        let (indexer, store) = setup();
        let repo = repo_with_files(&["one.rs", "two.rs"]);

        indexer.update_single_repository("a", repo.path()).unwrap();
        assert_eq!(store.stats().unwrap().file_count, 2);

        fs::remove_file(repo.path().join("two.rs")).unwrap();
        indexer.update_single_repository("a", repo.path()).unwrap();

        let files = store.all_files(&[]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "one.rs");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_index_aggregates_failures_without_dropping_successes() {
        let (indexer, store) = setup();
        let good = repo_with_files(&["main.rs"]);
        let repos = vec![
            RepoSpec::new("good", good.path()),
            RepoSpec::new("bad", "/definitely/does/not/exist"),
        ];

        let error = indexer.update_index(&repos).await.unwrap_err();
        let rendered = error.to_string();
        assert!(rendered.contains("bad"));

        // The healthy repository still landed in storage
        let files = store.all_files(&["good".to_string()]).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "main.rs");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn update_index_succeeds_across_repositories() {
        let (indexer, store) = setup();
        let repo_a = repo_with_files(&["a.rs"]);
        let repo_b = repo_with_files(&["b.rs"]);
        let repos = vec![
            RepoSpec::new("a", repo_a.path()),
            RepoSpec::new("b", repo_b.path()),
        ];

        indexer.update_index(&repos).await.unwrap();
        assert_eq!(store.stats().unwrap().file_count, 2);
        assert_eq!(store.stats().unwrap().repository_count, 2);
    }
}
