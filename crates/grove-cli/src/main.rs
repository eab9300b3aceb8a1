//! Grove CLI - manage and search a set of Git repositories
//!
//! Thin front end over grove-core's indexer and searcher. Repositories are
//! handed in as `--repo alias=path` flags; configuration file handling lives
//! with the caller, not here.

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use grove_core::{IndexStore, Indexer, RepoSpec, Searcher};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Index and search a set of Git working trees")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to the index store file
    #[arg(long, value_name = "PATH", global = true)]
    db_path: Option<PathBuf>,

    /// Repository to operate on, as alias=path (repeatable)
    #[arg(long = "repo", value_name = "ALIAS=PATH", value_parser = parse_repo_spec, global = true)]
    repos: Vec<RepoSpec>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or refresh the index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
    /// Search the index
    Search {
        #[command(subcommand)]
        target: SearchTarget,
    },
    /// Preview a file or commit
    Preview {
        #[command(subcommand)]
        target: PreviewTarget,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Scan every repository sequentially (first cold build)
    Build,
    /// Refresh every repository concurrently
    Update,
    /// Clear listed repositories, then build from scratch
    Rebuild,
    /// Refresh a single repository
    Refresh {
        /// Alias of the repository to refresh (must be among --repo flags)
        alias: String,
    },
    /// Show index statistics and staleness
    Status,
}

#[derive(Subcommand)]
enum SearchTarget {
    /// Search indexed file paths
    Files {
        /// Search query (empty lists everything)
        #[arg(default_value = "")]
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search indexed commits
    Commits {
        /// Search query (empty lists everything)
        #[arg(default_value = "")]
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PreviewTarget {
    /// Preview a file
    File {
        /// Path to the file
        path: PathBuf,
    },
    /// Preview a commit
    Commit {
        /// Path to the repository working tree
        repo_path: PathBuf,
        /// Commit hash
        hash: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] grove_core::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No repositories given; pass at least one --repo alias=path")]
    NoRepositories,
    #[error("Unknown repository alias: {0}")]
    UnknownAlias(String),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("grove=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Index { action } => run_index(action, &cli.repos, &db_path).await,
        Commands::Search { target } => run_search(target, &db_path),
        Commands::Preview { target } => run_preview(&target, &db_path),
    }
}

async fn run_index(
    action: IndexAction,
    repos: &[RepoSpec],
    db_path: &std::path::Path,
) -> Result<(), CliError> {
    let store = IndexStore::open(db_path)?;
    let indexer = Indexer::new(store.clone());

    match action {
        IndexAction::Build => {
            require_repos(repos)?;
            let mut print = print_progress;
            indexer.build_index(repos, Some(&mut print))?;
        }
        IndexAction::Update => {
            require_repos(repos)?;
            indexer.update_index(repos).await?;
            println!("Updated {} repositories", repos.len());
        }
        IndexAction::Rebuild => {
            require_repos(repos)?;
            let mut print = print_progress;
            indexer.rebuild_index(repos, Some(&mut print))?;
        }
        IndexAction::Refresh { alias } => {
            let repo = repos
                .iter()
                .find(|r| r.alias == alias)
                .ok_or(CliError::UnknownAlias(alias))?;
            indexer.update_single_repository(&repo.alias, &repo.path)?;
            println!("Refreshed {}", repo.alias);
        }
        IndexAction::Status => {
            let stats = store.stats()?;
            println!("Files:        {}", stats.file_count);
            println!("Commits:      {}", stats.commit_count);
            println!("Repositories: {}", stats.repository_count);
            println!("Store size:   {} bytes", stats.store_size_bytes);
            if !repos.is_empty() {
                let stale = indexer.needs_indexing(repos)?;
                println!("Stale:        {stale}");
            }
        }
    }

    Ok(())
}

fn run_search(target: SearchTarget, db_path: &std::path::Path) -> Result<(), CliError> {
    let searcher = Searcher::new(IndexStore::open(db_path)?);

    let (results, json) = match target {
        SearchTarget::Files { query, json } => (searcher.search_files(&query, None)?, json),
        SearchTarget::Commits { query, json } => (searcher.search_commits(&query, None)?, json),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            println!("{}", result.display);
        }
    }

    Ok(())
}

fn run_preview(target: &PreviewTarget, db_path: &std::path::Path) -> Result<(), CliError> {
    let searcher = Searcher::new(IndexStore::open(db_path)?);

    let text = match target {
        PreviewTarget::File { path } => searcher.file_preview(path)?,
        PreviewTarget::Commit { repo_path, hash } => searcher.commit_preview(repo_path, hash)?,
    };
    print!("{text}");

    Ok(())
}

fn print_progress(message: &str, completed: usize, total: usize) {
    println!("[{completed}/{total}] {message}");
}

fn require_repos(repos: &[RepoSpec]) -> Result<(), CliError> {
    if repos.is_empty() {
        return Err(CliError::NoRepositories);
    }
    Ok(())
}

fn parse_repo_spec(value: &str) -> Result<RepoSpec, String> {
    let (alias, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected alias=path, got {value:?}"))?;
    let alias = alias.trim();
    let path = path.trim();
    if alias.is_empty() || path.is_empty() {
        return Err(format!("expected alias=path, got {value:?}"));
    }
    Ok(RepoSpec::new(alias, path))
}

fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("GROVE_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("grove")
        .join("index.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_repo_spec_accepts_alias_and_path() {
        let spec = parse_repo_spec("api=/work/api").unwrap();
        assert_eq!(spec.alias, "api");
        assert_eq!(spec.path, PathBuf::from("/work/api"));
    }

    #[test]
    fn parse_repo_spec_rejects_malformed_values() {
        assert!(parse_repo_spec("just-an-alias").is_err());
        assert!(parse_repo_spec("=path").is_err());
        assert!(parse_repo_spec("alias=").is_err());
    }

    #[test]
    fn default_db_path_ends_with_store_name() {
        let path = default_db_path();
        assert!(path.ends_with("grove/index.db"));
    }

    #[test]
    fn store_opens_at_explicit_db_path_creating_parents() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = resolve_db_path(Some(tmp.path().join("nested").join("index.db")));

        let store = IndexStore::open(&path).unwrap();
        assert_eq!(store.stats().unwrap().file_count, 0);
        assert!(path.exists());
    }

    #[test]
    fn cli_parses_index_build() {
        let cli = Cli::try_parse_from([
            "grove",
            "index",
            "build",
            "--repo",
            "api=/work/api",
            "--repo",
            "web=/work/web",
        ])
        .unwrap();

        assert_eq!(cli.repos.len(), 2);
        assert!(matches!(
            cli.command,
            Commands::Index {
                action: IndexAction::Build
            }
        ));
    }

    #[test]
    fn cli_parses_search_with_json_flag() {
        let cli = Cli::try_parse_from(["grove", "search", "files", "main", "--json"]).unwrap();
        match cli.command {
            Commands::Search {
                target: SearchTarget::Files { query, json },
            } => {
                assert_eq!(query, "main");
                assert!(json);
            }
            _ => panic!("wrong command"),
        }
    }
}
