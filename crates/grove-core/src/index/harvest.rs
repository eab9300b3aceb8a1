//! Commit history harvesting via the `git` subprocess interface

use std::path::Path;
use std::process::Command;

use crate::models::CommitEntry;

/// Most recent commits harvested per repository per pass. The bound lives
/// here, not in storage.
pub const MAX_COMMITS: usize = 1000;

/// Pipe-delimited record: hash, author name, subject, Unix commit time.
/// The field order and delimiter are a parsing contract shared with the
/// subprocess invocation below.
const LOG_FORMAT: &str = "%H|%an|%s|%ct|";

/// Harvest up to [`MAX_COMMITS`] recent commits for a repository.
///
/// A repository with zero commits, or one where `git` cannot be run at all,
/// yields an empty list rather than an error. Malformed log lines are
/// skipped. For every retained commit a second `git` call counts the files
/// it changed; on deep histories those per-commit calls dominate the cost
/// of the whole harvest.
pub fn harvest_commits(alias: &str, root: &Path) -> Vec<CommitEntry> {
    let format = format!("--pretty=format:{LOG_FORMAT}");
    let limit = MAX_COMMITS.to_string();
    let output = match run_git(root, &["log", "-n", &limit, &format]) {
        Ok(output) => output,
        Err(error) => {
            tracing::debug!(repo = alias, error, "commit harvest yielded nothing");
            return Vec::new();
        }
    };

    let mut commits: Vec<CommitEntry> = output
        .lines()
        .filter_map(|line| parse_log_line(alias, line))
        .collect();

    for commit in &mut commits {
        commit.files_changed = changed_file_count(root, &commit.hash);
    }

    tracing::debug!(repo = alias, commits = commits.len(), "harvested history");
    commits
}

/// Parse one `hash|author|subject|unix-time|` record.
///
/// Returns `None` for anything that does not match the contract, including
/// subjects that smuggle in extra delimiters and shift the time field.
pub fn parse_log_line(alias: &str, line: &str) -> Option<CommitEntry> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() < 4 {
        return None;
    }

    let hash = parts[0].trim();
    if hash.is_empty() {
        return None;
    }
    let commit_time: i64 = parts[3].trim().parse().ok()?;

    Some(CommitEntry {
        repo_alias: alias.to_string(),
        hash: hash.to_string(),
        author: parts[1].to_string(),
        subject: parts[2].to_string(),
        commit_time,
        files_changed: 0,
    })
}

/// Count the files changed by a commit. A failed lookup counts as zero.
pub fn changed_file_count(root: &Path, hash: &str) -> i64 {
    match run_git(root, &["show", "--pretty=format:", "--name-only", hash]) {
        Ok(output) => output.lines().filter(|line| !line.trim().is_empty()).count() as i64,
        Err(_) => 0,
    }
}

/// Run `git -C <root> <args>` and return stdout, blocking until it exits.
/// There is deliberately no timeout; cancellation is the caller's problem.
fn run_git(root: &Path, args: &[&str]) -> Result<String, String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .map_err(|error| format!("failed to run git {args:?}: {error}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git {args:?} failed: {}", stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_well_formed_line() {
        let line = "abc123def|Ada Lovelace|Fix critical bug|1700000000|";
        let commit = parse_log_line("a", line).unwrap();
        assert_eq!(commit.repo_alias, "a");
        assert_eq!(commit.hash, "abc123def");
        assert_eq!(commit.author, "Ada Lovelace");
        assert_eq!(commit.subject, "Fix critical bug");
        assert_eq!(commit.commit_time, 1_700_000_000);
        assert_eq!(commit.files_changed, 0);
    }

    #[test]
    fn skips_truncated_lines() {
        assert!(parse_log_line("a", "").is_none());
        assert!(parse_log_line("a", "abc123").is_none());
        assert!(parse_log_line("a", "abc123|Ada|subject").is_none());
    }

    #[test]
    fn skips_lines_with_shifted_fields() {
        // A pipe inside the subject shifts the time field out of place
        let line = "abc123|Ada|subject with | pipe|1700000000|";
        assert!(parse_log_line("a", line).is_none());
    }

    #[test]
    fn skips_empty_hash() {
        assert!(parse_log_line("a", "|Ada|subject|1700000000|").is_none());
    }

    #[test]
    fn harvest_of_non_repository_is_empty() {
        let tmp = TempDir::new().unwrap();
        let commits = harvest_commits("a", tmp.path());
        assert!(commits.is_empty());
    }

    #[test]
    fn harvest_of_missing_path_is_empty() {
        let tmp = TempDir::new().unwrap();
        let commits = harvest_commits("a", &tmp.path().join("nope"));
        assert!(commits.is_empty());
    }
}
