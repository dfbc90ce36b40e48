//! Integration tests for file revisions read back from real commits.
//!
//! Each test creates a repository in a temp dir, commits through the
//! staging area, and reads content back through `CommitFileRevision`.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use tempfile::TempDir;

use gitstate::core::config::{Config, GlobalConfig, IdentityConfig};
use gitstate::core::types::RepoPath;
use gitstate::repo::{FileRevision, Repository, RevSpecifier};
use gitstate::RepoError;

// =============================================================================
// Test Fixtures
// =============================================================================

fn test_config() -> Config {
    Config::from_parts(
        GlobalConfig {
            identity: Some(IdentityConfig {
                name: Some("Test User".into()),
                email: Some("test@example.com".into()),
            }),
            ..Default::default()
        },
        None,
    )
}

/// Create a repository and reopen it with a fixed identity.
fn create_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("repo");
    Repository::create(&path).expect("create failed");
    let repo = Repository::open_with_config(&path, test_config()).expect("open failed");
    (dir, repo)
}

fn write(repo: &Repository, name: &str, contents: &str) {
    let path = repo.working_directory().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Refresh, stage everything that changed, and commit.
fn commit_all(repo: &Repository, message: &str) -> gitstate::repo::Commit {
    let index = repo.index();
    index.refresh().unwrap();
    let changed = index.changed_files();
    assert!(!changed.is_empty(), "expected changes before '{message}'");
    index.stage_files(&changed).unwrap();
    index.refresh().unwrap();
    assert!(!index.staged_files().is_empty());
    index.commit(message).unwrap()
}

// =============================================================================
// Single commit
// =============================================================================

#[test]
fn revision_of_single_commit() {
    let (_dir, repo) = create_repo();
    let name = "comitted_file.txt";
    let text = "Hello World!";
    write(&repo, name, text);
    commit_all(&repo, "Initial commit");

    let commit = repo.commit("HEAD").unwrap();
    let revision = repo.file_revision(&commit, name).unwrap();

    assert!(revision.exists().unwrap());
    assert_eq!(revision.name(), name);
    assert!(!revision.is_property_missing());
    assert!(std::ptr::eq(revision.with_all_properties(None), &revision));
    assert_eq!(revision.uri().path(), name);

    let storage = revision.storage().unwrap();
    let mut read_back = String::new();
    storage.contents().read_to_string(&mut read_back).unwrap();
    assert_eq!(read_back, text);

    assert_eq!(revision.author(), "Test User");
    assert_eq!(revision.comment(), "Initial commit");
    assert_eq!(revision.content_identifier(), commit.id());
}

#[test]
fn nested_path_round_trips_bytes() {
    let (_dir, repo) = create_repo();
    let bytes = "line one\nline two\n\u{00e9}\n";
    write(&repo, "docs/guide/intro.md", bytes);
    let commit = commit_all(&repo, "docs");

    let revision = repo.file_revision(&commit, "docs/guide/intro.md").unwrap();
    assert_eq!(revision.name(), "intro.md");
    assert_eq!(revision.content().unwrap(), bytes.as_bytes());
}

#[test]
fn never_present_path_is_unavailable() {
    let (_dir, repo) = create_repo();
    write(&repo, "a.txt", "a");
    let commit = commit_all(&repo, "a");

    let revision = repo.file_revision(&commit, "missing/file.txt").unwrap();
    assert!(!revision.exists().unwrap());
    assert_eq!(revision.name(), "file.txt");
    assert_eq!(revision.uri().path(), "missing/file.txt");
    assert!(matches!(
        revision.content(),
        Err(RepoError::ContentUnavailable { .. })
    ));
}

// =============================================================================
// Multiple commits
// =============================================================================

#[test]
fn revisions_across_commits() {
    let (_dir, repo) = create_repo();
    let name = "comitted_file.txt";

    let mut payloads = HashMap::new();
    for i in 0..4 {
        let subject = format!("Commit {i}");
        let text = format!("{}\n", "Hello World!".repeat(i + 1));
        write(&repo, name, &text);
        commit_all(&repo, &subject);
        payloads.insert(subject, text);
    }

    let mut walker = repo.rev_list();
    let status = walker
        .walk(
            &RevSpecifier::for_path(RepoPath::new(name).unwrap()),
            None,
            None,
        )
        .unwrap();
    assert!(status.is_complete());

    let commits = walker.commits();
    assert_eq!(commits.len(), 4);
    let subjects: Vec<_> = commits.iter().map(|c| c.subject()).collect();
    assert_eq!(subjects, vec!["Commit 3", "Commit 2", "Commit 1", "Commit 0"]);

    for commit in commits {
        let revision = repo.file_revision(commit, name).unwrap();
        assert!(revision.exists().unwrap());
        assert_eq!(revision.author(), commit.author());
        assert_eq!(revision.comment(), commit.comment());
        assert_eq!(revision.timestamp(), commit.timestamp());
        assert_eq!(revision.content_identifier(), commit.id());
        assert_eq!(
            revision.content().unwrap(),
            payloads[commit.subject()].as_bytes()
        );
    }
}

#[test]
fn filtered_history_skips_unrelated_commits() {
    let (_dir, repo) = create_repo();
    write(&repo, "tracked.txt", "v1");
    commit_all(&repo, "tracked v1");
    write(&repo, "other.txt", "noise");
    commit_all(&repo, "unrelated");
    write(&repo, "tracked.txt", "v2, longer");
    commit_all(&repo, "tracked v2");

    let mut walker = repo.rev_list();
    walker
        .walk(
            &RevSpecifier::for_path(RepoPath::new("tracked.txt").unwrap()),
            None,
            None,
        )
        .unwrap();
    let subjects: Vec<_> = walker.commits().iter().map(|c| c.subject()).collect();
    assert_eq!(subjects, vec!["tracked v2", "tracked v1"]);

    walker.walk(&RevSpecifier::head(), None, None).unwrap();
    assert_eq!(walker.commits().len(), 3);
}

#[test]
fn create_is_idempotent_and_reopenable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("repo");
    let first = Repository::create(&path).unwrap();
    let root = first.working_directory().to_path_buf();
    drop(first);

    let second = Repository::create(&path).unwrap();
    assert_eq!(second.working_directory(), root);

    let nested = path.join("sub");
    fs::create_dir_all(&nested).unwrap();
    let opened = Repository::open_with_config(&nested, test_config()).unwrap();
    assert_eq!(
        opened.working_directory().canonicalize().unwrap(),
        Path::new(&root).canonicalize().unwrap()
    );
}
