//! Architecture enforcement tests.
//!
//! The backend boundary only holds if nothing above it reaches around it.
//! These tests scan the source tree so violations are caught in CI:
//!
//! 1. **git2 isolation** - only the git2 backend module imports `git2`
//! 2. **Thin commands** - CLI handlers use the repository model, never a
//!    backend type directly

use std::fs;
use std::path::{Path, PathBuf};

/// Files allowed to name the `git2` crate.
const GIT2_ALLOWED: &[&str] = &["src/git/git2_backend.rs"];

fn rust_files(dir: &Path, out: &mut Vec<PathBuf>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            rust_files(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs") {
            out.push(path);
        }
    }
}

fn relative(path: &Path) -> String {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn sources_under(dir: &str) -> Vec<(String, String)> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join(dir);
    let mut files = Vec::new();
    rust_files(&root, &mut files);
    files
        .into_iter()
        .map(|p| {
            let text = fs::read_to_string(&p).unwrap();
            (relative(&p), text)
        })
        .collect()
}

#[test]
fn only_git2_backend_imports_git2() {
    let offenders: Vec<String> = sources_under("src")
        .into_iter()
        .filter(|(name, _)| !GIT2_ALLOWED.contains(&name.as_str()))
        .filter(|(_, text)| {
            text.lines()
                .map(str::trim_start)
                .filter(|line| !line.starts_with("//"))
                .any(|line| line.contains("git2::") || line.starts_with("use git2"))
        })
        .map(|(name, _)| name)
        .collect();

    assert!(
        offenders.is_empty(),
        "git2 used outside the backend: {offenders:?}"
    );
}

#[test]
fn commands_do_not_touch_backends() {
    let offenders: Vec<String> = sources_under("src/cli/commands")
        .into_iter()
        .filter(|(_, text)| {
            text.contains("Git2Backend") || text.contains("MemoryBackend") || text.contains("use crate::git")
        })
        .map(|(name, _)| name)
        .collect();

    assert!(
        offenders.is_empty(),
        "commands bypass the repository model: {offenders:?}"
    );
}

#[test]
fn lint_sees_the_source_tree() {
    let names: Vec<String> = sources_under("src").into_iter().map(|(n, _)| n).collect();
    assert!(names.iter().any(|n| n == "src/git/git2_backend.rs"));
    assert!(names.iter().any(|n| n == "src/repo/rev_list.rs"));
}
