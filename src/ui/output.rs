//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is enabled, output is machine-readable JSON.

use std::fmt::Display;

use serde::Serialize;

use crate::core::status::ChangedFile;
use crate::repo::Commit;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a value as pretty JSON (always shown).
pub fn json<T: Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format one change record as a status line: `<code> <path>`.
///
/// A staged path with further edits gets a trailing `+`.
pub fn format_change(change: &ChangedFile) -> String {
    let marker = if change.staged && change.has_unstaged_changes {
        " +"
    } else {
        ""
    };
    format!("{} {}{}", change.kind.code(), change.path, marker)
}

/// Format a commit as a one-line log entry.
pub fn format_commit_line(commit: &Commit) -> String {
    format!(
        "{} {} {} {}",
        commit.id().short(7),
        commit.timestamp().format("%Y-%m-%d"),
        commit.author(),
        commit.subject()
    )
}

/// JSON shape of a commit in `log --json`.
#[derive(Debug, Serialize)]
pub struct CommitRecord<'a> {
    pub id: &'a str,
    pub author: &'a str,
    pub email: &'a str,
    pub timestamp: String,
    pub subject: &'a str,
    pub parents: Vec<&'a str>,
}

impl<'a> From<&'a Commit> for CommitRecord<'a> {
    fn from(commit: &'a Commit) -> Self {
        Self {
            id: commit.sha(),
            author: commit.author(),
            email: commit.author_email(),
            timestamp: commit.timestamp().to_rfc3339(),
            subject: commit.subject(),
            parents: commit.parents().iter().map(|p| p.as_str()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::ChangeKind;
    use crate::core::types::RepoPath;

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn change_line_marks_partial_staging() {
        let path = RepoPath::new("src/lib.rs").unwrap();
        let plain = ChangedFile::new(path.clone(), ChangeKind::Untracked);
        assert_eq!(
            format_change(&plain),
            format!("{} src/lib.rs", ChangeKind::Untracked.code())
        );

        let partial = ChangedFile::reconcile(
            path,
            Some(ChangeKind::StagedModified),
            Some(ChangeKind::Modified),
            false,
        )
        .unwrap();
        assert!(format_change(&partial).ends_with(" +"));
    }
}
