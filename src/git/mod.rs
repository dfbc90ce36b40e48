//! git
//!
//! The backend boundary: every repository read and write flows through the
//! [`Backend`] trait.
//!
//! # Architecture
//!
//! The repository model never touches on-disk formats itself. It asks a
//! backend to list changes, stage paths, write commits, and read history,
//! and gets typed records back. Two implementations ship with the crate:
//!
//! - [`Git2Backend`] - a real repository on disk, via libgit2. This is the
//!   only module that imports `git2`.
//! - [`MemoryBackend`] - a complete in-memory repository for tests and for
//!   hosts that model repositories without a disk.
//!
//! # Invariants
//!
//! - All calls are synchronous request/response; none spawn work
//! - Batch staging reports failures per path, never all-or-nothing
//! - Backends are `Send + Sync`, so commits and history can be read from
//!   any thread while the staging area mutates the index

mod git2_backend;
mod memory;

pub use git2_backend::Git2Backend;
pub use memory::MemoryBackend;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::paths::StatePaths;
use crate::core::status::ChangedFile;
use crate::core::types::{ContentId, RepoPath, TypeError};

/// Errors from backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No repository metadata at or above the path.
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    /// Repository has no working directory.
    #[error("bare repository not supported: {path}")]
    BareRepo { path: PathBuf },

    /// A revision expression, object, or path could not be resolved.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// The index matches HEAD.
    #[error("nothing to commit")]
    NothingToCommit,

    /// The index has unmerged entries.
    #[error("index has unresolved conflicts")]
    UnresolvedConflicts,

    /// No author identity is configured.
    #[error("no author identity available: {message}")]
    MissingIdentity { message: String },

    /// Filesystem failure while talking to the repository.
    #[error("repository i/o error: {message}")]
    Io { message: String },

    /// Any other backend failure.
    #[error("backend error: {message}")]
    Internal { message: String },
}

impl From<TypeError> for BackendError {
    fn from(err: TypeError) -> Self {
        BackendError::Internal {
            message: err.to_string(),
        }
    }
}

/// Commit author identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Metadata of one commit, read in a single backend query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    /// First line of the message.
    pub subject: String,
    /// Full message.
    pub comment: String,
    /// Parents in the order the backend reports them.
    pub parents: Vec<ContentId>,
}

/// Kind of object found at a path in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Submodule,
}

impl EntryKind {
    /// Whether the entry has file content (a blob).
    pub fn is_readable(self) -> bool {
        matches!(self, EntryKind::File | EntryKind::Symlink)
    }
}

/// First line of a commit message, trimmed.
pub(crate) fn subject_of(message: &str) -> String {
    message.lines().next().unwrap_or("").trim().to_string()
}

/// A tree entry: the object at a path in a commit's tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub id: ContentId,
    pub kind: EntryKind,
}

/// One path the backend refused to stage or unstage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFailure {
    pub path: RepoPath,
    pub reason: String,
}

impl PathFailure {
    pub fn new(path: RepoPath, reason: impl Into<String>) -> Self {
        Self {
            path,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for PathFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// The version control backend consumed by the repository model.
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Root of the working tree.
    fn work_dir(&self) -> &Path;

    /// Where gitstate may keep per-repository files. `None` for backends
    /// without on-disk metadata.
    fn state_paths(&self) -> Option<StatePaths>;

    /// Resolve a revision expression (`HEAD`, a ref, an id) to a commit id.
    fn resolve_reference(&self, expr: &str) -> Result<ContentId, BackendError>;

    /// Reconcile HEAD, index, and working tree into change records.
    fn list_changes(&self, include_untracked: bool) -> Result<Vec<ChangedFile>, BackendError>;

    /// Add paths to the index. Returns the paths that could not be staged.
    fn stage(&self, paths: &[RepoPath]) -> Result<Vec<PathFailure>, BackendError>;

    /// Restore index entries from HEAD. Returns the paths that could not be unstaged.
    fn unstage(&self, paths: &[RepoPath]) -> Result<Vec<PathFailure>, BackendError>;

    /// Commit the index on top of HEAD and advance HEAD.
    ///
    /// `author` overrides the backend's own identity.
    fn commit(&self, message: &str, author: Option<&Identity>) -> Result<ContentId, BackendError>;

    /// Read a commit's metadata.
    fn read_commit_metadata(&self, id: &ContentId) -> Result<CommitMetadata, BackendError>;

    /// The tree entry at `path` in commit `id`, or `None` if absent.
    fn entry_at(&self, id: &ContentId, path: &RepoPath) -> Result<Option<PathEntry>, BackendError>;

    /// File bytes at `path` in commit `id`, or `None` if no file is there.
    fn read_path_at(&self, id: &ContentId, path: &RepoPath) -> Result<Option<Vec<u8>>, BackendError>;

    /// Whether `path` in `commit` differs from `path` in every parent.
    ///
    /// A root commit differs from "absent" exactly when the path exists.
    fn diff_path_across_parents(
        &self,
        commit: &ContentId,
        parents: &[ContentId],
        path: &RepoPath,
    ) -> Result<bool, BackendError> {
        let own = self.entry_at(commit, path)?.map(|e| e.id);
        if parents.is_empty() {
            return Ok(own.is_some());
        }
        for parent in parents {
            let theirs = self.entry_at(parent, path)?.map(|e| e.id);
            if theirs == own {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_display() {
        let id = Identity::new("Test User", "test@example.com");
        assert_eq!(id.to_string(), "Test User <test@example.com>");
    }

    #[test]
    fn path_failure_display() {
        let failure = PathFailure::new(RepoPath::new("a.txt").unwrap(), "no such file");
        assert_eq!(failure.to_string(), "a.txt: no such file");
    }

    #[test]
    fn subject_is_first_line() {
        assert_eq!(subject_of("first\n\nbody text"), "first");
        assert_eq!(subject_of("  padded  "), "padded");
        assert_eq!(subject_of(""), "");
    }

    #[test]
    fn only_blobs_are_readable() {
        assert!(EntryKind::File.is_readable());
        assert!(EntryKind::Symlink.is_readable());
        assert!(!EntryKind::Directory.is_readable());
        assert!(!EntryKind::Submodule.is_readable());
    }

    #[test]
    fn error_display_formatting() {
        let err = BackendError::NotFound {
            what: "refs/heads/nope".into(),
        };
        assert!(err.to_string().contains("refs/heads/nope"));
        assert_eq!(BackendError::NothingToCommit.to_string(), "nothing to commit");
    }
}
