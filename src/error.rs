//! error
//!
//! Errors surfaced by the repository model.
//!
//! Every failure the core API can report is one [`RepoError`] variant.
//! Backend, lock, config, and type errors are folded in at the boundary so
//! callers match on one enum.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::lock::LockError;
use crate::core::types::{ContentId, RepoPath, TypeError};
use crate::git::{BackendError, PathFailure};

/// Why a commit was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitFailure {
    /// The index has unmerged entries.
    #[error("unresolved conflicts")]
    UnresolvedConflicts,

    /// No author identity in gitstate config or git config.
    #[error("missing author identity ({message})")]
    MissingIdentity { message: String },
}

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// No repository metadata at or above the path.
    #[error("not a repository: {path}")]
    NotARepository { path: PathBuf },

    /// A revision expression or path could not be resolved.
    #[error("cannot resolve '{expr}'")]
    UnresolvedReference { expr: String },

    /// One or more paths were rejected while staging.
    #[error("failed to stage {}", describe(.failures))]
    StageFailed { failures: Vec<PathFailure> },

    /// One or more paths were rejected while unstaging.
    #[error("failed to unstage {}", describe(.failures))]
    UnstageFailed { failures: Vec<PathFailure> },

    /// The index matches HEAD.
    #[error("nothing to commit")]
    NothingToCommit,

    /// The backend refused the commit.
    #[error("commit failed: {reason}")]
    CommitFailed { reason: CommitFailure },

    /// The path is absent at the requested commit.
    #[error("{path} does not exist at {commit}")]
    ContentUnavailable { commit: ContentId, path: RepoPath },

    /// The backend could not be used at all.
    #[error("backend unavailable: {message}")]
    BackendUnavailable { message: String },

    /// Another gitstate process holds the repository lock.
    #[error("repository is locked by another gitstate process")]
    Locked,

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Caller input failed validation.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

fn describe(failures: &[PathFailure]) -> String {
    let listed = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    match failures.len() {
        1 => format!("1 path: {listed}"),
        n => format!("{n} paths: {listed}"),
    }
}

impl RepoError {
    /// The per-path failures of a batch operation, if this is one.
    pub fn path_failures(&self) -> &[PathFailure] {
        match self {
            RepoError::StageFailed { failures } | RepoError::UnstageFailed { failures } => failures,
            _ => &[],
        }
    }
}

impl From<BackendError> for RepoError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotARepo { path } | BackendError::BareRepo { path } => {
                RepoError::NotARepository { path }
            }
            BackendError::NotFound { what } => RepoError::UnresolvedReference { expr: what },
            BackendError::NothingToCommit => RepoError::NothingToCommit,
            BackendError::UnresolvedConflicts => RepoError::CommitFailed {
                reason: CommitFailure::UnresolvedConflicts,
            },
            BackendError::MissingIdentity { message } => RepoError::CommitFailed {
                reason: CommitFailure::MissingIdentity { message },
            },
            BackendError::Io { message } | BackendError::Internal { message } => {
                RepoError::BackendUnavailable { message }
            }
        }
    }
}

impl From<LockError> for RepoError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::AlreadyLocked => RepoError::Locked,
            other => RepoError::BackendUnavailable {
                message: other.to_string(),
            },
        }
    }
}

impl From<TypeError> for RepoError {
    fn from(err: TypeError) -> Self {
        RepoError::InvalidInput {
            message: err.to_string(),
        }
    }
}
