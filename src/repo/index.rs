//! repo::index
//!
//! The staging area: what changed, and the stage/unstage/commit transitions.
//!
//! # Snapshot model
//!
//! [`StagingArea::refresh`] re-derives the whole change set from the
//! backend. Nothing patches the snapshot incrementally, and no mutation
//! refreshes it implicitly, so a snapshot read after a mutation is stale
//! until the caller refreshes again.
//!
//! # Serialization
//!
//! All mutations on one staging area are serialized by an internal mutex.
//! When the backend keeps metadata on disk and locking is enabled, each
//! mutation also holds the cross-process [`RepoLock`], so two processes
//! cannot interleave writes to the same index.
//!
//! # Per-path staging
//!
//! Each selected path is staged with its own backend call. A failing path
//! is collected and reported; it never rolls back or blocks the others.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::config::Config;
use crate::core::lock::RepoLock;
use crate::core::status::{ChangeKind, ChangedFile};
use crate::core::types::RepoPath;
use crate::error::RepoError;
use crate::git::{Backend, Identity, PathFailure};
use crate::repo::commit::Commit;

#[derive(Debug, Clone)]
struct Settings {
    include_untracked: bool,
    lock_enabled: bool,
    identity: Option<Identity>,
}

/// The index model of one repository.
#[derive(Debug)]
pub struct StagingArea {
    backend: Arc<dyn Backend>,
    settings: Settings,
    snapshot: Mutex<Vec<ChangedFile>>,
    ops: Mutex<()>,
}

impl StagingArea {
    pub(crate) fn new(backend: Arc<dyn Backend>, config: &Config) -> Self {
        Self {
            backend,
            settings: Settings {
                include_untracked: config.include_untracked(),
                lock_enabled: config.lock_enabled(),
                identity: config.identity(),
            },
            snapshot: Mutex::new(Vec::new()),
            ops: Mutex::new(()),
        }
    }

    fn snapshot(&self) -> MutexGuard<'_, Vec<ChangedFile>> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` holding the in-process mutex and, if configured, the
    /// repository lock.
    fn serialized<T>(
        &self,
        op: &'static str,
        f: impl FnOnce() -> Result<T, RepoError>,
    ) -> Result<T, RepoError> {
        let _guard = self.ops.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = match self.backend.state_paths() {
            Some(paths) if self.settings.lock_enabled => Some(RepoLock::acquire(&paths)?),
            _ => None,
        };
        tracing::debug!(op, "staging operation");
        f()
    }

    /// Recompute the snapshot from HEAD, the index, and the working tree.
    pub fn refresh(&self) -> Result<(), RepoError> {
        self.serialized("refresh", || {
            let changes = self.backend.list_changes(self.settings.include_untracked)?;
            let mut seen = HashSet::new();
            let fresh: Vec<ChangedFile> = changes
                .into_iter()
                .filter(|change| seen.insert(change.path.clone()))
                .collect();
            tracing::debug!(count = fresh.len(), "refreshed snapshot");
            *self.snapshot() = fresh;
            Ok(())
        })
    }

    /// The snapshot from the last refresh. Empty before the first refresh.
    pub fn changed_files(&self) -> Vec<ChangedFile> {
        self.snapshot().clone()
    }

    /// Records with a staged change.
    pub fn staged_files(&self) -> Vec<ChangedFile> {
        self.snapshot()
            .iter()
            .filter(|c| c.staged)
            .cloned()
            .collect()
    }

    /// Records with working-tree changes not yet staged.
    pub fn unstaged_files(&self) -> Vec<ChangedFile> {
        self.snapshot()
            .iter()
            .filter(|c| c.has_unstaged_changes)
            .cloned()
            .collect()
    }

    pub fn has_unresolved_conflicts(&self) -> bool {
        self.snapshot()
            .iter()
            .any(|c| c.kind == ChangeKind::Conflicted)
    }

    /// Stage each file in `selection`.
    ///
    /// # Errors
    ///
    /// [`RepoError::StageFailed`] listing every path the backend rejected,
    /// after all other paths have been staged.
    pub fn stage_files(&self, selection: &[ChangedFile]) -> Result<(), RepoError> {
        let paths: Vec<RepoPath> = selection.iter().map(|c| c.path.clone()).collect();
        self.stage_paths(&paths)
    }

    /// Stage paths directly, without going through a snapshot.
    pub fn stage_paths(&self, paths: &[RepoPath]) -> Result<(), RepoError> {
        self.serialized("stage", || {
            let failures = self.each_path(paths, |p| self.backend.stage(p))?;
            if failures.is_empty() {
                Ok(())
            } else {
                Err(RepoError::StageFailed { failures })
            }
        })
    }

    /// Restore each file in `selection` to its HEAD state in the index.
    ///
    /// # Errors
    ///
    /// [`RepoError::UnstageFailed`] listing every path the backend rejected.
    pub fn unstage_files(&self, selection: &[ChangedFile]) -> Result<(), RepoError> {
        let paths: Vec<RepoPath> = selection.iter().map(|c| c.path.clone()).collect();
        self.unstage_paths(&paths)
    }

    /// Unstage paths directly, without going through a snapshot.
    pub fn unstage_paths(&self, paths: &[RepoPath]) -> Result<(), RepoError> {
        self.serialized("unstage", || {
            let failures = self.each_path(paths, |p| self.backend.unstage(p))?;
            if failures.is_empty() {
                Ok(())
            } else {
                Err(RepoError::UnstageFailed { failures })
            }
        })
    }

    fn each_path(
        &self,
        paths: &[RepoPath],
        call: impl Fn(&[RepoPath]) -> Result<Vec<PathFailure>, crate::git::BackendError>,
    ) -> Result<Vec<PathFailure>, RepoError> {
        let mut failures = Vec::new();
        for path in paths {
            for failure in call(std::slice::from_ref(path))? {
                tracing::warn!(path = %failure.path, reason = %failure.reason, "path rejected");
                failures.push(failure);
            }
        }
        Ok(failures)
    }

    /// Commit the backend's current index and advance HEAD.
    ///
    /// Emptiness is judged against the backend's index at the moment of the
    /// call, not against the snapshot.
    ///
    /// # Errors
    ///
    /// - [`RepoError::NothingToCommit`] if the index matches HEAD
    /// - [`RepoError::CommitFailed`] on conflicts or a missing identity
    /// - [`RepoError::InvalidInput`] for a blank message
    pub fn commit(&self, message: &str) -> Result<Commit, RepoError> {
        if message.trim().is_empty() {
            return Err(RepoError::InvalidInput {
                message: "commit message cannot be empty".into(),
            });
        }
        self.serialized("commit", || {
            let id = self
                .backend
                .commit(message, self.settings.identity.as_ref())?;
            let commit = Commit::from_id(Arc::clone(&self.backend), id)?;
            tracing::info!(commit = %commit.id().short(12), subject = commit.subject(), "committed");
            Ok(commit)
        })
    }
}
