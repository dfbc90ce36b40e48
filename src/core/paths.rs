//! core::paths
//!
//! Centralized path routing for gitstate's own storage.
//!
//! gitstate keeps its per-repository files next to the backend metadata,
//! under `<common_dir>/gitstate/`:
//! - `config.toml` - Repository configuration
//! - `lock` - Advisory lock serializing staging operations
//!
//! `common_dir` is shared by every linked worktree, so the lock guards the
//! one index the worktrees share.
//!
//! # Example
//!
//! ```
//! use gitstate::core::paths::StatePaths;
//! use std::path::PathBuf;
//!
//! let paths = StatePaths::new(
//!     PathBuf::from("/repo/.git"),
//!     PathBuf::from("/repo/.git"),
//! );
//!
//! assert_eq!(
//!     paths.repo_config_path(),
//!     PathBuf::from("/repo/.git/gitstate/config.toml")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Storage locations for one repository.
///
/// # Invariants
///
/// - Repo-scoped storage always uses `common_dir`
/// - No code outside this module joins `"gitstate"` onto a git directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    /// Per-worktree git directory. Equals `common_dir` for normal repositories.
    pub git_dir: PathBuf,

    /// Shared git directory (refs, objects, config).
    pub common_dir: PathBuf,
}

impl StatePaths {
    /// Create paths from a git directory and its common directory.
    pub fn new(git_dir: PathBuf, common_dir: PathBuf) -> Self {
        Self {
            git_dir,
            common_dir,
        }
    }

    /// Root of gitstate's storage, `<common_dir>/gitstate`.
    pub fn state_dir(&self) -> PathBuf {
        self.common_dir.join("gitstate")
    }

    /// `<common_dir>/gitstate/config.toml`.
    pub fn repo_config_path(&self) -> PathBuf {
        self.state_dir().join("config.toml")
    }

    /// `<common_dir>/gitstate/lock`.
    pub fn repo_lock_path(&self) -> PathBuf {
        self.state_dir().join("lock")
    }

    /// Check if this is a linked worktree (common_dir != git_dir).
    pub fn is_worktree(&self) -> bool {
        self.git_dir != self.common_dir
    }

    pub fn common_dir(&self) -> &Path {
        &self.common_dir
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}
