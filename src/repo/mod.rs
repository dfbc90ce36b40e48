//! repo
//!
//! The repository object model.
//!
//! # Architecture
//!
//! A [`Repository`] binds a backend and a loaded configuration. It owns the
//! single [`StagingArea`] for that repository and hands out the read-side
//! objects:
//!
//! - [`Commit`] - immutable snapshot metadata, with memoized tree lookups
//! - [`HistoryWalker`] - ordered, optionally path-filtered history
//! - [`CommitFileRevision`] - one file's bytes at one commit
//!
//! # Invariants
//!
//! - One staging area per handle; callers share it through [`Repository::index`]
//! - Read-side objects hold only resolved ids, so they may be used from any
//!   thread while the staging area mutates the index
//!
//! # Example
//!
//! ```ignore
//! use gitstate::repo::{Repository, RevSpecifier};
//! use gitstate::core::types::RepoPath;
//!
//! let repo = Repository::open(std::path::Path::new("."))?;
//! let mut walker = repo.rev_list();
//! walker.walk(&RevSpecifier::for_path(RepoPath::new("README.md")?), Some(10), None)?;
//! for commit in walker.commits() {
//!     println!("{commit}");
//! }
//! ```

pub mod commit;
pub mod index;
pub mod rev_list;
pub mod revision;

pub use commit::Commit;
pub use index::StagingArea;
pub use rev_list::{CancellationToken, HistoryWalker, RevSpecifier, WalkStatus};
pub use revision::{CommitFileRevision, FileRevision, RevisionUri, Storage};

use std::path::Path;
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::types::RepoPath;
use crate::error::RepoError;
use crate::git::{Backend, Git2Backend};

/// A handle to one repository.
#[derive(Debug)]
pub struct Repository {
    backend: Arc<dyn Backend>,
    config: Config,
    index: StagingArea,
}

impl Repository {
    /// Open the repository containing `path`, loading gitstate config.
    ///
    /// # Errors
    ///
    /// - [`RepoError::NotARepository`] if no repository is found at or above `path`
    /// - [`RepoError::Config`] if a config file exists but is invalid
    pub fn open(path: &Path) -> Result<Self, RepoError> {
        let backend = Git2Backend::open(path)?;
        let config = Self::load_config(&backend)?;
        Ok(Self::with_backend(Arc::new(backend), config))
    }

    /// Open the repository containing `path` with an explicit config.
    pub fn open_with_config(path: &Path, config: Config) -> Result<Self, RepoError> {
        let backend = Git2Backend::open(path)?;
        Ok(Self::with_backend(Arc::new(backend), config))
    }

    /// Initialize a repository at `path` and open it. Idempotent.
    pub fn create(path: &Path) -> Result<Self, RepoError> {
        let backend = Git2Backend::init(path)?;
        let config = Self::load_config(&backend)?;
        Ok(Self::with_backend(Arc::new(backend), config))
    }

    /// Wrap any backend.
    pub fn with_backend(backend: Arc<dyn Backend>, config: Config) -> Self {
        let index = StagingArea::new(Arc::clone(&backend), &config);
        Self {
            backend,
            config,
            index,
        }
    }

    fn load_config(backend: &dyn Backend) -> Result<Config, RepoError> {
        let loaded = Config::load(backend.state_paths().as_ref())?;
        for warning in &loaded.warnings {
            tracing::warn!(path = %warning.path.display(), "{}", warning.message);
        }
        Ok(loaded.config)
    }

    /// Root of the working tree.
    pub fn working_directory(&self) -> &Path {
        self.backend.work_dir()
    }

    /// The staging area for this repository.
    pub fn index(&self) -> &StagingArea {
        &self.index
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Resolve `expr` to a commit.
    pub fn commit(&self, expr: &str) -> Result<Commit, RepoError> {
        Commit::new(self, expr)
    }

    /// The commit HEAD points at.
    pub fn head(&self) -> Result<Commit, RepoError> {
        self.commit("HEAD")
    }

    /// A fresh history walker.
    pub fn rev_list(&self) -> HistoryWalker {
        HistoryWalker::new(Arc::clone(&self.backend))
    }

    /// The file at `path` as of `commit`.
    pub fn file_revision(&self, commit: &Commit, path: &str) -> Result<CommitFileRevision, RepoError> {
        Ok(CommitFileRevision::new(commit.clone(), RepoPath::new(path)?))
    }
}
