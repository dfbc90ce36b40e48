//! repo::commit
//!
//! Immutable handle to one commit.
//!
//! # Invariants
//!
//! - The revision expression is resolved exactly once, at construction
//! - All metadata comes from a single backend query made at construction;
//!   accessors never call the backend
//! - Two handles with the same id are interchangeable: equality and hashing
//!   use the id alone
//!
//! Tree lookups are deferred and memoized per instance. Clones share the
//! memo, so a commit handed to several revisions resolves each path once.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::core::types::{ContentId, RepoPath};
use crate::error::RepoError;
use crate::git::{Backend, CommitMetadata, PathEntry};
use crate::repo::Repository;

struct Inner {
    id: ContentId,
    metadata: CommitMetadata,
    backend: Arc<dyn Backend>,
    entries: Mutex<HashMap<RepoPath, Option<PathEntry>>>,
}

/// A resolved commit. Cheap to clone.
#[derive(Clone)]
pub struct Commit {
    inner: Arc<Inner>,
}

impl Commit {
    /// Resolve `expr` (an id, a ref, or `HEAD`) in `repo`.
    ///
    /// # Errors
    ///
    /// [`RepoError::UnresolvedReference`] if the backend cannot resolve it.
    pub fn new(repo: &Repository, expr: &str) -> Result<Self, RepoError> {
        let backend = Arc::clone(repo.backend());
        let id = backend
            .resolve_reference(expr)
            .map_err(|e| unresolved(e, expr))?;
        Self::from_id(backend, id)
    }

    /// Load the commit `id` directly, skipping reference resolution.
    pub fn from_id(backend: Arc<dyn Backend>, id: ContentId) -> Result<Self, RepoError> {
        let metadata = backend
            .read_commit_metadata(&id)
            .map_err(|e| unresolved(e, id.as_str()))?;
        tracing::debug!(commit = %id.short(12), "loaded commit");
        Ok(Self {
            inner: Arc::new(Inner {
                id,
                metadata,
                backend,
                entries: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn id(&self) -> &ContentId {
        &self.inner.id
    }

    /// The id as a hex string.
    pub fn sha(&self) -> &str {
        self.inner.id.as_str()
    }

    /// Author name.
    pub fn author(&self) -> &str {
        &self.inner.metadata.author_name
    }

    pub fn author_email(&self) -> &str {
        &self.inner.metadata.author_email
    }

    /// Author timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.inner.metadata.timestamp
    }

    /// First line of the message.
    pub fn subject(&self) -> &str {
        &self.inner.metadata.subject
    }

    /// Full message.
    pub fn comment(&self) -> &str {
        &self.inner.metadata.comment
    }

    /// Parent ids, in the order the backend reports them.
    pub fn parents(&self) -> &[ContentId] {
        &self.inner.metadata.parents
    }

    pub fn is_root(&self) -> bool {
        self.parents().is_empty()
    }

    pub fn is_merge(&self) -> bool {
        self.parents().len() > 1
    }

    /// The tree entry at `path`, looked up once per instance.
    pub fn entry_at(&self, path: &RepoPath) -> Result<Option<PathEntry>, RepoError> {
        if let Some(cached) = self.entries().get(path) {
            return Ok(cached.clone());
        }
        let entry = self.inner.backend.entry_at(&self.inner.id, path)?;
        self.entries().insert(path.clone(), entry.clone());
        Ok(entry)
    }

    /// File bytes at `path`, or `None` if no file is there. Not memoized.
    pub fn read_path(&self, path: &RepoPath) -> Result<Option<Vec<u8>>, RepoError> {
        Ok(self.inner.backend.read_path_at(&self.inner.id, path)?)
    }

    /// Whether `path` differs between this commit and every one of its parents.
    pub fn touches(&self, path: &RepoPath) -> Result<bool, RepoError> {
        Ok(self
            .inner
            .backend
            .diff_path_across_parents(&self.inner.id, self.parents(), path)?)
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Backend> {
        &self.inner.backend
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<RepoPath, Option<PathEntry>>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A failed lookup names the expression the caller gave, not the backend's.
fn unresolved(err: crate::git::BackendError, expr: &str) -> RepoError {
    match RepoError::from(err) {
        RepoError::UnresolvedReference { .. } => RepoError::UnresolvedReference {
            expr: expr.to_string(),
        },
        other => other,
    }
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Commit {}

impl Hash for Commit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl std::fmt::Debug for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commit")
            .field("id", &self.inner.id)
            .field("subject", &self.inner.metadata.subject)
            .field("parents", &self.inner.metadata.parents)
            .finish()
    }
}

impl std::fmt::Display for Commit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.inner.id.short(7), self.inner.metadata.subject)
    }
}
