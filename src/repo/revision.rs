//! repo::revision
//!
//! One file's content as of one commit.
//!
//! A [`CommitFileRevision`] binds a [`Commit`] and a path. Names, paths, and
//! commit metadata are available immediately. Existence and bytes are
//! fetched from the backend on first use and memoized for the life of the
//! instance; history does not change, so the memo is never invalidated.
//!
//! The [`FileRevision`] and [`Storage`] traits are the shape hosts consume:
//! an exists check, a name and URI, and a byte stream.

use std::hash::{Hash, Hasher};
use std::io::{Cursor, Read};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};

use crate::core::types::{ContentId, RepoPath};
use crate::error::RepoError;
use crate::repo::commit::Commit;
use crate::repo::rev_list::CancellationToken;

/// Identifies a file revision: `<content-id>:<path>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionUri {
    pub commit: ContentId,
    path: RepoPath,
}

impl RevisionUri {
    pub fn new(commit: ContentId, path: RepoPath) -> Self {
        Self { commit, path }
    }

    /// The repository-relative path component.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }
}

impl std::fmt::Display for RevisionUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.commit, self.path)
    }
}

/// Read-only blob content.
pub trait Storage {
    /// File name (last path component).
    fn name(&self) -> &str;

    fn full_path(&self) -> &RepoPath;

    fn bytes(&self) -> &[u8];

    /// A reader over [`Storage::bytes`].
    fn contents(&self) -> Box<dyn Read + '_> {
        Box::new(Cursor::new(self.bytes()))
    }

    fn is_read_only(&self) -> bool {
        true
    }
}

/// A file at a point in history.
pub trait FileRevision {
    fn name(&self) -> &str;

    fn uri(&self) -> RevisionUri;

    /// Whether the file exists at this revision.
    fn exists(&self) -> Result<bool, RepoError>;

    fn author(&self) -> &str;

    fn comment(&self) -> &str;

    fn timestamp(&self) -> DateTime<Utc>;

    fn content_identifier(&self) -> &ContentId;

    /// Whether any metadata still has to be fetched.
    fn is_property_missing(&self) -> bool;

    /// Fetch missing metadata. Returns `self`.
    fn with_all_properties(&self, cancel: Option<&CancellationToken>) -> &Self
    where
        Self: Sized;

    /// The file's content.
    ///
    /// # Errors
    ///
    /// [`RepoError::ContentUnavailable`] if the file does not exist.
    fn storage(&self) -> Result<Box<dyn Storage + '_>, RepoError>;
}

/// A file at a commit.
#[derive(Debug)]
pub struct CommitFileRevision {
    commit: Commit,
    path: RepoPath,
    exists: OnceLock<bool>,
    content: OnceLock<Vec<u8>>,
}

impl CommitFileRevision {
    pub fn new(commit: Commit, path: RepoPath) -> Self {
        Self {
            commit,
            path,
            exists: OnceLock::new(),
            content: OnceLock::new(),
        }
    }

    pub fn commit(&self) -> &Commit {
        &self.commit
    }

    pub fn path(&self) -> &RepoPath {
        &self.path
    }

    /// The file's bytes, fetched on first call.
    pub fn content(&self) -> Result<&[u8], RepoError> {
        if let Some(bytes) = self.content.get() {
            return Ok(bytes);
        }
        if !FileRevision::exists(self)? {
            return Err(self.unavailable());
        }
        let bytes = self
            .commit
            .read_path(&self.path)?
            .ok_or_else(|| self.unavailable())?;
        tracing::debug!(uri = %self.uri(), len = bytes.len(), "read revision content");
        Ok(self.content.get_or_init(|| bytes))
    }

    fn unavailable(&self) -> RepoError {
        RepoError::ContentUnavailable {
            commit: self.commit.id().clone(),
            path: self.path.clone(),
        }
    }
}

impl FileRevision for CommitFileRevision {
    fn name(&self) -> &str {
        self.path.file_name()
    }

    fn uri(&self) -> RevisionUri {
        RevisionUri::new(self.commit.id().clone(), self.path.clone())
    }

    fn exists(&self) -> Result<bool, RepoError> {
        if let Some(exists) = self.exists.get() {
            return Ok(*exists);
        }
        let found = self
            .commit
            .entry_at(&self.path)?
            .is_some_and(|entry| entry.kind.is_readable());
        Ok(*self.exists.get_or_init(|| found))
    }

    fn author(&self) -> &str {
        self.commit.author()
    }

    fn comment(&self) -> &str {
        self.commit.comment()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.commit.timestamp()
    }

    fn content_identifier(&self) -> &ContentId {
        self.commit.id()
    }

    /// Commit metadata is complete from construction.
    fn is_property_missing(&self) -> bool {
        false
    }

    fn with_all_properties(&self, _cancel: Option<&CancellationToken>) -> &Self {
        self
    }

    fn storage(&self) -> Result<Box<dyn Storage + '_>, RepoError> {
        let bytes = self.content()?;
        Ok(Box::new(RevisionStorage {
            path: &self.path,
            bytes,
        }))
    }
}

impl PartialEq for CommitFileRevision {
    fn eq(&self, other: &Self) -> bool {
        self.commit.id() == other.commit.id() && self.path == other.path
    }
}

impl Eq for CommitFileRevision {}

impl Hash for CommitFileRevision {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.commit.id().hash(state);
        self.path.hash(state);
    }
}

struct RevisionStorage<'a> {
    path: &'a RepoPath,
    bytes: &'a [u8],
}

impl Storage for RevisionStorage<'_> {
    fn name(&self) -> &str {
        self.path.file_name()
    }

    fn full_path(&self) -> &RepoPath {
        self.path
    }

    fn bytes(&self) -> &[u8] {
        self.bytes
    }
}
