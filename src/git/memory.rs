//! git::memory
//!
//! In-memory [`Backend`] for tests and for hosts that model repositories
//! without a disk.
//!
//! The backend keeps a working tree, an index, and a commit store in one
//! mutex-guarded state. Object ids are SHA-256 digests of the content they
//! name, so identical trees and blobs share ids just as they do in git.
//!
//! Commit timestamps come from a logical clock that advances one minute
//! per commit, which keeps history ordering deterministic in tests.
//!
//! # Example
//!
//! ```
//! use gitstate::git::{Backend, MemoryBackend};
//! use gitstate::core::types::RepoPath;
//!
//! let backend = MemoryBackend::new();
//! backend.write_file("a.txt", b"hello").unwrap();
//! let path = RepoPath::new("a.txt").unwrap();
//! assert!(backend.stage(&[path]).unwrap().is_empty());
//! let id = backend.commit("first", None).unwrap();
//! assert_eq!(backend.resolve_reference("HEAD").unwrap(), id);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::DateTime;
use sha2::{Digest, Sha256};

use super::{
    subject_of, Backend, BackendError, CommitMetadata, EntryKind, Identity, PathEntry,
    PathFailure,
};
use crate::core::paths::StatePaths;
use crate::core::status::{ChangeKind, ChangedFile};
use crate::core::types::{ContentId, RepoPath};

/// Epoch seconds of the first commit written by a fresh backend.
const CLOCK_START: i64 = 1_700_000_000;
const CLOCK_STEP: i64 = 60;
const DEFAULT_BRANCH: &str = "refs/heads/main";

type Tree = BTreeMap<RepoPath, ContentId>;

#[derive(Debug, Clone)]
struct StoredCommit {
    metadata: CommitMetadata,
    tree: Tree,
}

#[derive(Debug)]
struct State {
    worktree: BTreeMap<RepoPath, Vec<u8>>,
    index: Tree,
    conflicts: BTreeSet<RepoPath>,
    blobs: HashMap<ContentId, Vec<u8>>,
    commits: HashMap<ContentId, StoredCommit>,
    refs: BTreeMap<String, ContentId>,
    /// Branch HEAD points at.
    head: String,
    clock: i64,
    identity: Option<Identity>,
}

/// A complete repository held in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    work_dir: PathBuf,
    state: Mutex<State>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn digest(parts: &[&[u8]]) -> Result<ContentId, BackendError> {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
        hasher.update([0u8]);
    }
    Ok(ContentId::new(hex::encode(hasher.finalize()))?)
}

fn blob_id(bytes: &[u8]) -> Result<ContentId, BackendError> {
    digest(&[b"blob", bytes])
}

impl MemoryBackend {
    /// An empty repository on an unborn `main` branch, with a default
    /// author identity.
    pub fn new() -> Self {
        Self::with_work_dir("/memory")
    }

    /// Like [`MemoryBackend::new`], reporting `work_dir` as the root.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            state: Mutex::new(State {
                worktree: BTreeMap::new(),
                index: Tree::new(),
                conflicts: BTreeSet::new(),
                blobs: HashMap::new(),
                commits: HashMap::new(),
                refs: BTreeMap::new(),
                head: DEFAULT_BRANCH.to_string(),
                clock: CLOCK_START,
                identity: Some(Identity::new("Memory Author", "memory@example.com")),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the identity used when a commit names no author.
    pub fn set_identity(&self, identity: Option<Identity>) {
        self.state().identity = identity;
    }

    /// Write a file into the working tree.
    pub fn write_file(&self, path: &str, contents: &[u8]) -> Result<(), BackendError> {
        let path = RepoPath::new(path)?;
        self.state().worktree.insert(path, contents.to_vec());
        Ok(())
    }

    /// Delete a file from the working tree. Returns whether it existed.
    pub fn remove_file(&self, path: &str) -> Result<bool, BackendError> {
        let path = RepoPath::new(path)?;
        Ok(self.state().worktree.remove(&path).is_some())
    }

    /// Record an unmerged index entry for `path`.
    pub fn mark_conflicted(&self, path: &str) -> Result<(), BackendError> {
        let path = RepoPath::new(path)?;
        self.state().conflicts.insert(path);
        Ok(())
    }

    /// Write a commit with the given parents and full file list, without
    /// touching HEAD, the index, or the working tree.
    pub fn commit_snapshot(
        &self,
        parents: &[ContentId],
        files: &[(&str, &[u8])],
        message: &str,
    ) -> Result<ContentId, BackendError> {
        let mut state = self.state();
        for parent in parents {
            if !state.commits.contains_key(parent) {
                return Err(BackendError::NotFound {
                    what: parent.to_string(),
                });
            }
        }
        let mut tree = Tree::new();
        for (path, contents) in files {
            let id = blob_id(contents)?;
            state.blobs.insert(id.clone(), contents.to_vec());
            tree.insert(RepoPath::new(*path)?, id);
        }
        let author = state
            .identity
            .clone()
            .ok_or_else(|| BackendError::MissingIdentity {
                message: "memory backend has no identity".into(),
            })?;
        state.write_commit(tree, parents.to_vec(), &author, message)
    }

    /// Point the current branch at `id`.
    pub fn set_head(&self, id: &ContentId) -> Result<(), BackendError> {
        let mut state = self.state();
        state.require_commit(id)?;
        let branch = state.head.clone();
        state.refs.insert(branch, id.clone());
        Ok(())
    }

    /// Create or move a reference, e.g. `refs/heads/topic`.
    pub fn set_ref(&self, name: &str, id: &ContentId) -> Result<(), BackendError> {
        let mut state = self.state();
        state.require_commit(id)?;
        state.refs.insert(name.to_string(), id.clone());
        Ok(())
    }
}

impl State {
    fn require_commit(&self, id: &ContentId) -> Result<&StoredCommit, BackendError> {
        self.commits.get(id).ok_or_else(|| BackendError::NotFound {
            what: id.to_string(),
        })
    }

    fn head_id(&self) -> Option<ContentId> {
        self.refs.get(&self.head).cloned()
    }

    fn head_tree(&self) -> Tree {
        self.head_id()
            .and_then(|id| self.commits.get(&id))
            .map(|c| c.tree.clone())
            .unwrap_or_default()
    }

    /// Store a commit and advance the clock. Leaves refs alone.
    fn write_commit(
        &mut self,
        tree: Tree,
        parents: Vec<ContentId>,
        author: &Identity,
        message: &str,
    ) -> Result<ContentId, BackendError> {
        let timestamp = self.clock;
        self.clock += CLOCK_STEP;

        let mut listing = String::new();
        for (path, id) in &tree {
            listing.push_str(&format!("{id} {path}\n"));
        }
        let parent_list = parents
            .iter()
            .map(ContentId::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        let id = digest(&[
            b"commit",
            listing.as_bytes(),
            parent_list.as_bytes(),
            author.to_string().as_bytes(),
            timestamp.to_string().as_bytes(),
            message.as_bytes(),
        ])?;

        let metadata = CommitMetadata {
            author_name: author.name.clone(),
            author_email: author.email.clone(),
            timestamp: DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::UNIX_EPOCH),
            subject: subject_of(message),
            comment: message.to_string(),
            parents,
        };
        self.commits
            .insert(id.clone(), StoredCommit { metadata, tree });
        Ok(id)
    }

    fn resolve_base(&self, expr: &str) -> Option<ContentId> {
        if expr == "HEAD" {
            return self.head_id();
        }
        for candidate in [
            expr.to_string(),
            format!("refs/heads/{expr}"),
            format!("refs/tags/{expr}"),
        ] {
            if let Some(id) = self.refs.get(&candidate) {
                return Some(id.clone());
            }
        }
        if ContentId::is_hex_prefix(expr) && expr.len() >= 4 {
            let needle = expr.to_ascii_lowercase();
            let mut matches = self
                .commits
                .keys()
                .filter(|id| id.as_str().starts_with(&needle));
            let first = matches.next()?;
            if matches.next().is_none() {
                return Some(first.clone());
            }
        }
        None
    }

    /// Resolve `base`, then apply trailing `^`, `^N` and `~N` steps.
    fn resolve(&self, expr: &str) -> Option<ContentId> {
        let split = expr.find(['^', '~']).unwrap_or(expr.len());
        let (base, mut rest) = expr.split_at(split);
        let mut id = self.resolve_base(base)?;

        while let Some(op) = rest.chars().next() {
            rest = &rest[op.len_utf8()..];
            // ASCII digits are one byte each, so the count is a byte offset.
            let digits = rest.chars().take_while(char::is_ascii_digit).count();
            let count = if digits == 0 {
                1
            } else {
                rest[..digits].parse::<usize>().ok()?
            };
            rest = &rest[digits..];

            match op {
                '^' if count == 0 => {}
                '^' => {
                    id = self.commits.get(&id)?.metadata.parents.get(count - 1)?.clone();
                }
                '~' => {
                    for _ in 0..count {
                        id = self.commits.get(&id)?.metadata.parents.first()?.clone();
                    }
                }
                _ => return None,
            }
        }
        Some(id)
    }

    fn entry_in(&self, tree: &Tree, path: &RepoPath) -> Result<Option<PathEntry>, BackendError> {
        if let Some(id) = tree.get(path) {
            return Ok(Some(PathEntry {
                id: id.clone(),
                kind: EntryKind::File,
            }));
        }
        let prefix = format!("{path}/");
        let mut listing = String::new();
        for (child, id) in tree.range(path.clone()..) {
            let Some(rest) = child.as_str().strip_prefix(&prefix) else {
                if child.as_str() > prefix.as_str() {
                    break;
                }
                continue;
            };
            listing.push_str(&format!("{id} {rest}\n"));
        }
        if listing.is_empty() {
            return Ok(None);
        }
        Ok(Some(PathEntry {
            id: digest(&[b"tree", listing.as_bytes()])?,
            kind: EntryKind::Directory,
        }))
    }
}

impl Backend for MemoryBackend {
    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn state_paths(&self) -> Option<StatePaths> {
        None
    }

    fn resolve_reference(&self, expr: &str) -> Result<ContentId, BackendError> {
        self.state()
            .resolve(expr)
            .ok_or_else(|| BackendError::NotFound {
                what: expr.to_string(),
            })
    }

    fn list_changes(&self, include_untracked: bool) -> Result<Vec<ChangedFile>, BackendError> {
        let state = self.state();
        let head = state.head_tree();

        let mut paths: BTreeSet<&RepoPath> = BTreeSet::new();
        paths.extend(head.keys());
        paths.extend(state.index.keys());
        paths.extend(state.worktree.keys());
        paths.extend(state.conflicts.iter());

        let mut changes = Vec::new();
        for path in paths {
            let in_head = head.get(path);
            let in_index = state.index.get(path);
            let on_disk = match state.worktree.get(path) {
                Some(bytes) => Some(blob_id(bytes)?),
                None => None,
            };

            let index_side = match (in_head, in_index) {
                (None, Some(_)) => Some(ChangeKind::StagedAdded),
                (Some(h), Some(i)) if h != i => Some(ChangeKind::StagedModified),
                (Some(_), None) => Some(ChangeKind::StagedDeleted),
                _ => None,
            };
            let worktree_side = match (in_index, on_disk.as_ref()) {
                (None, Some(_)) if include_untracked => Some(ChangeKind::Untracked),
                (Some(i), Some(w)) if i != w => Some(ChangeKind::Modified),
                (Some(_), None) => Some(ChangeKind::Deleted),
                _ => None,
            };

            changes.extend(ChangedFile::reconcile(
                path.clone(),
                index_side,
                worktree_side,
                state.conflicts.contains(path),
            ));
        }
        Ok(changes)
    }

    fn stage(&self, paths: &[RepoPath]) -> Result<Vec<PathFailure>, BackendError> {
        let mut state = self.state();
        let mut failures = Vec::new();
        for path in paths {
            if let Some(bytes) = state.worktree.get(path).cloned() {
                let id = blob_id(&bytes)?;
                state.blobs.insert(id.clone(), bytes);
                state.index.insert(path.clone(), id);
                state.conflicts.remove(path);
            } else if state.index.contains_key(path) || state.conflicts.contains(path) {
                state.index.remove(path);
                state.conflicts.remove(path);
            } else {
                failures.push(PathFailure::new(
                    path.clone(),
                    "path does not exist in the working tree or the index",
                ));
            }
        }
        Ok(failures)
    }

    fn unstage(&self, paths: &[RepoPath]) -> Result<Vec<PathFailure>, BackendError> {
        let mut state = self.state();
        let head = state.head_tree();
        let mut failures = Vec::new();
        for path in paths {
            if let Some(id) = head.get(path) {
                state.index.insert(path.clone(), id.clone());
            } else if state.index.contains_key(path) {
                state.index.remove(path);
            } else {
                failures.push(PathFailure::new(
                    path.clone(),
                    "path is not in the index or HEAD",
                ));
                continue;
            }
            state.conflicts.remove(path);
        }
        Ok(failures)
    }

    fn commit(&self, message: &str, author: Option<&Identity>) -> Result<ContentId, BackendError> {
        let mut state = self.state();
        if !state.conflicts.is_empty() {
            return Err(BackendError::UnresolvedConflicts);
        }

        let parent = state.head_id();
        let unchanged = match &parent {
            Some(_) => state.head_tree() == state.index,
            None => state.index.is_empty(),
        };
        if unchanged {
            return Err(BackendError::NothingToCommit);
        }

        let author = author
            .cloned()
            .or_else(|| state.identity.clone())
            .ok_or_else(|| BackendError::MissingIdentity {
                message: "no author configured".into(),
            })?;

        let tree = state.index.clone();
        let id = state.write_commit(tree, parent.into_iter().collect(), &author, message)?;
        let branch = state.head.clone();
        state.refs.insert(branch, id.clone());
        Ok(id)
    }

    fn read_commit_metadata(&self, id: &ContentId) -> Result<CommitMetadata, BackendError> {
        Ok(self.state().require_commit(id)?.metadata.clone())
    }

    fn entry_at(&self, id: &ContentId, path: &RepoPath) -> Result<Option<PathEntry>, BackendError> {
        let state = self.state();
        let commit = state.require_commit(id)?;
        state.entry_in(&commit.tree, path)
    }

    fn read_path_at(&self, id: &ContentId, path: &RepoPath) -> Result<Option<Vec<u8>>, BackendError> {
        let state = self.state();
        let commit = state.require_commit(id)?;
        Ok(commit
            .tree
            .get(path)
            .and_then(|blob| state.blobs.get(blob))
            .cloned())
    }
}
