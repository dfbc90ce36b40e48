//! core::status
//!
//! Change records produced by reconciling HEAD, the index, and the
//! working tree.
//!
//! A backend compares two pairs of states for every path it knows about:
//! HEAD against the index (the staged side) and the index against the
//! working tree (the unstaged side). [`ChangedFile::reconcile`] folds both
//! comparisons into the single record the staging area exposes.

use serde::{Deserialize, Serialize};

use crate::core::types::RepoPath;

/// The kind of change recorded for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    /// Tracked with intent-to-add; no content staged yet.
    Added,
    /// Working tree content differs from the index.
    Modified,
    /// Present in the index, missing from the working tree.
    Deleted,
    /// Present in the working tree, unknown to the index.
    Untracked,
    /// Staged as a new file.
    StagedAdded,
    /// Staged content differs from HEAD.
    StagedModified,
    /// Staged for removal.
    StagedDeleted,
    /// Unmerged index entries. Blocks commit until resolved.
    Conflicted,
}

impl ChangeKind {
    /// True for the `Staged*` kinds.
    pub fn is_staged(self) -> bool {
        matches!(
            self,
            ChangeKind::StagedAdded | ChangeKind::StagedModified | ChangeKind::StagedDeleted
        )
    }

    /// Short status code, in the style of `git status --short`.
    pub fn code(self) -> &'static str {
        match self {
            ChangeKind::Added => " A",
            ChangeKind::Modified => " M",
            ChangeKind::Deleted => " D",
            ChangeKind::Untracked => "??",
            ChangeKind::StagedAdded => "A ",
            ChangeKind::StagedModified => "M ",
            ChangeKind::StagedDeleted => "D ",
            ChangeKind::Conflicted => "UU",
        }
    }

    /// Human-readable description.
    pub fn description(self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Untracked => "untracked",
            ChangeKind::StagedAdded => "staged-added",
            ChangeKind::StagedModified => "staged-modified",
            ChangeKind::StagedDeleted => "staged-deleted",
            ChangeKind::Conflicted => "conflicted",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// One path's entry in a staging-area snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the working directory root.
    pub path: RepoPath,
    /// The primary change for this path.
    pub kind: ChangeKind,
    /// Whether the change is in the index.
    pub staged: bool,
    /// Whether a staged path also has further working-tree edits.
    pub has_unstaged_changes: bool,
}

impl ChangedFile {
    /// Create a record with `staged` derived from `kind`.
    pub fn new(path: RepoPath, kind: ChangeKind) -> Self {
        Self {
            path,
            kind,
            staged: kind.is_staged(),
            has_unstaged_changes: !kind.is_staged() && kind != ChangeKind::Conflicted,
        }
    }

    /// Fold the staged and unstaged comparisons for one path into a record.
    ///
    /// Conflicts take precedence over everything. Otherwise the staged side
    /// becomes the record's kind and any worktree change is kept as
    /// `has_unstaged_changes`. Returns `None` for an unchanged path.
    pub fn reconcile(
        path: RepoPath,
        index_side: Option<ChangeKind>,
        worktree_side: Option<ChangeKind>,
        conflicted: bool,
    ) -> Option<Self> {
        if conflicted {
            return Some(Self::new(path, ChangeKind::Conflicted));
        }
        match (index_side, worktree_side) {
            (Some(staged), wt) => Some(Self {
                path,
                kind: staged,
                staged: true,
                has_unstaged_changes: wt.is_some(),
            }),
            (None, Some(wt)) => Some(Self::new(path, wt)),
            (None, None) => None,
        }
    }

    /// Whether the index holds a change for this path.
    pub fn has_staged_changes(&self) -> bool {
        self.staged
    }
}
