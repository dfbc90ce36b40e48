//! repo::rev_list
//!
//! Ordered commit history, optionally filtered to one path.
//!
//! # Algorithm
//!
//! A walk runs in two passes over an explicit stack, never recursing:
//!
//! 1. **Discover**: load every commit reachable from the start point and
//!    count, for each commit, how many reachable children point at it.
//! 2. **Emit**: start from the tip. A commit is emitted, then each parent
//!    whose last remaining child has now been emitted becomes ready.
//!    Parents are readied in reverse so the first parent is processed
//!    next, giving first-parent-major topological order.
//!
//! A commit is therefore never emitted before any of its children, and
//! parent order is taken exactly as the backend reports it.
//!
//! With a path filter, a commit is kept only if its entry at the path
//! differs from the entry in every parent (or, for a root commit, the path
//! exists). The comparison is delegated to the backend.
//!
//! # Cancellation
//!
//! The cancellation token is checked once per commit node in both passes.
//! A cancelled walk keeps the commits emitted so far and reports
//! [`WalkStatus::Cancelled`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::types::{ContentId, RepoPath};
use crate::error::RepoError;
use crate::git::{Backend, BackendError};
use crate::repo::commit::Commit;

/// Which history to walk: a start point and an optional path filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevSpecifier {
    reference: Option<String>,
    path: Option<RepoPath>,
}

impl RevSpecifier {
    /// All history reachable from HEAD.
    pub fn head() -> Self {
        Self::default()
    }

    /// History of `path`, starting at HEAD.
    pub fn for_path(path: RepoPath) -> Self {
        Self {
            reference: None,
            path: Some(path),
        }
    }

    /// All history reachable from `expr`.
    pub fn reference(expr: impl Into<String>) -> Self {
        Self {
            reference: Some(expr.into()),
            path: None,
        }
    }

    /// Restrict to commits touching `path`.
    pub fn with_path(mut self, path: RepoPath) -> Self {
        self.path = Some(path);
        self
    }

    /// Parse `"<rev>"`, `"<rev> -- <path>"`, or `"-- <path>"`.
    ///
    /// An empty revision means HEAD. The separator is a standalone `--`
    /// token, so ref names such as `release--1.0` stay whole.
    pub fn parse(text: &str) -> Result<Self, RepoError> {
        let text = text.trim();
        let (rev, path) = if text == "--" {
            ("", None)
        } else if let Some(path) = text.strip_prefix("-- ") {
            ("", Some(path))
        } else if let Some((rev, path)) = text.split_once(" -- ") {
            (rev, Some(path))
        } else if let Some(rev) = text.strip_suffix(" --") {
            (rev, None)
        } else {
            (text, None)
        };
        let rev = rev.trim();
        let path = path.map(str::trim);

        let mut spec = if rev.is_empty() {
            Self::head()
        } else {
            Self::reference(rev)
        };
        if let Some(path) = path {
            spec = spec.with_path(RepoPath::new(path)?);
        }
        Ok(spec)
    }

    /// The start expression, `HEAD` if none was given.
    pub fn reference_expr(&self) -> &str {
        self.reference.as_deref().unwrap_or("HEAD")
    }

    pub fn path(&self) -> Option<&RepoPath> {
        self.path.as_ref()
    }
}

impl std::fmt::Display for RevSpecifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} -- {}", self.reference_expr(), path),
            None => f.write_str(self.reference_expr()),
        }
    }
}

/// Cooperative cancellation flag, shared between a walk and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    /// Every matching commit up to the limit was produced.
    Complete,
    /// The walk stopped early; the results are a prefix.
    Cancelled,
}

impl WalkStatus {
    pub fn is_complete(self) -> bool {
        self == WalkStatus::Complete
    }
}

/// Walks commit history and holds the last result.
#[derive(Debug)]
pub struct HistoryWalker {
    backend: Arc<dyn Backend>,
    commits: Vec<Commit>,
}

impl HistoryWalker {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            commits: Vec::new(),
        }
    }

    /// The commits from the last walk. Empty before the first walk.
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Consume the walker, keeping its last result.
    pub fn into_commits(self) -> Vec<Commit> {
        self.commits
    }

    /// Walk the history described by `spec`, keeping at most `limit`
    /// commits (`None` for all).
    ///
    /// Replaces the previous result, even on error. Walking the implicit
    /// HEAD of an unborn branch completes with no commits.
    ///
    /// # Errors
    ///
    /// - [`RepoError::UnresolvedReference`] if an explicit start point does not resolve
    /// - Backend failures while reading commits or comparing paths
    pub fn walk(
        &mut self,
        spec: &RevSpecifier,
        limit: Option<usize>,
        cancel: Option<&CancellationToken>,
    ) -> Result<WalkStatus, RepoError> {
        self.commits.clear();
        let cancelled = || cancel.is_some_and(CancellationToken::is_cancelled);

        let expr = spec.reference_expr();
        let start_id = match self.backend.resolve_reference(expr) {
            Ok(id) => id,
            // Implicit HEAD on an unborn branch: no history yet.
            Err(BackendError::NotFound { .. }) if spec.reference.is_none() => {
                tracing::debug!(%spec, "HEAD is unborn, history is empty");
                return Ok(WalkStatus::Complete);
            }
            Err(BackendError::NotFound { .. }) => {
                return Err(RepoError::UnresolvedReference {
                    expr: expr.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        let start = Commit::from_id(Arc::clone(&self.backend), start_id)?;

        let Some((nodes, mut children)) = self.discover(&start, &cancelled)? else {
            tracing::debug!(%spec, "walk cancelled during discovery");
            return Ok(WalkStatus::Cancelled);
        };
        tracing::debug!(%spec, reachable = nodes.len(), "discovered history");

        if limit == Some(0) {
            return Ok(WalkStatus::Complete);
        }

        let mut ready = vec![start];
        while let Some(commit) = ready.pop() {
            if cancelled() {
                tracing::debug!(%spec, emitted = self.commits.len(), "walk cancelled");
                return Ok(WalkStatus::Cancelled);
            }

            for parent in commit.parents().iter().rev() {
                if let Some(count) = children.get_mut(parent) {
                    *count -= 1;
                    if *count == 0 {
                        if let Some(next) = nodes.get(parent) {
                            ready.push(next.clone());
                        }
                    }
                }
            }

            let keep = match spec.path() {
                Some(path) => commit.touches(path)?,
                None => true,
            };
            if keep {
                self.commits.push(commit);
                if limit.is_some_and(|max| self.commits.len() >= max) {
                    break;
                }
            }
        }

        tracing::debug!(%spec, emitted = self.commits.len(), "walk complete");
        Ok(WalkStatus::Complete)
    }

    /// Load all commits reachable from `start` and count their children.
    /// Returns `None` if cancelled.
    #[allow(clippy::type_complexity)]
    fn discover(
        &self,
        start: &Commit,
        cancelled: &impl Fn() -> bool,
    ) -> Result<Option<(HashMap<ContentId, Commit>, HashMap<ContentId, usize>)>, RepoError> {
        let mut nodes = HashMap::new();
        let mut children: HashMap<ContentId, usize> = HashMap::new();
        nodes.insert(start.id().clone(), start.clone());

        let mut stack = vec![start.clone()];
        while let Some(commit) = stack.pop() {
            if cancelled() {
                return Ok(None);
            }
            for parent in commit.parents() {
                *children.entry(parent.clone()).or_insert(0) += 1;
                if !nodes.contains_key(parent) {
                    let loaded = Commit::from_id(Arc::clone(&self.backend), parent.clone())?;
                    nodes.insert(parent.clone(), loaded.clone());
                    stack.push(loaded);
                }
            }
        }
        Ok(Some((nodes, children)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MemoryBackend;

    fn subjects(walker: &HistoryWalker) -> Vec<&str> {
        walker.commits().iter().map(Commit::subject).collect()
    }

    mod specifier {
        use super::*;

        #[test]
        fn parse_forms() {
            let spec = RevSpecifier::parse("main -- src/lib.rs").unwrap();
            assert_eq!(spec.reference_expr(), "main");
            assert_eq!(spec.path().map(RepoPath::as_str), Some("src/lib.rs"));

            let spec = RevSpecifier::parse("-- a.txt").unwrap();
            assert_eq!(spec.reference_expr(), "HEAD");
            assert!(spec.path().is_some());

            let spec = RevSpecifier::parse("HEAD~2").unwrap();
            assert_eq!(spec.reference_expr(), "HEAD~2");
            assert!(spec.path().is_none());

            let spec = RevSpecifier::parse("main --").unwrap();
            assert_eq!(spec.reference_expr(), "main");
            assert!(spec.path().is_none());
        }

        #[test]
        fn double_dash_inside_ref_name_is_kept() {
            let spec = RevSpecifier::parse("release--1.0").unwrap();
            assert_eq!(spec.reference_expr(), "release--1.0");
            assert!(spec.path().is_none());

            let spec = RevSpecifier::parse("release--1.0 -- notes--draft.md").unwrap();
            assert_eq!(spec.reference_expr(), "release--1.0");
            assert_eq!(spec.path().map(RepoPath::as_str), Some("notes--draft.md"));
        }

        #[test]
        fn parse_rejects_bad_path() {
            assert!(RevSpecifier::parse("HEAD -- ../escape").is_err());
        }

        #[test]
        fn display_round_trips() {
            let spec = RevSpecifier::for_path(RepoPath::new("a.txt").unwrap());
            assert_eq!(spec.to_string(), "HEAD -- a.txt");
            assert_eq!(RevSpecifier::parse(&spec.to_string()).unwrap(), spec);
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn empty_before_walk() {
            let walker = HistoryWalker::new(Arc::new(MemoryBackend::new()));
            assert!(walker.commits().is_empty());
        }

        #[test]
        fn merge_children_before_parents() {
            //   a -- b ------ m
            //    \          /
            //     c ------ d
            let backend = MemoryBackend::new();
            let a = backend.commit_snapshot(&[], &[("f", b"a")], "a").unwrap();
            let b = backend.commit_snapshot(&[a.clone()], &[("f", b"b")], "b").unwrap();
            let c = backend.commit_snapshot(&[a.clone()], &[("f", b"c")], "c").unwrap();
            let d = backend.commit_snapshot(&[c], &[("f", b"d")], "d").unwrap();
            let m = backend.commit_snapshot(&[b, d], &[("f", b"m")], "m").unwrap();
            backend.set_head(&m).unwrap();

            let mut walker = HistoryWalker::new(Arc::new(backend));
            let status = walker.walk(&RevSpecifier::head(), None, None).unwrap();
            assert!(status.is_complete());
            assert_eq!(subjects(&walker), vec!["m", "b", "d", "c", "a"]);
        }

        #[test]
        fn limit_caps_output() {
            let backend = MemoryBackend::new();
            let mut tip = backend.commit_snapshot(&[], &[("f", b"0")], "0").unwrap();
            for i in 1..5 {
                let body = i.to_string();
                tip = backend
                    .commit_snapshot(&[tip], &[("f", body.as_bytes())], &body)
                    .unwrap();
            }
            backend.set_head(&tip).unwrap();

            let mut walker = HistoryWalker::new(Arc::new(backend));
            walker.walk(&RevSpecifier::head(), Some(2), None).unwrap();
            assert_eq!(subjects(&walker), vec!["4", "3"]);

            walker.walk(&RevSpecifier::head(), Some(0), None).unwrap();
            assert!(walker.commits().is_empty());
        }
    }

    mod cancellation {
        use super::*;

        #[test]
        fn pre_cancelled_walk_is_empty() {
            let backend = MemoryBackend::new();
            let a = backend.commit_snapshot(&[], &[("f", b"a")], "a").unwrap();
            backend.set_head(&a).unwrap();

            let token = CancellationToken::new();
            token.cancel();
            let mut walker = HistoryWalker::new(Arc::new(backend));
            let status = walker
                .walk(&RevSpecifier::head(), None, Some(&token))
                .unwrap();
            assert_eq!(status, WalkStatus::Cancelled);
            assert!(walker.commits().is_empty());
        }
    }

    #[test]
    fn unborn_head_walks_empty() {
        let mut walker = HistoryWalker::new(Arc::new(MemoryBackend::new()));
        let status = walker
            .walk(&RevSpecifier::for_path(RepoPath::new("a.txt").unwrap()), None, None)
            .unwrap();
        assert!(status.is_complete());
        assert!(walker.commits().is_empty());

        let err = walker
            .walk(&RevSpecifier::reference("HEAD"), None, None)
            .unwrap_err();
        assert!(matches!(err, RepoError::UnresolvedReference { expr } if expr == "HEAD"));
    }

    #[test]
    fn unresolved_start_is_an_error() {
        let mut walker = HistoryWalker::new(Arc::new(MemoryBackend::new()));
        let err = walker
            .walk(&RevSpecifier::reference("nope"), None, None)
            .unwrap_err();
        assert!(matches!(err, RepoError::UnresolvedReference { expr } if expr == "nope"));
    }
}
