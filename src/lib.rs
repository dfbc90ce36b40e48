//! gitstate - an in-process model of a Git repository's mutable state
//!
//! gitstate lets a host application query and drive a repository's working
//! tree, staging area, and history without re-parsing on-disk formats on
//! every call.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, calls the model)
//! - [`repo`] - Repository handle, staging area, commits, history, file revisions
//! - [`core`] - Domain types, change records, configuration, locking
//! - [`git`] - The backend boundary: all repository reads and writes
//! - [`error`] - The error kinds the model reports
//! - [`ui`] - Output formatting
//!
//! # Correctness Invariants
//!
//! gitstate maintains the following invariants:
//!
//! 1. A change snapshot never lists the same path twice
//! 2. Staging mutations on one repository are serialized
//! 3. Commits and file revisions resolve once and never change afterwards
//! 4. A path-filtered history only lists commits that change the path
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gitstate::core::config::Config;
//! use gitstate::git::MemoryBackend;
//! use gitstate::repo::{FileRevision, Repository};
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let repo = Repository::with_backend(backend.clone(), Config::default());
//!
//! backend.write_file("hello.txt", b"hello").unwrap();
//! repo.index().refresh().unwrap();
//! repo.index().stage_files(&repo.index().changed_files()).unwrap();
//! let commit = repo.index().commit("say hello").unwrap();
//!
//! let revision = repo.file_revision(&commit, "hello.txt").unwrap();
//! assert!(revision.exists().unwrap());
//! assert_eq!(revision.content().unwrap(), b"hello");
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod git;
pub mod repo;
pub mod ui;

pub use error::RepoError;
