//! cli
//!
//! Command-line interface layer for gitstate.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Format results through [`crate::ui::output`]
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers open a [`Repository`] and call the
//! repository model; they do not talk to a backend themselves.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::{Component, Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::core::types::RepoPath;
use crate::repo::Repository;
use crate::ui::output::Verbosity;

/// Execution context shared by all command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory to run in (default: process cwd)
    pub cwd: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
}

impl Context {
    /// The directory commands operate on.
    pub fn cwd(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir().context("Failed to read current directory"),
        }
    }

    /// Open the repository containing the working directory.
    pub fn open_repo(&self) -> Result<Repository> {
        let cwd = self.cwd()?;
        Repository::open(&cwd)
            .with_context(|| format!("Failed to open repository at {}", cwd.display()))
    }

    /// Turn a path argument, relative to the working directory, into a
    /// repository path.
    ///
    /// The path itself need not exist, so deleted files can be named.
    pub fn repo_path(&self, repo: &Repository, raw: &str) -> Result<RepoPath> {
        let cwd = canonical(&self.cwd()?);
        let root = canonical(repo.working_directory());
        let absolute = normalize(&cwd.join(raw));

        let relative = absolute.strip_prefix(&root).with_context(|| {
            format!("'{raw}' is outside the repository at {}", root.display())
        })?;
        let relative = relative
            .to_str()
            .with_context(|| format!("'{raw}' is not valid UTF-8"))?;
        RepoPath::new(relative).with_context(|| format!("Invalid path '{raw}'"))
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve `.` and `..` lexically.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}
