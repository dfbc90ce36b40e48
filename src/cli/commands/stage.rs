//! stage / unstage commands - Move paths in and out of the index

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::status::ChangeKind;
use crate::error::RepoError;
use crate::ui::output;

use super::parse_paths;

/// Stage paths, or every change with `--all`.
pub fn stage(ctx: &Context, paths: &[String], all: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    let index = repo.index();

    let result = if all {
        index.refresh().context("Failed to read repository status")?;
        let selection: Vec<_> = index
            .changed_files()
            .into_iter()
            .filter(|c| c.has_unstaged_changes || c.kind == ChangeKind::Conflicted)
            .collect();
        if selection.is_empty() {
            output::print("nothing to stage", ctx.verbosity());
            return Ok(());
        }
        index.stage_files(&selection)
    } else {
        if paths.is_empty() {
            bail!("No paths given. Pass paths or --all.");
        }
        index.stage_paths(&parse_paths(ctx, &repo, paths)?)
    };

    report("stage", result)
}

/// Unstage paths, or every staged path with `--all`.
pub fn unstage(ctx: &Context, paths: &[String], all: bool) -> Result<()> {
    let repo = ctx.open_repo()?;
    let index = repo.index();

    let result = if all {
        index.refresh().context("Failed to read repository status")?;
        let selection = index.staged_files();
        if selection.is_empty() {
            output::print("nothing to unstage", ctx.verbosity());
            return Ok(());
        }
        index.unstage_files(&selection)
    } else {
        if paths.is_empty() {
            bail!("No paths given. Pass paths or --all.");
        }
        index.unstage_paths(&parse_paths(ctx, &repo, paths)?)
    };

    report("unstage", result)
}

/// Print per-path failures, then fail if there were any.
fn report(verb: &str, result: Result<(), RepoError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if !err.path_failures().is_empty() => {
            for failure in err.path_failures() {
                output::error(format!("cannot {verb} {failure}"));
            }
            bail!("{} path(s) could not be {verb}d", err.path_failures().len())
        }
        Err(err) => Err(err).with_context(|| format!("Failed to {verb}")),
    }
}
