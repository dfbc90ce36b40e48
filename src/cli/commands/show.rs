//! show command - Print a file as of a revision

use std::io::Write;

use anyhow::{Context as _, Result};

use crate::cli::Context;

/// Write the bytes of `path` at `rev` to stdout.
pub fn show(ctx: &Context, rev: &str, path: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let commit = repo
        .commit(rev)
        .with_context(|| format!("Failed to resolve '{rev}'"))?;
    let path = ctx.repo_path(&repo, path)?;
    let revision = repo.file_revision(&commit, path.as_str())?;
    let bytes = revision
        .content()
        .with_context(|| format!("Failed to read {path} at {}", commit.id().short(7)))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()?;
    Ok(())
}
