//! commit command - Commit the index and advance HEAD

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::ui::output;

/// Commit the current index.
pub fn commit(ctx: &Context, message: &str) -> Result<()> {
    let repo = ctx.open_repo()?;
    let commit = repo
        .index()
        .commit(message)
        .context("Failed to commit")?;

    output::print(
        format!("[{}] {}", commit.id().short(7), commit.subject()),
        ctx.verbosity(),
    );
    Ok(())
}
