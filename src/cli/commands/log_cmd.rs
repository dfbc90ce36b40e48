//! log command - Show commit history

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::repo::RevSpecifier;
use crate::ui::output::{self, CommitRecord};

/// Show history starting at `rev`, optionally filtered to `path`.
///
/// Without `-n`, the limit falls back to `history.default_limit`.
pub fn log(
    ctx: &Context,
    rev: Option<&str>,
    path: Option<&str>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let repo = ctx.open_repo()?;

    let mut spec = match rev {
        Some(rev) => RevSpecifier::reference(rev),
        None => RevSpecifier::head(),
    };
    if let Some(path) = path {
        spec = spec.with_path(ctx.repo_path(&repo, path)?);
    }
    let limit = limit.or_else(|| repo.config().default_limit());

    let mut walker = repo.rev_list();
    walker
        .walk(&spec, limit, None)
        .with_context(|| format!("Failed to walk history of {spec}"))?;

    if json {
        let records: Vec<CommitRecord<'_>> = walker.commits().iter().map(CommitRecord::from).collect();
        output::json(&records)?;
        return Ok(());
    }

    for commit in walker.commits() {
        println!("{}", output::format_commit_line(commit));
    }
    Ok(())
}
