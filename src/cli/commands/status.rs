//! status command - Show the change set

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::{Config, StatusConfig};
use crate::repo::Repository;
use crate::ui::output;

/// Show the current change set.
///
/// `--no-untracked` overrides `status.include_untracked` for this call.
pub fn status(ctx: &Context, json: bool, no_untracked: bool) -> Result<()> {
    let repo = if no_untracked {
        let base = ctx.open_repo()?;
        let mut repo_config = base.config().repo.clone().unwrap_or_default();
        repo_config.status = Some(StatusConfig {
            include_untracked: Some(false),
        });
        let config = Config::from_parts(base.config().global.clone(), Some(repo_config));
        Repository::with_backend(base.backend().clone(), config)
    } else {
        ctx.open_repo()?
    };

    let index = repo.index();
    index.refresh().context("Failed to read repository status")?;
    let changes = index.changed_files();

    if json {
        output::json(&changes)?;
        return Ok(());
    }

    if changes.is_empty() {
        output::print("nothing to commit, working tree clean", ctx.verbosity());
        return Ok(());
    }
    for change in &changes {
        println!("{}", output::format_change(change));
    }
    if index.has_unresolved_conflicts() {
        output::warn("unresolved conflicts block commit", ctx.verbosity());
    }
    Ok(())
}
