//! init command - Create a repository, or reopen an existing one

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::repo::Repository;
use crate::ui::output;

/// Initialize a repository.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `path` - Directory to initialize, relative to the working directory
pub fn init(ctx: &Context, path: Option<&Path>) -> Result<()> {
    let cwd = ctx.cwd()?;
    let target = match path {
        Some(p) => cwd.join(p),
        None => cwd,
    };

    let repo = Repository::create(&target)
        .with_context(|| format!("Failed to initialize repository at {}", target.display()))?;

    output::print(
        format!(
            "Initialized repository in {}",
            repo.working_directory().display()
        ),
        ctx.verbosity(),
    );
    Ok(())
}
