//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the repository model
//! 3. Formats and displays output
//!
//! Errors are returned as `anyhow::Error` with context naming the step
//! that failed; `main` prints the chain.

mod commit;
mod completion;
mod config_cmd;
mod init;
mod log_cmd;
mod show;
mod stage;
mod status;

// Re-export command functions for testing and direct invocation
pub use commit::commit;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use init::init;
pub use log_cmd::log;
pub use show::show;
pub use stage::{stage, unstage};
pub use status::status;

use anyhow::Result;

use crate::cli::args::{Command, ConfigAction};
use crate::cli::Context;
use crate::core::types::RepoPath;
use crate::repo::Repository;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { path } => init::init(ctx, path.as_deref()),
        Command::Status { json, no_untracked } => status::status(ctx, json, no_untracked),
        Command::Stage { paths, all } => stage::stage(ctx, &paths, all),
        Command::Unstage { paths, all } => stage::unstage(ctx, &paths, all),
        Command::Commit { message } => commit::commit(ctx, &message),
        Command::Log {
            rev,
            path,
            limit,
            json,
        } => log_cmd::log(ctx, rev.as_deref(), path.as_deref(), limit, json),
        Command::Show { rev, path } => show::show(ctx, &rev, &path),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value, global } => {
                config_cmd::set(ctx, &key, &value, global)
            }
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Parse command-line path arguments, relative to the working directory,
/// into repository paths.
fn parse_paths(ctx: &Context, repo: &Repository, raw: &[String]) -> Result<Vec<RepoPath>> {
    raw.iter().map(|p| ctx.repo_path(repo, p)).collect()
}
