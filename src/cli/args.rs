//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// gitstate - inspect and drive a repository's working tree, index, and history
#[derive(Parser, Debug)]
#[command(name = "gst")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gst was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a repository, or reopen an existing one
    #[command(
        name = "init",
        after_help = "\
WORKFLOW EXAMPLES:
    # Initialize the current directory
    gst init

    # Initialize a new directory
    gst init ../scratch"
    )]
    Init {
        /// Directory to initialize (default: current directory)
        path: Option<PathBuf>,
    },

    /// Show what changed in the working tree and index
    #[command(
        name = "status",
        long_about = "Show the change set between HEAD, the index, and the working tree.\n\n\
            Each line shows a two-character code and a path. The left column is the \
            staged side, the right column the working tree side. A trailing '+' marks \
            a staged path with further unstaged edits."
    )]
    Status {
        /// Emit JSON
        #[arg(long)]
        json: bool,

        /// Hide untracked files
        #[arg(long)]
        no_untracked: bool,
    },

    /// Stage paths for the next commit
    #[command(
        name = "stage",
        after_help = "\
WORKFLOW EXAMPLES:
    # Stage two files
    gst stage src/main.rs README.md

    # Stage every change, including deletions
    gst stage --all"
    )]
    Stage {
        /// Paths, relative to the current directory
        paths: Vec<String>,

        /// Stage every changed path
        #[arg(long, short, conflicts_with = "paths")]
        all: bool,
    },

    /// Restore index entries from HEAD
    #[command(name = "unstage")]
    Unstage {
        /// Paths, relative to the current directory
        paths: Vec<String>,

        /// Unstage every staged path
        #[arg(long, short, conflicts_with = "paths")]
        all: bool,
    },

    /// Commit the index and advance HEAD
    #[command(name = "commit")]
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show commit history, optionally for one path
    #[command(
        name = "log",
        after_help = "\
WORKFLOW EXAMPLES:
    # Recent history
    gst log -n 10

    # History of one file
    gst log --path src/lib.rs

    # History of a file on another branch, as JSON
    gst log topic --path README.md --json"
    )]
    Log {
        /// Revision to start from (default: HEAD)
        rev: Option<String>,

        /// Only commits that change this path (relative to the current directory)
        #[arg(long)]
        path: Option<String>,

        /// Maximum number of commits
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a file as of a revision
    #[command(name = "show")]
    Show {
        /// Revision (id, ref, or HEAD)
        rev: String,

        /// Path, relative to the current directory
        path: String,
    },

    /// Get, set, or list configuration values
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash
    gst completion bash > ~/.local/share/bash-completion/completions/gst

    # Zsh
    gst completion zsh > ~/.zfunc/_gst"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key, e.g. identity.name
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key, e.g. identity.name
        key: String,
        /// Value to set
        value: String,

        /// Write the global config instead of the repository config
        #[arg(long)]
        global: bool,
    },
    /// List all effective configuration values
    List,
}

/// Shells supported by `gst completion`.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_log_flags() {
        let cli = Cli::try_parse_from(["gst", "log", "topic", "--path", "a.txt", "-n", "3"]).unwrap();
        match cli.command {
            Command::Log {
                rev, path, limit, ..
            } => {
                assert_eq!(rev.as_deref(), Some("topic"));
                assert_eq!(path.as_deref(), Some("a.txt"));
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn stage_all_conflicts_with_paths() {
        assert!(Cli::try_parse_from(["gst", "stage", "--all", "a.txt"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gst", "status", "--quiet", "--debug"]).unwrap();
        assert!(cli.quiet);
        assert!(cli.debug);
    }
}
