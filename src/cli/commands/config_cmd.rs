//! config command - Get, set, or list configuration values

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config::{
    Config, GlobalConfig, HistoryConfig, IdentityConfig, LockConfig, RepoConfig, StatusConfig,
};
use crate::core::paths::StatePaths;
use crate::error::RepoError;
use crate::repo::Repository;
use crate::ui::output;

const KEYS: &[&str] = &[
    "identity.name",
    "identity.email",
    "status.include_untracked",
    "history.default_limit",
    "lock.enabled",
];

/// Load the effective config. Outside a repository only the global scope
/// is available.
fn load(ctx: &Context) -> Result<(Config, Option<StatePaths>)> {
    let cwd = ctx.cwd()?;
    match Repository::open(&cwd) {
        Ok(repo) => Ok((repo.config().clone(), repo.backend().state_paths())),
        Err(RepoError::NotARepository { .. }) => {
            let loaded = Config::load(None).context("Failed to load config")?;
            Ok((loaded.config, None))
        }
        Err(err) => Err(err).context("Failed to load config"),
    }
}

/// Effective value of `key`, or `None` if unset.
fn effective(config: &Config, key: &str) -> Result<Option<String>> {
    let identity = config.identity();
    let value = match key {
        "identity.name" => identity.map(|i| i.name),
        "identity.email" => identity.map(|i| i.email),
        "status.include_untracked" => Some(config.include_untracked().to_string()),
        "history.default_limit" => config.default_limit().map(|n| n.to_string()),
        "lock.enabled" => Some(config.lock_enabled().to_string()),
        _ => bail!("Unknown configuration key: {key}"),
    };
    Ok(value)
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let (config, _) = load(ctx)?;
    if let Some(value) = effective(&config, key)? {
        println!("{value}");
    }
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let (config, _) = load(ctx)?;

    if let Some(path) = config.global_config_loaded_from() {
        output::print(format!("# global: {}", path.display()), ctx.verbosity());
    }
    if let Some(path) = config.repo_config_loaded_from() {
        output::print(format!("# repo: {}", path.display()), ctx.verbosity());
    }
    for key in KEYS {
        let value = effective(&config, key)?.unwrap_or_else(|| "(not set)".to_string());
        println!("{key} = {value}");
    }
    Ok(())
}

/// Mutable view of the sections both config scopes share.
struct Sections<'a> {
    identity: &'a mut Option<IdentityConfig>,
    status: &'a mut Option<StatusConfig>,
    history: &'a mut Option<HistoryConfig>,
    lock: &'a mut Option<LockConfig>,
}

impl Sections<'_> {
    fn apply(self, key: &str, value: &str) -> Result<()> {
        match key {
            "identity.name" => {
                self.identity.get_or_insert_with(Default::default).name = Some(value.to_string())
            }
            "identity.email" => {
                self.identity.get_or_insert_with(Default::default).email = Some(value.to_string())
            }
            "status.include_untracked" => {
                self.status.get_or_insert_with(Default::default).include_untracked =
                    Some(parse_bool(key, value)?)
            }
            "history.default_limit" => {
                let limit = value
                    .parse::<usize>()
                    .with_context(|| format!("{key} must be a positive integer"))?;
                self.history.get_or_insert_with(Default::default).default_limit = Some(limit)
            }
            "lock.enabled" => {
                self.lock.get_or_insert_with(Default::default).enabled =
                    Some(parse_bool(key, value)?)
            }
            _ => bail!("Unknown configuration key: {key}"),
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => bail!("{key} must be true or false, got '{value}'"),
    }
}

/// Set a configuration value in the repo config, or the global config
/// with `--global`.
pub fn set(ctx: &Context, key: &str, value: &str, global: bool) -> Result<()> {
    let (config, paths) = load(ctx)?;

    let written = if global {
        let mut updated: GlobalConfig = config.global;
        let GlobalConfig {
            identity,
            status,
            history,
            lock,
        } = &mut updated;
        Sections {
            identity,
            status,
            history,
            lock,
        }
        .apply(key, value)?;
        updated.validate()?;
        Config::write_global(&updated).context("Failed to write global config")?
    } else {
        let Some(paths) = paths else {
            bail!("Not inside a repository. Use --global to set a global value.");
        };
        let mut updated: RepoConfig = config.repo.unwrap_or_default();
        let RepoConfig {
            identity,
            status,
            history,
            lock,
        } = &mut updated;
        Sections {
            identity,
            status,
            history,
            lock,
        }
        .apply(key, value)?;
        updated.validate()?;
        Config::write_repo(&paths, &updated).context("Failed to write repo config")?
    };

    output::print(
        format!("Set {key} = {value} in {}", written.display()),
        ctx.verbosity(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_values() {
        assert!(parse_bool("k", "true").unwrap());
        assert!(!parse_bool("k", "off").unwrap());
        assert!(parse_bool("k", "maybe").is_err());
    }

    #[test]
    fn apply_sets_nested_values() {
        let mut config = RepoConfig::default();
        let RepoConfig {
            identity,
            status,
            history,
            lock,
        } = &mut config;
        Sections {
            identity,
            status,
            history,
            lock,
        }
        .apply("history.default_limit", "25")
        .unwrap();
        assert_eq!(config.history.and_then(|h| h.default_limit), Some(25));
    }

    #[test]
    fn unknown_key_rejected() {
        let config = Config::default();
        assert!(effective(&config, "forge.name").is_err());
        assert_eq!(
            effective(&config, "lock.enabled").unwrap().as_deref(),
            Some("true")
        );
    }
}
