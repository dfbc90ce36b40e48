//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! gitstate has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$GITSTATE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitstate/config.toml`
//! 3. `~/.gitstate/config.toml` (canonical write location)
//!
//! # Repo Config Location
//!
//! `<common_dir>/gitstate/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use gitstate::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//! println!("untracked: {}", config.include_untracked());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, HistoryConfig, IdentityConfig, LockConfig, RepoConfig, StatusConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::paths::StatePaths;
use crate::git::Identity;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "GITSTATE_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence automatically: repo config overrides global
/// config, which overrides defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `paths` is provided, also loads the repository config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or
    /// fail validation. Missing files are not an error.
    pub fn load(paths: Option<&StatePaths>) -> Result<ConfigLoadResult, ConfigError> {
        let env = |key: &str| std::env::var(key).ok();
        Self::load_from(env, dirs::home_dir(), paths)
    }

    /// Load with explicit environment lookup and home directory.
    fn load_from(
        env: impl Fn(&str) -> Option<String>,
        home: Option<PathBuf>,
        paths: Option<&StatePaths>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = Self::load_global(&env, home.as_deref(), &mut warnings)?;
        let (repo, repo_path) = match paths {
            Some(paths) => Self::load_repo(paths)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path,
            },
            warnings,
        })
    }

    fn load_global(
        env: &impl Fn(&str) -> Option<String>,
        home: Option<&Path>,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        if let Some(path) = env(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_toml(&path)?;
                return Ok((config, Some(path)));
            }
            warnings.push(ConfigWarning {
                message: format!("{CONFIG_ENV} points to a missing file, ignoring it"),
                path,
            });
        }

        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitstate/config.toml");
            if path.exists() {
                let config = Self::read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Some(home) = home {
            let path = home.join(".gitstate/config.toml");
            if path.exists() {
                let config = Self::read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    fn load_repo(paths: &StatePaths) -> Result<(Option<RepoConfig>, Option<PathBuf>), ConfigError> {
        let path = paths.repo_config_path();
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_toml(&path)?;
        Ok((Some(config), Some(path)))
    }

    fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Canonical path for global config, `~/.gitstate/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".gitstate/config.toml"))
    }

    /// Write global config atomically.
    pub fn write_global(config: &GlobalConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::global_config_path()?;
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write repo config atomically.
    pub fn write_repo(paths: &StatePaths, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = paths.repo_config_path();
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write to a temp file in the same directory, then rename over the target.
    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let write_err = |e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        };
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Configured commit author, if both name and email resolve.
    ///
    /// Name and email are resolved independently, so a repo can override
    /// just the email of a global identity.
    pub fn identity(&self) -> Option<Identity> {
        let repo = self.repo.as_ref().and_then(|r| r.identity.as_ref());
        let global = self.global.identity.as_ref();

        let name = repo
            .and_then(|i| i.name.clone())
            .or_else(|| global.and_then(|i| i.name.clone()))?;
        let email = repo
            .and_then(|i| i.email.clone())
            .or_else(|| global.and_then(|i| i.email.clone()))?;

        Some(Identity::new(name, email))
    }

    /// Whether status reports untracked files. Defaults to `true`.
    pub fn include_untracked(&self) -> bool {
        self.repo
            .as_ref()
            .and_then(|r| r.status.as_ref())
            .and_then(|s| s.include_untracked)
            .or_else(|| {
                self.global
                    .status
                    .as_ref()
                    .and_then(|s| s.include_untracked)
            })
            .unwrap_or(true)
    }

    /// Default history walk limit. `None` means unbounded.
    pub fn default_limit(&self) -> Option<usize> {
        self.repo
            .as_ref()
            .and_then(|r| r.history.as_ref())
            .and_then(|h| h.default_limit)
            .or_else(|| self.global.history.as_ref().and_then(|h| h.default_limit))
    }

    /// Whether staging operations take the cross-process lock. Defaults to `true`.
    pub fn lock_enabled(&self) -> bool {
        self.repo
            .as_ref()
            .and_then(|r| r.lock.as_ref())
            .and_then(|l| l.enabled)
            .or_else(|| self.global.lock.as_ref().and_then(|l| l.enabled))
            .unwrap_or(true)
    }

    /// Build a config in code, without reading any file.
    pub fn from_parts(global: GlobalConfig, repo: Option<RepoConfig>) -> Self {
        Self {
            global,
            repo,
            global_path: None,
            repo_path: None,
        }
    }

    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn state_paths(temp: &TempDir) -> StatePaths {
        let git_dir = temp.path().join(".git");
        StatePaths::new(git_dir.clone(), git_dir)
    }

    #[test]
    fn load_empty_defaults() {
        let result = Config::load_from(no_env, None, None).unwrap();
        let config = result.config;

        assert!(config.identity().is_none());
        assert!(config.include_untracked());
        assert!(config.default_limit().is_none());
        assert!(config.lock_enabled());
        assert!(config.global_config_loaded_from().is_none());
    }

    #[test]
    fn load_global_from_env() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
            [status]
            include_untracked = false
            "#,
        )
        .unwrap();

        let path_str = config_path.to_string_lossy().into_owned();
        let env = move |key: &str| (key == CONFIG_ENV).then(|| path_str.clone());
        let result = Config::load_from(env, None, None).unwrap();

        assert!(!result.config.include_untracked());
        assert_eq!(
            result.config.global_config_loaded_from(),
            Some(config_path.as_path())
        );
    }

    #[test]
    fn missing_env_file_warns() {
        let env = |key: &str| (key == CONFIG_ENV).then(|| "/nonexistent/gitstate.toml".to_string());
        let result = Config::load_from(env, None, None).unwrap();
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn load_global_from_home() {
        let home = TempDir::new().unwrap();
        fs::create_dir_all(home.path().join(".gitstate")).unwrap();
        fs::write(
            home.path().join(".gitstate/config.toml"),
            "[history]\ndefault_limit = 10\n",
        )
        .unwrap();

        let result = Config::load_from(no_env, Some(home.path().to_path_buf()), None).unwrap();
        assert_eq!(result.config.default_limit(), Some(10));
    }

    #[test]
    fn load_repo_config() {
        let temp = TempDir::new().unwrap();
        let paths = state_paths(&temp);
        fs::create_dir_all(paths.state_dir()).unwrap();
        fs::write(
            paths.repo_config_path(),
            r#"
            [identity]
            name = "Repo User"
            email = "repo@example.com"

            [lock]
            enabled = false
            "#,
        )
        .unwrap();

        let result = Config::load_from(no_env, None, Some(&paths)).unwrap();
        let config = result.config;

        let identity = config.identity().unwrap();
        assert_eq!(identity.name, "Repo User");
        assert_eq!(identity.email, "repo@example.com");
        assert!(!config.lock_enabled());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn write_repo_config_atomic() {
        let temp = TempDir::new().unwrap();
        let paths = state_paths(&temp);

        let config = RepoConfig {
            history: Some(HistoryConfig {
                default_limit: Some(25),
            }),
            ..Default::default()
        };

        let path = Config::write_repo(&paths, &config).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());

        let loaded = Config::load_from(no_env, None, Some(&paths)).unwrap();
        assert_eq!(loaded.config.default_limit(), Some(25));
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        let paths = state_paths(&temp);
        fs::create_dir_all(paths.state_dir()).unwrap();
        fs::write(paths.repo_config_path(), "unknown_field = true\n").unwrap();

        let result = Config::load_from(no_env, None, Some(&paths));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn repo_overrides_global_per_key() {
        let config = Config {
            global: GlobalConfig {
                identity: Some(IdentityConfig {
                    name: Some("Global Name".into()),
                    email: Some("global@example.com".into()),
                }),
                status: Some(StatusConfig {
                    include_untracked: Some(false),
                }),
                ..Default::default()
            },
            repo: Some(RepoConfig {
                identity: Some(IdentityConfig {
                    name: None,
                    email: Some("repo@example.com".into()),
                }),
                status: Some(StatusConfig {
                    include_untracked: Some(true),
                }),
                ..Default::default()
            }),
            global_path: None,
            repo_path: None,
        };

        let identity = config.identity().unwrap();
        assert_eq!(identity.name, "Global Name");
        assert_eq!(identity.email, "repo@example.com");
        assert!(config.include_untracked());
    }

    #[test]
    fn partial_identity_is_none() {
        let config = Config {
            global: GlobalConfig {
                identity: Some(IdentityConfig {
                    name: Some("Only Name".into()),
                    email: None,
                }),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.identity().is_none());
    }
}
