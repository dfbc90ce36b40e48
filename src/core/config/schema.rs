//! core::config::schema
//!
//! Configuration schema types.
//!
//! Both scopes share the same shape; repo values override global ones
//! key by key.
//!
//! ```toml
//! [identity]
//! name = "Ada Lovelace"
//! email = "ada@example.com"
//!
//! [status]
//! include_untracked = true
//!
//! [history]
//! default_limit = 200
//!
//! [lock]
//! enabled = true
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    pub identity: Option<IdentityConfig>,
    pub status: Option<StatusConfig>,
    pub history: Option<HistoryConfig>,
    pub lock: Option<LockConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sections(self.identity.as_ref(), self.history.as_ref())
    }
}

/// Repository configuration, stored at `<git-dir>/gitstate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    pub identity: Option<IdentityConfig>,
    pub status: Option<StatusConfig>,
    pub history: Option<HistoryConfig>,
    pub lock: Option<LockConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sections(self.identity.as_ref(), self.history.as_ref())
    }
}

fn validate_sections(
    identity: Option<&IdentityConfig>,
    history: Option<&HistoryConfig>,
) -> Result<(), ConfigError> {
    if let Some(identity) = identity {
        identity.validate()?;
    }
    if let Some(HistoryConfig {
        default_limit: Some(0),
    }) = history
    {
        return Err(ConfigError::InvalidValue(
            "history.default_limit must be at least 1 (omit it for no limit)".into(),
        ));
    }
    Ok(())
}

/// Commit author identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl IdentityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "identity.name cannot be blank".into(),
                ));
            }
        }
        if let Some(email) = &self.email {
            if email.contains(['<', '>', '\n']) {
                return Err(ConfigError::InvalidValue(format!(
                    "identity.email contains invalid characters: {email}"
                )));
            }
        }
        Ok(())
    }
}

/// Status reconciliation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StatusConfig {
    /// Report untracked files (default: true)
    pub include_untracked: Option<bool>,
}

/// History walk settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Default maximum number of commits for `log` (default: unbounded)
    pub default_limit: Option<usize>,
}

/// Cross-process locking settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    /// Take the advisory repository lock around staging operations (default: true)
    pub enabled: Option<bool>,
}
