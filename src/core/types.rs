//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ContentId`] - Content identifier of an immutable object (commit, blob, tree)
//! - [`RepoPath`] - Validated repository-relative file path
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so backends and callers never exchange a raw
//! string that has not been checked.
//!
//! # Examples
//!
//! ```
//! use gitstate::core::types::{ContentId, RepoPath};
//!
//! let id = ContentId::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let path = RepoPath::new("src/main.rs").unwrap();
//! assert_eq!(path.file_name(), "main.rs");
//!
//! assert!(ContentId::new("not-a-sha").is_err());
//! assert!(RepoPath::new("../escape").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid content identifier: {0}")]
    InvalidContentId(String),

    #[error("invalid repository path: {0}")]
    InvalidPath(String),
}

/// A content identifier (SHA-1 or SHA-256 hex digest).
///
/// Identifiers are normalized to lowercase, so two identifiers naming the
/// same object always compare equal.
///
/// # Example
///
/// ```
/// use gitstate::core::types::ContentId;
///
/// let id = ContentId::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(id.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(id.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Create a new validated content identifier.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidContentId` if the string is not a 40 or
    /// 64 character hex digest.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into().to_ascii_lowercase();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Check whether a string could be an abbreviated identifier.
    ///
    /// Used by backends that accept unique prefixes in revision expressions.
    pub fn is_hex_prefix(s: &str) -> bool {
        !s.is_empty() && s.len() <= 64 && s.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Get an abbreviated form of the identifier.
    ///
    /// Returns the first `len` characters, or the full identifier if `len`
    /// exceeds its length.
    pub fn short(&self, len: usize) -> &str {
        let end = len.min(self.0.len());
        &self.0[..end]
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        if id.len() != 40 && id.len() != 64 {
            return Err(TypeError::InvalidContentId(format!(
                "expected 40 or 64 hex characters, got {}",
                id.len()
            )));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidContentId(
                "content identifier must be hexadecimal".into(),
            ));
        }
        Ok(())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated repository-relative path.
///
/// Paths always use `/` as the separator and are relative to the working
/// directory root:
/// - Cannot be empty
/// - Cannot be absolute
/// - Cannot contain `.` or `..` components, or empty components
/// - Cannot contain NUL bytes
///
/// Backslashes are normalized to `/` so paths built on Windows compare
/// equal to the ones the backend reports.
///
/// # Example
///
/// ```
/// use gitstate::core::types::RepoPath;
///
/// let path = RepoPath::new("docs\\guide.md").unwrap();
/// assert_eq!(path.as_str(), "docs/guide.md");
///
/// assert!(RepoPath::new("").is_err());
/// assert!(RepoPath::new("/etc/passwd").is_err());
/// assert!(RepoPath::new("a//b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoPath(String);

impl RepoPath {
    /// Create a new validated path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` if the path is not a clean relative path.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into().replace('\\', "/");
        Self::validate(&path)?;
        Ok(Self(path))
    }

    fn validate(path: &str) -> Result<(), TypeError> {
        if path.is_empty() {
            return Err(TypeError::InvalidPath("path cannot be empty".into()));
        }
        let bytes = path.as_bytes();
        let drive_letter = bytes.len() >= 2
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes.len() == 2 || bytes[2] == b'/');
        if path.starts_with('/') || drive_letter {
            return Err(TypeError::InvalidPath(format!(
                "path must be relative: {path}"
            )));
        }
        if path.contains('\0') {
            return Err(TypeError::InvalidPath(
                "path cannot contain NUL bytes".into(),
            ));
        }
        for component in path.split('/') {
            match component {
                "" => {
                    return Err(TypeError::InvalidPath(format!(
                        "path has an empty component: {path}"
                    )))
                }
                "." | ".." => {
                    return Err(TypeError::InvalidPath(format!(
                        "path cannot contain '{component}': {path}"
                    )))
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The last component of the path.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the path as a `std::path::Path` relative to the working directory.
    pub fn as_path(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl TryFrom<String> for RepoPath {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for RepoPath {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RepoPath> for String {
    fn from(path: RepoPath) -> Self {
        path.0
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod content_id {
        use super::*;

        #[test]
        fn accepts_sha1_and_sha256() {
            assert!(ContentId::new("a".repeat(40)).is_ok());
            assert!(ContentId::new("b".repeat(64)).is_ok());
        }

        #[test]
        fn normalizes_to_lowercase() {
            let id = ContentId::new("ABCDEF".repeat(6) + "ABCD").unwrap();
            assert_eq!(id.as_str(), "abcdef".repeat(6) + "abcd");
        }

        #[test]
        fn rejects_wrong_length() {
            assert!(matches!(
                ContentId::new("abc123"),
                Err(TypeError::InvalidContentId(_))
            ));
        }

        #[test]
        fn rejects_non_hex() {
            assert!(ContentId::new("g".repeat(40)).is_err());
        }

        #[test]
        fn short_is_clamped() {
            let id = ContentId::new("0123456789".repeat(4)).unwrap();
            assert_eq!(id.short(4), "0123");
            assert_eq!(id.short(100).len(), 40);
        }

        #[test]
        fn hex_prefix_detection() {
            assert!(ContentId::is_hex_prefix("abc1"));
            assert!(!ContentId::is_hex_prefix(""));
            assert!(!ContentId::is_hex_prefix("HEAD"));
        }

        #[test]
        fn serde_roundtrip_validates() {
            let id = ContentId::new("c".repeat(40)).unwrap();
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", "c".repeat(40)));
            let bad: Result<ContentId, _> = serde_json::from_str("\"xyz\"");
            assert!(bad.is_err());
        }
    }

    mod repo_path {
        use super::*;

        #[test]
        fn valid_paths() {
            for p in ["a", "a/b", "dir/file.txt", ".gitignore", "a/.hidden/b"] {
                assert!(RepoPath::new(p).is_ok(), "{p} should be valid");
            }
        }

        #[test]
        fn invalid_paths() {
            for p in ["", "/abs", "a/../b", "./a", "a/", "a//b", "C:/x", "nul\0"] {
                assert!(RepoPath::new(p).is_err(), "{p:?} should be invalid");
            }
        }

        #[test]
        fn backslashes_normalized() {
            assert_eq!(RepoPath::new("a\\b\\c").unwrap().as_str(), "a/b/c");
        }

        #[test]
        fn file_name_is_last_component() {
            assert_eq!(RepoPath::new("a/b/c.txt").unwrap().file_name(), "c.txt");
            assert_eq!(RepoPath::new("top").unwrap().file_name(), "top");
        }
    }
}
