//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated branch name
//! - [`TagName`] - Validated tag name (safe to use as a file name)
//! - [`CommitId`] - Sequential commit identifier, equal to the commit's position
//! - [`UtcTimestamp`] - UTC timestamp persisted as integer epoch seconds
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use verdant::core::types::{BranchName, TagName};
//!
//! // Valid constructions
//! let branch = BranchName::new("feature/login").unwrap();
//! let tag = TagName::new("v1.0").unwrap();
//!
//! // Invalid constructions fail at creation time
//! assert!(BranchName::new("has space").is_err());
//! assert!(TagName::new("../escape").is_err());
//! ```

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid tag name: {0}")]
    InvalidTagName(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// A validated branch name.
///
/// Branch names are typed at the interactive shell, so they must be a single
/// word:
/// - Cannot be empty
/// - Cannot contain whitespace or ASCII control characters
/// - Cannot contain `"` (the shell's quoting character)
/// - Cannot contain `..`
///
/// # Example
///
/// ```
/// use verdant::core::types::BranchName;
///
/// let name = BranchName::new("feature/search").unwrap();
/// assert_eq!(name.as_str(), "feature/search");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("two words").is_err());
/// assert!(BranchName::new("a..b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// The branch every store starts on.
    pub const MAIN: &'static str = "main";

    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name is not a single word.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// The default `main` branch.
    pub fn main() -> Self {
        Self(Self::MAIN.to_string())
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot be empty".into(),
            ));
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain whitespace or control characters".into(),
            ));
        }
        if name.contains('"') {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain '\"'".into(),
            ));
        }
        if name.contains("..") {
            return Err(TypeError::InvalidBranchName(
                "branch name cannot contain '..'".into(),
            ));
        }
        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated tag name.
///
/// Each tag is persisted as its own file named after the tag, so the name
/// must be a plain file-name component:
/// - Cannot be empty or start with `.`
/// - Cannot contain `/`, `\`, whitespace, or control characters
///
/// # Example
///
/// ```
/// use verdant::core::types::TagName;
///
/// assert!(TagName::new("release-1").is_ok());
/// assert!(TagName::new("a/b").is_err());
/// assert!(TagName::new(".hidden").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagName(String);

impl TagName {
    /// Create a new validated tag name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTagName` if the name is not a safe file name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidTagName("tag name cannot be empty".into()));
        }
        if name.starts_with('.') {
            return Err(TypeError::InvalidTagName(
                "tag name cannot start with '.'".into(),
            ));
        }
        if name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
        {
            return Err(TypeError::InvalidTagName(format!(
                "tag name '{}' contains a path separator, whitespace, or control character",
                name.escape_default()
            )));
        }
        Ok(Self(name))
    }

    /// Get the tag name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TagName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<TagName> for String {
    fn from(name: TagName) -> Self {
        name.0
    }
}

impl std::fmt::Display for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a commit.
///
/// Ids are assigned sequentially from zero and always equal the commit's
/// position in the commit sequence, so an id doubles as an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(usize);

impl CommitId {
    /// Create a commit id from its position.
    pub fn new(position: usize) -> Self {
        Self(position)
    }

    /// The position of this commit in the commit sequence.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC timestamp with second precision.
///
/// Serialized as integer seconds since the Unix epoch, which is the commit
/// log's on-disk format.
///
/// # Example
///
/// ```
/// use verdant::core::types::UtcTimestamp;
///
/// let ts = UtcTimestamp::from_epoch_seconds(1_700_000_000).unwrap();
/// assert_eq!(ts.epoch_seconds(), 1_700_000_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(#[serde(with = "chrono::serde::ts_seconds")] DateTime<Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment, truncated to whole seconds.
    pub fn now() -> Self {
        let now = Utc::now();
        Self(Utc.timestamp_opt(now.timestamp(), 0).single().unwrap_or(now))
    }

    /// Create a timestamp from seconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTimestamp` if the value is outside chrono's range.
    pub fn from_epoch_seconds(secs: i64) -> Result<Self, TypeError> {
        Utc.timestamp_opt(secs, 0)
            .single()
            .map(Self)
            .ok_or(TypeError::InvalidTimestamp(secs))
    }

    /// Seconds since the Unix epoch.
    pub fn epoch_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render in local time as `YYYY-MM-DD HH:MM:SS`.
    pub fn format_local(&self) -> String {
        self.0
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
