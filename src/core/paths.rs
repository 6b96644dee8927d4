//! core::paths
//!
//! Centralized path routing for Verdant's on-disk data.
//!
//! **Hard rule:** no code outside this module joins file names onto the data
//! directory. Every persisted location goes through [`DataPaths`].
//!
//! # Storage Layout
//!
//! All data lives under a single data directory (default `data/`):
//! - `mydb.json` - Default store document
//! - `commits.json` - Commit log
//! - `tag_<name>.txt` - One file per tag holding the commit id
//! - `*.lock` - Lock files guarding persistence writes
//!
//! # Example
//!
//! ```
//! use verdant::core::paths::DataPaths;
//! use std::path::PathBuf;
//!
//! let paths = DataPaths::new("data");
//! assert_eq!(paths.commit_log_path(), PathBuf::from("data/commits.json"));
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::types::TagName;

/// Prefix of tag file names.
const TAG_PREFIX: &str = "tag_";
/// Extension of tag file names.
const TAG_EXTENSION: &str = "txt";

/// Centralized path routing for the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    data_dir: PathBuf,
}

impl DataPaths {
    /// Create paths rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The data directory itself.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create the data directory if it does not exist.
    pub fn ensure_data_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }

    /// Default store document: `<data_dir>/mydb.json`.
    pub fn default_store_path(&self) -> PathBuf {
        self.data_dir.join("mydb.json")
    }

    /// Commit log: `<data_dir>/commits.json`.
    pub fn commit_log_path(&self) -> PathBuf {
        self.data_dir.join("commits.json")
    }

    /// File holding a tag's commit id: `<data_dir>/tag_<name>.txt`.
    pub fn tag_path(&self, tag: &TagName) -> PathBuf {
        self.data_dir
            .join(format!("{}{}.{}", TAG_PREFIX, tag.as_str(), TAG_EXTENSION))
    }

    /// Recover a tag name from a file name produced by [`Self::tag_path`].
    ///
    /// Returns `None` for files that are not tag files.
    pub fn tag_name_from_file(file_name: &str) -> Option<TagName> {
        let stem = file_name
            .strip_prefix(TAG_PREFIX)?
            .strip_suffix(TAG_EXTENSION)?
            .strip_suffix('.')?;
        TagName::new(stem).ok()
    }
}

/// Lock file guarding writes to `target`: the target path with `.lock` appended.
pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}
