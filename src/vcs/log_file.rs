//! vcs::log_file
//!
//! Commit log persistence.
//!
//! The log is one JSON array holding every commit in id order. It is
//! rewritten in full after each commit, atomically and under a
//! [`DataLock`].

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::commit::Commit;
use super::VcsError;
use crate::core::lock::DataLock;

/// Read the commit log.
///
/// A missing or blank file is an empty history.
///
/// # Errors
///
/// - [`VcsError::Read`] if the file exists but cannot be read
/// - [`VcsError::MalformedLog`] if it does not parse, or if any commit's id
///   differs from its position
pub fn read_commit_log(path: &Path) -> Result<Vec<Commit>, VcsError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(VcsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let malformed = |message: String| VcsError::MalformedLog {
        path: path.to_path_buf(),
        message,
    };

    let commits: Vec<Commit> =
        serde_json::from_str(&contents).map_err(|e| malformed(e.to_string()))?;

    if let Some((position, commit)) = commits
        .iter()
        .enumerate()
        .find(|(position, commit)| commit.id.index() != *position)
    {
        return Err(malformed(format!(
            "commit at position {} has id {}",
            position, commit.id
        )));
    }

    Ok(commits)
}

/// Rewrite the commit log atomically.
pub fn write_commit_log(path: &Path, commits: &[Commit]) -> Result<(), VcsError> {
    let _lock = DataLock::acquire(path)?;

    let contents = serde_json::to_string_pretty(commits)?;

    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let write_err = |source| VcsError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(contents.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    fs::rename(&temp_path, path).map_err(write_err)?;

    Ok(())
}
