//! vcs::tags
//!
//! Tag files: one `tag_<name>.txt` per tag holding a commit id.

use std::fs;
use std::io::ErrorKind;

use tracing::warn;

use super::VcsError;
use crate::core::paths::DataPaths;
use crate::core::types::{CommitId, TagName};

/// Bind `name` to `id`, replacing any previous binding.
pub fn write_tag(paths: &DataPaths, name: &TagName, id: CommitId) -> Result<(), VcsError> {
    let path = paths.tag_path(name);
    fs::write(&path, id.to_string()).map_err(|source| VcsError::Write { path, source })
}

/// Read the commit id bound to `name`.
///
/// # Errors
///
/// - [`VcsError::UnknownTag`] if no tag file exists
/// - [`VcsError::MalformedTag`] if the file does not hold an id
pub fn read_tag(paths: &DataPaths, name: &TagName) -> Result<CommitId, VcsError> {
    let path = paths.tag_path(name);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(VcsError::UnknownTag(name.clone()))
        }
        Err(source) => return Err(VcsError::Read { path, source }),
    };

    contents
        .trim()
        .parse::<usize>()
        .map(CommitId::new)
        .map_err(|e| VcsError::MalformedTag {
            name: name.clone(),
            message: e.to_string(),
        })
}

/// Every readable tag in the data directory, sorted by name.
///
/// Unreadable tag files are skipped with a warning.
pub fn list_tags(paths: &DataPaths) -> Result<Vec<(TagName, CommitId)>, VcsError> {
    let dir = paths.data_dir();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(VcsError::Read {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut tags = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str().and_then(DataPaths::tag_name_from_file) else {
            continue;
        };
        match read_tag(paths, &name) {
            Ok(id) => tags.push((name, id)),
            Err(e) => warn!(tag = %name, error = %e, "skipping unreadable tag"),
        }
    }

    tags.sort();
    Ok(tags)
}
