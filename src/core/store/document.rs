//! core::store::document
//!
//! Reading and writing the store document.
//!
//! The document is a JSON object mapping keys to values. Every value is read
//! back as a string: string values verbatim, anything else as its JSON text.
//! Writes are atomic (temp file, fsync, rename) under a [`DataLock`].

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde_json::Value;

use super::StoreError;
use crate::core::lock::DataLock;

/// The key to value mapping as persisted.
pub type Mapping = BTreeMap<String, String>;

/// Read a store document.
///
/// Returns `Ok(None)` if the file does not exist.
///
/// # Errors
///
/// - [`StoreError::Read`] if the file exists but cannot be read
/// - [`StoreError::Malformed`] if it is not a JSON object
pub fn read_document(path: &Path) -> Result<Option<Mapping>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let value: Value = serde_json::from_str(&contents).map_err(|e| StoreError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let Value::Object(object) = value else {
        return Err(StoreError::Malformed {
            path: path.to_path_buf(),
            message: "expected a JSON object at the top level".to_string(),
        });
    };

    Ok(Some(
        object
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect(),
    ))
}

/// Write a store document atomically.
///
/// Creates parent directories if needed.
pub fn write_document(path: &Path, mapping: &Mapping) -> Result<(), StoreError> {
    let _lock = DataLock::acquire(path)?;

    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let contents = serde_json::to_string_pretty(mapping).map_err(|e| StoreError::Malformed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = std::path::PathBuf::from(temp_name);

    let mut file = fs::File::create(&temp_path).map_err(write_err)?;
    file.write_all(contents.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    fs::rename(&temp_path, path).map_err(write_err)?;

    Ok(())
}
