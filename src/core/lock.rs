//! core::lock
//!
//! Exclusive file lock guarding persistence writes.
//!
//! # Architecture
//!
//! The persisted documents (the store document and the commit log) are the
//! only resources shared between processes, e.g. an interactive shell and a
//! relay server pointed at the same data directory. Every write takes an
//! OS-level exclusive lock on a sibling `<file>.lock` for its duration, so
//! two writers never interleave on the same document.
//!
//! # Invariants
//!
//! - The lock is held for the entire write (temp file, fsync, rename)
//! - The lock is released on drop (RAII pattern)
//! - [`DataLock::acquire`] blocks until other writers finish
//!
//! # Example
//!
//! ```no_run
//! use verdant::core::lock::DataLock;
//! use std::path::Path;
//!
//! let lock = DataLock::acquire(Path::new("data/commits.json")).unwrap();
//! // ... write data/commits.json ...
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::lock_path_for;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Failed to create the lock file or its directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock over writes to one persisted file.
#[derive(Debug)]
pub struct DataLock {
    /// The open lock file with the OS lock held.
    file: File,
}

impl DataLock {
    /// Acquire the lock guarding `target`, waiting for other writers.
    ///
    /// # Errors
    ///
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(target: &Path) -> Result<Self, LockError> {
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LockError::CreateFailed(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let path = lock_path_for(target);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        file.lock_exclusive()
            .map_err(|e| LockError::AcquireFailed(format!("{}: {}", path.display(), e)))?;
        Ok(Self { file })
    }
}

impl Drop for DataLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_creates_lock_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("nested/commits.json");

        let _lock = DataLock::acquire(&target).expect("acquire lock");
        assert!(temp.path().join("nested/commits.json.lock").exists());
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("mydb.json");

        drop(DataLock::acquire(&target).expect("first acquire"));

        let handle = File::open(lock_path_for(&target)).unwrap();
        handle.try_lock_exclusive().expect("lock should be free");
        handle.unlock().unwrap();
    }

    #[test]
    fn held_lock_blocks_other_handles() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("mydb.json");

        let _held = DataLock::acquire(&target).expect("acquire");
        let other = File::open(lock_path_for(&target)).unwrap();
        assert!(other.try_lock_exclusive().is_err());
    }

    #[test]
    fn error_display_formatting() {
        let err = LockError::AcquireFailed("data/mydb.json.lock: busy".into());
        assert!(err.to_string().contains("failed to acquire lock"));
    }
}
