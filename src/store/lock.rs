//! store::lock
//!
//! Exclusive table lock for one mutation pass.
//!
//! # Architecture
//!
//! A record source is exclusively owned by one pass for its duration.
//! The table lock enforces that expectation for file-backed tables: only
//! one cursor can be open over a table at a time, across processes.
//!
//! # Storage
//!
//! - `<table>.lock` - Lock file with OS-level exclusive lock, next to the
//!   table file
//!
//! # Invariants
//!
//! - Lock must be held for the entire pass
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)
//!
//! # Example
//!
//! ```no_run
//! use fieldwork::store::lock::TableLock;
//! use std::path::Path;
//!
//! let lock = TableLock::acquire(Path::new("parcels.table.json"))?;
//!
//! // Perform the pass while holding the lock
//! // ...
//!
//! // Lock automatically released when dropped
//! drop(lock);
//! # Ok::<(), fieldwork::store::lock::LockError>(())
//! ```

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another pass already holds the lock.
    #[error("table is locked by another pass")]
    AlreadyLocked,

    /// Failed to create the lock file.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on one table.
///
/// The lock is automatically released when this guard is dropped (RAII
/// pattern). This ensures the lock is always released, even if the pass
/// panics.
#[derive(Debug)]
pub struct TableLock {
    /// Path to the lock file.
    path: PathBuf,
    /// The open file handle with the lock held.
    /// When this is Some, we hold the lock.
    file: Option<File>,
}

impl TableLock {
    /// Attempt to acquire the lock for the table at `table_path`.
    ///
    /// Uses OS-level file locking via `fs2`, which works across
    /// processes. Non-blocking: if another pass holds the lock, this
    /// returns [`LockError::AlreadyLocked`] immediately.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another pass holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(table_path: &Path) -> Result<Self, LockError> {
        let path = lock_path(table_path);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                file: Some(file),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly.
    ///
    /// Called automatically on drop, but can be called early if the pass
    /// finishes before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for TableLock {
    fn drop(&mut self) {
        // Best-effort release on drop - ignore errors since we're dropping
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

/// Lock file path: the table path with `.lock` appended.
fn lock_path(table_path: &Path) -> PathBuf {
    let mut os: OsString = table_path.as_os_str().to_os_string();
    os.push(".lock");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_table_path(dir: &TempDir) -> PathBuf {
        dir.path().join("data.table.json")
    }

    #[test]
    fn lock_acquire_succeeds() {
        let temp = TempDir::new().expect("create temp dir");
        let table = test_table_path(&temp);

        let lock = TableLock::acquire(&table).expect("acquire lock");
        assert!(lock.is_held());
        assert!(lock.path().exists());
    }

    #[test]
    fn lock_path_appends_suffix() {
        let temp = TempDir::new().expect("create temp dir");
        let table = test_table_path(&temp);

        let lock = TableLock::acquire(&table).expect("acquire lock");
        assert_eq!(lock.path(), temp.path().join("data.table.json.lock"));
    }

    #[test]
    fn lock_prevents_second_acquire() {
        let temp = TempDir::new().expect("create temp dir");
        let table = test_table_path(&temp);

        let lock1 = TableLock::acquire(&table).expect("first acquire");
        assert!(lock1.is_held());

        let result = TableLock::acquire(&table);
        assert!(matches!(result, Err(LockError::AlreadyLocked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = TempDir::new().expect("create temp dir");
        let table = test_table_path(&temp);

        {
            let lock = TableLock::acquire(&table).expect("first acquire");
            assert!(lock.is_held());
            // lock dropped here
        }

        let lock2 = TableLock::acquire(&table).expect("second acquire");
        assert!(lock2.is_held());
    }

    #[test]
    fn lock_released_explicitly() {
        let temp = TempDir::new().expect("create temp dir");
        let table = test_table_path(&temp);

        let mut lock = TableLock::acquire(&table).expect("acquire");
        lock.release().expect("release");
        assert!(!lock.is_held());

        let lock2 = TableLock::acquire(&table).expect("reacquire");
        assert!(lock2.is_held());
    }

    #[test]
    fn multiple_release_calls_are_safe() {
        let temp = TempDir::new().expect("create temp dir");
        let table = test_table_path(&temp);

        let mut lock = TableLock::acquire(&table).expect("acquire");
        lock.release().expect("first release");
        lock.release().expect("second release should be ok");
        assert!(!lock.is_held());
    }
}
