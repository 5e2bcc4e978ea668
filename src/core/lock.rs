//! core::lock
//!
//! Per-repository exclusive lock.
//!
//! A pipeline (pull, status, push) holds the lock for its repository from
//! the first fetch until the last inventory read or push, so two processes
//! never interleave fetches and reads on the same mirror. Locks for
//! different repositories are independent.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::CachePaths;
use crate::core::types::RepoName;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process already holds the lock.
    #[error("mirror '{0}' is locked by another mirrorsync process")]
    AlreadyLocked(String),

    /// Failed to create the lock file.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on one mirror, released on drop.
#[derive(Debug)]
pub struct MirrorLock {
    path: PathBuf,
    file: Option<File>,
}

impl MirrorLock {
    /// Attempt to acquire the lock for `name` (non-blocking).
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    pub fn acquire(paths: &CachePaths, name: &RepoName) -> Result<Self, LockError> {
        paths.ensure_root().map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", paths.root().display(), e))
        })?;

        let path = paths.lock_path(name);
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
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(LockError::AlreadyLocked(name.to_string()))
            }
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MirrorLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CachePaths) {
        let temp = TempDir::new().expect("create temp dir");
        let paths = CachePaths::new(temp.path().join("cache"));
        (temp, paths)
    }

    #[test]
    fn acquire_creates_root_and_file() {
        let (_temp, paths) = setup();
        let name = RepoName::new("widget").unwrap();

        let lock = MirrorLock::acquire(&paths, &name).expect("acquire lock");
        assert!(lock.is_held());
        assert!(lock.path().exists());
    }

    #[test]
    fn second_acquire_fails_while_held() {
        let (_temp, paths) = setup();
        let name = RepoName::new("widget").unwrap();

        let _lock = MirrorLock::acquire(&paths, &name).unwrap();
        let second = MirrorLock::acquire(&paths, &name);
        assert!(matches!(second, Err(LockError::AlreadyLocked(n)) if n == "widget"));
    }

    #[test]
    fn released_on_drop() {
        let (_temp, paths) = setup();
        let name = RepoName::new("widget").unwrap();

        drop(MirrorLock::acquire(&paths, &name).unwrap());
        assert!(MirrorLock::acquire(&paths, &name).is_ok());
    }

    #[test]
    fn different_repos_do_not_contend() {
        let (_temp, paths) = setup();
        let _a = MirrorLock::acquire(&paths, &RepoName::new("a").unwrap()).unwrap();
        assert!(MirrorLock::acquire(&paths, &RepoName::new("b").unwrap()).is_ok());
    }
}
