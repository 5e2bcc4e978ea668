//! core::paths
//!
//! Centralized path routing for the mirror cache.
//!
//! # Storage Layout
//!
//! Every configured repository owns a disjoint slice of the cache root:
//! - `<root>/<name>.git` - bare mirror of the public upstream
//! - `<root>/<name>.lock` - exclusive lock file for the pipeline
//!
//! No code outside this module should compute paths under the cache root.
//!
//! # Example
//!
//! ```
//! use mirrorsync::core::paths::CachePaths;
//! use mirrorsync::core::types::RepoName;
//! use std::path::PathBuf;
//!
//! let paths = CachePaths::new(PathBuf::from("/var/cache/mirrorsync"));
//! let name = RepoName::new("widget").unwrap();
//!
//! assert_eq!(
//!     paths.mirror_dir(&name),
//!     PathBuf::from("/var/cache/mirrorsync/widget.git")
//! );
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::types::RepoName;

/// Path routing for the cache root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    root: PathBuf,
}

impl CachePaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the cache root if it does not exist.
    ///
    /// Concurrent callers are fine: `create_dir_all` tolerates a directory
    /// that appears underneath it.
    pub fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    /// The bare mirror directory for a repository.
    pub fn mirror_dir(&self, name: &RepoName) -> PathBuf {
        self.root.join(format!("{}.git", name))
    }

    /// The lock file guarding a repository's pipeline.
    pub fn lock_path(&self, name: &RepoName) -> PathBuf {
        self.root.join(format!("{}.lock", name))
    }
}
