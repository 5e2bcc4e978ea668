//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the read side of git access: opening a mirror,
//! enumerating references into an [`Inventory`], and answering ancestry
//! queries. It is the production [`AncestryOracle`].
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Path is not a git repository
//! - [`GitError::ObjectNotFound`]: A commit is missing from the object store
//! - [`GitError::InvalidOid`]: An object id could not be parsed
//! - [`GitError::Inventory`]: The ref listing was inconsistent
//!
//! # Example
//!
//! ```ignore
//! use mirrorsync::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("/var/cache/mirrorsync/widget.git"))?;
//! let source = git.read_inventory("refs/heads/", "refs/tags/")?;
//! println!("{} refs", source.len());
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::inventory::{Inventory, InventoryError};
use crate::core::oracle::{AncestryOracle, OracleError};
use crate::core::types::{Oid, RefId, RefKind, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound { oid: String },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid { oid: String },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName { message: String },

    /// The listed references were inconsistent.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl GitError {
    /// Create a GitError from a git2::Error with the object it concerned.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) | TypeError::InvalidRepoName(msg) => {
                GitError::InvalidRefName { message: msg }
            }
        }
    }
}

impl From<GitError> for OracleError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::ObjectNotFound { oid } | GitError::InvalidOid { oid } => {
                OracleError::UnknownCommit { oid }
            }
            other => OracleError::Query {
                message: other.to_string(),
            },
        }
    }
}

/// A ref with its full name and peeled commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefEntry {
    /// The full ref name (`refs/...`)
    pub name: String,
    /// The commit the ref points to, after peeling tags
    pub oid: Oid,
}

/// The Git interface.
///
/// Wraps a git2 repository (normally the bare mirror). Reads only; all
/// transport happens through [`super::Transport`].
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open the repository at exactly `path` (bare or not).
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found at `path`
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    // =========================================================================
    // Ref Enumeration
    // =========================================================================

    /// List all refs under a prefix, peeled to commits.
    ///
    /// Refs whose target is not a commit (for example a tag of a tree) and
    /// refs with non-UTF-8 names are skipped. A ref whose object is missing
    /// is an error, never a silent omission.
    pub fn list_refs_by_prefix(&self, prefix: &str) -> Result<Vec<RefEntry>, GitError> {
        let pattern = format!("{}*", prefix);
        let refs = self.repo.references_glob(&pattern)?;

        let mut entries = Vec::new();
        for reference in refs {
            let reference = reference?;

            let name = match reference.name() {
                Some(n) => n.to_string(),
                None => {
                    warn!(
                        reference = %String::from_utf8_lossy(reference.name_bytes()),
                        "skipping ref with non-UTF-8 name"
                    );
                    continue;
                }
            };

            // Peel through tags only; anything that fails here is damage.
            let target = reference
                .peel(git2::ObjectType::Any)
                .map_err(|e| GitError::from_git2(e, &name))?;
            if target.kind() != Some(git2::ObjectType::Commit) {
                debug!(reference = %name, kind = ?target.kind(), "skipping non-commit ref");
                continue;
            }

            entries.push(RefEntry {
                name,
                oid: Oid::new(target.id().to_string())?,
            });
        }

        Ok(entries)
    }

    /// The raw object id a ref points at, without peeling.
    ///
    /// Returns `None` when the ref does not exist.
    pub fn ref_target(&self, name: &str) -> Result<Option<Oid>, GitError> {
        let reference = match self.repo.find_reference(name) {
            Ok(r) => r,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, name)),
        };
        let resolved = reference.resolve().map_err(|e| GitError::from_git2(e, name))?;
        match resolved.target() {
            Some(oid) => Ok(Some(Oid::new(oid.to_string())?)),
            None => Ok(None),
        }
    }

    /// Build an inventory from two namespaces.
    ///
    /// Refs under `heads_prefix` become branches and refs under
    /// `tags_prefix` become tags, keyed by the remainder of their name.
    ///
    /// ```ignore
    /// // Upstream refs in the local mirror
    /// let source = git.read_inventory("refs/heads/", "refs/tags/")?;
    /// // Destination refs fetched into a remote-tracking namespace
    /// let dest = git.read_inventory(
    ///     "refs/remotes/private/heads/",
    ///     "refs/remotes/private/tags/",
    /// )?;
    /// ```
    pub fn read_inventory(&self, heads_prefix: &str, tags_prefix: &str) -> Result<Inventory, GitError> {
        let mut inventory = Inventory::new();

        for (kind, prefix) in [(RefKind::Branch, heads_prefix), (RefKind::Tag, tags_prefix)] {
            for entry in self.list_refs_by_prefix(prefix)? {
                let Some(short) = entry.name.strip_prefix(prefix) else {
                    continue;
                };
                match RefId::new(kind, short) {
                    Ok(id) => inventory.insert(id, entry.oid)?,
                    Err(e) => warn!(reference = %entry.name, error = %e, "skipping ref"),
                }
            }
        }

        Ok(inventory)
    }

    // =========================================================================
    // Ancestry
    // =========================================================================

    fn commit_oid(&self, oid: &Oid) -> Result<git2::Oid, GitError> {
        let git_oid =
            git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        self.repo
            .find_commit(git_oid)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        Ok(git_oid)
    }

    /// Check if `ancestor` is an ancestor of `descendant`.
    ///
    /// Returns true if ancestor == descendant (a commit is its own ancestor).
    /// Both commits must exist locally.
    pub fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        let ancestor_oid = self.commit_oid(ancestor)?;
        let descendant_oid = self.commit_oid(descendant)?;

        if ancestor_oid == descendant_oid {
            return Ok(true);
        }

        self.repo
            .graph_descendant_of(descendant_oid, ancestor_oid)
            .map_err(|e| GitError::Internal {
                message: e.message().to_string(),
            })
    }

    /// Count commits reachable from `tip` but not from `base`.
    pub fn commit_count(&self, base: &Oid, tip: &Oid) -> Result<usize, GitError> {
        let base_oid = self.commit_oid(base)?;
        let tip_oid = self.commit_oid(tip)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(tip_oid)?;
        revwalk.hide(base_oid)?;

        let mut count = 0;
        for step in revwalk {
            step?;
            count += 1;
        }
        Ok(count)
    }
}

impl AncestryOracle for Git {
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, OracleError> {
        Ok(Git::is_ancestor(self, ancestor, descendant)?)
    }

    fn count_exclusive(&self, base: &Oid, tip: &Oid) -> Result<usize, OracleError> {
        Ok(self.commit_count(base, tip)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn missing_object_maps_to_unknown_commit() {
            let err: OracleError = GitError::ObjectNotFound {
                oid: "abc".to_string(),
            }
            .into();
            assert_eq!(
                err,
                OracleError::UnknownCommit {
                    oid: "abc".to_string()
                }
            );
        }

        #[test]
        fn other_errors_map_to_query() {
            let err: OracleError = GitError::Internal {
                message: "boom".to_string(),
            }
            .into();
            assert!(matches!(err, OracleError::Query { message } if message.contains("boom")));
        }

        #[test]
        fn type_errors_convert() {
            let err: GitError = TypeError::InvalidOid("xyz".to_string()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
            let err: GitError = TypeError::InvalidRefName("a..b".to_string()).into();
            assert!(matches!(err, GitError::InvalidRefName { .. }));
        }
    }

    #[test]
    fn open_non_repository_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            Git::open(dir.path()),
            Err(GitError::NotARepo { .. })
        ));
    }

    #[test]
    fn empty_bare_repository_has_empty_inventory() {
        let dir = tempfile::TempDir::new().unwrap();
        git2::Repository::init_bare(dir.path()).unwrap();

        let git = Git::open(dir.path()).unwrap();
        let inventory = git.read_inventory("refs/heads/", "refs/tags/").unwrap();
        assert!(inventory.is_empty());
        assert_eq!(git.ref_target("refs/heads/main").unwrap(), None);
    }

    mod refs {
        use super::*;

        fn bare_with_commit() -> (tempfile::TempDir, git2::Repository, git2::Oid) {
            let dir = tempfile::TempDir::new().unwrap();
            let repo = git2::Repository::init_bare(dir.path()).unwrap();
            let sig = git2::Signature::now("Test", "test@example.com").unwrap();
            let tree = repo.treebuilder(None).unwrap().write().unwrap();
            let commit = {
                let tree = repo.find_tree(tree).unwrap();
                repo.commit(Some("refs/heads/main"), &sig, &sig, "one", &tree, &[])
                    .unwrap()
            };
            (dir, repo, commit)
        }

        #[test]
        fn tag_of_tree_is_skipped() {
            let (dir, repo, _) = bare_with_commit();
            let tree = repo.treebuilder(None).unwrap().write().unwrap();
            repo.reference("refs/tags/just-a-tree", tree, false, "test")
                .unwrap();

            let git = Git::open(dir.path()).unwrap();
            let inventory = git.read_inventory("refs/heads/", "refs/tags/").unwrap();
            assert_eq!(inventory.len(), 1);
            assert!(inventory.contains(&RefId::branch("main").unwrap()));
        }

        #[test]
        fn ref_to_absent_object_is_an_error() {
            let (dir, _repo, _) = bare_with_commit();
            let ghost = dir.path().join("refs/heads/ghost");
            std::fs::write(&ghost, format!("{}\n", "1".repeat(40))).unwrap();

            let git = Git::open(dir.path()).unwrap();
            let err = git.read_inventory("refs/heads/", "refs/tags/").unwrap_err();
            assert!(
                matches!(&err, GitError::ObjectNotFound { oid } if oid == "refs/heads/ghost"),
                "unexpected error: {err}"
            );
        }

        #[test]
        fn annotated_tag_target_is_not_peeled() {
            let (dir, repo, commit) = bare_with_commit();
            let sig = git2::Signature::now("Test", "test@example.com").unwrap();
            let object = repo.find_object(commit, None).unwrap();
            let tag = repo.tag("v1", &object, &sig, "release", false).unwrap();

            let git = Git::open(dir.path()).unwrap();
            let raw = git.ref_target("refs/tags/v1").unwrap().unwrap();
            assert_eq!(raw.as_str(), tag.to_string());

            let inventory = git.read_inventory("refs/heads/", "refs/tags/").unwrap();
            let peeled = inventory.get(&RefId::tag("v1").unwrap()).unwrap();
            assert_eq!(peeled.as_str(), commit.to_string());
        }
    }
}
