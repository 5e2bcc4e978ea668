//! core::oracle
//!
//! The ancestry capability the classifier depends on.
//!
//! The classifier never talks to git directly. It asks an
//! [`AncestryOracle`] two questions: is one commit an ancestor of another,
//! and how many commits does one side have that the other lacks. The
//! production implementation is [`crate::git::Git`]; [`MemoryGraph`]
//! answers the same questions from an in-memory DAG for tests.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use super::types::Oid;

/// Failure to answer an ancestry query.
///
/// This is distinct from a `false` answer: an oracle error means the
/// question could not be answered at all (for example a commit object is
/// missing locally), and callers must not treat it as divergence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The commit is not present in the object store.
    #[error("unknown commit {oid}")]
    UnknownCommit { oid: String },

    /// The underlying query failed.
    #[error("ancestry query failed: {message}")]
    Query { message: String },
}

/// Pure, synchronous ancestry queries over a commit graph.
pub trait AncestryOracle {
    /// Whether `ancestor` is reachable from `descendant` by following
    /// parent links. A commit is its own ancestor.
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, OracleError>;

    /// Number of commits reachable from `tip` that are not reachable from
    /// `base`. Zero when there are none.
    fn count_exclusive(&self, base: &Oid, tip: &Oid) -> Result<usize, OracleError>;
}

impl<T: AncestryOracle + ?Sized> AncestryOracle for &T {
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, OracleError> {
        (**self).is_ancestor(ancestor, descendant)
    }

    fn count_exclusive(&self, base: &Oid, tip: &Oid) -> Result<usize, OracleError> {
        (**self).count_exclusive(base, tip)
    }
}

/// An in-memory commit DAG.
///
/// # Example
///
/// ```
/// use mirrorsync::core::oracle::{AncestryOracle, MemoryGraph};
/// use mirrorsync::core::types::Oid;
///
/// let a = Oid::new("a".repeat(40)).unwrap();
/// let b = Oid::new("b".repeat(40)).unwrap();
///
/// let mut graph = MemoryGraph::new();
/// graph.add_commit(a.clone(), []);
/// graph.add_commit(b.clone(), [a.clone()]);
///
/// assert!(graph.is_ancestor(&a, &b).unwrap());
/// assert_eq!(graph.count_exclusive(&a, &b).unwrap(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    parents: HashMap<Oid, Vec<Oid>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit with the given parents.
    ///
    /// Parents should already be present; a dangling parent surfaces as
    /// [`OracleError::UnknownCommit`] when a walk reaches it.
    pub fn add_commit(&mut self, oid: Oid, parents: impl IntoIterator<Item = Oid>) {
        self.parents.insert(oid, parents.into_iter().collect());
    }

    /// Add a linear chain of commits on top of `base` (or a new root when
    /// `None`), returning them oldest first.
    pub fn add_chain(&mut self, base: Option<&Oid>, oids: impl IntoIterator<Item = Oid>) -> Vec<Oid> {
        let mut prev = base.cloned();
        let mut added = Vec::new();
        for oid in oids {
            self.add_commit(oid.clone(), prev.clone());
            prev = Some(oid.clone());
            added.push(oid);
        }
        added
    }

    pub fn contains(&self, oid: &Oid) -> bool {
        self.parents.contains_key(oid)
    }

    fn reachable(&self, tip: &Oid) -> Result<HashSet<Oid>, OracleError> {
        let mut seen = HashSet::new();
        let mut stack = vec![tip.clone()];
        while let Some(oid) = stack.pop() {
            if seen.contains(&oid) {
                continue;
            }
            let parents = self
                .parents
                .get(&oid)
                .ok_or_else(|| OracleError::UnknownCommit {
                    oid: oid.to_string(),
                })?;
            stack.extend(parents.iter().cloned());
            seen.insert(oid);
        }
        Ok(seen)
    }
}

impl AncestryOracle for MemoryGraph {
    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, OracleError> {
        if !self.contains(ancestor) {
            return Err(OracleError::UnknownCommit {
                oid: ancestor.to_string(),
            });
        }
        Ok(self.reachable(descendant)?.contains(ancestor))
    }

    fn count_exclusive(&self, base: &Oid, tip: &Oid) -> Result<usize, OracleError> {
        let hidden = self.reachable(base)?;
        Ok(self
            .reachable(tip)?
            .iter()
            .filter(|oid| !hidden.contains(*oid))
            .count())
    }
}
