//! core::inventory
//!
//! The set of references observed at one repository location.
//!
//! An inventory is an ordered mapping from [`RefId`] to the commit it
//! points at. It is re-read on every status or push; nothing here is
//! cached across runs.
//!
//! # Invariants
//!
//! - Each reference identity maps to at most one commit
//! - Iteration order is branches first, then tags, each by name

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::types::{Fingerprint, Oid, RefId, RefKind};

/// Errors from inventory construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// The same reference was reported at two different commits.
    #[error("{reference} listed twice: {first} and {second}")]
    Conflict {
        reference: RefId,
        first: Oid,
        second: Oid,
    },
}

/// Branch and tag references at one location.
///
/// # Example
///
/// ```
/// use mirrorsync::core::inventory::Inventory;
/// use mirrorsync::core::types::{Oid, RefId};
///
/// let mut inv = Inventory::new();
/// let main = RefId::branch("main").unwrap();
/// inv.insert(main.clone(), Oid::new("a".repeat(40)).unwrap()).unwrap();
///
/// assert!(inv.contains(&main));
/// assert_eq!(inv.branches().count(), 1);
/// assert_eq!(inv.tags().count(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    refs: BTreeMap<RefId, Oid>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference.
    ///
    /// Inserting the same pair twice is a no-op. Inserting a reference at a
    /// different commit than previously recorded is a conflict.
    pub fn insert(&mut self, id: RefId, oid: Oid) -> Result<(), InventoryError> {
        match self.refs.get(&id) {
            Some(existing) if *existing != oid => Err(InventoryError::Conflict {
                reference: id,
                first: existing.clone(),
                second: oid,
            }),
            Some(_) => Ok(()),
            None => {
                self.refs.insert(id, oid);
                Ok(())
            }
        }
    }

    /// Remove a reference, returning the commit it pointed at.
    pub fn remove(&mut self, id: &RefId) -> Option<Oid> {
        self.refs.remove(id)
    }

    pub fn get(&self, id: &RefId) -> Option<&Oid> {
        self.refs.get(id)
    }

    pub fn contains(&self, id: &RefId) -> bool {
        self.refs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// All references in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = (&RefId, &Oid)> {
        self.refs.iter()
    }

    /// References of one kind.
    pub fn of_kind(&self, kind: RefKind) -> impl Iterator<Item = (&RefId, &Oid)> {
        self.refs.iter().filter(move |(id, _)| id.kind() == kind)
    }

    pub fn branches(&self) -> impl Iterator<Item = (&RefId, &Oid)> {
        self.of_kind(RefKind::Branch)
    }

    pub fn tags(&self) -> impl Iterator<Item = (&RefId, &Oid)> {
        self.of_kind(RefKind::Tag)
    }

    /// Stable hash of the whole inventory.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(self.refs.iter())
    }
}

impl FromIterator<(RefId, Oid)> for Inventory {
    /// Builds an inventory, keeping the last commit seen for a duplicate
    /// identity. Use [`Inventory::insert`] when duplicates must be rejected.
    fn from_iter<I: IntoIterator<Item = (RefId, Oid)>>(iter: I) -> Self {
        Self {
            refs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(c: char) -> Oid {
        Oid::new(c.to_string().repeat(40)).unwrap()
    }

    #[test]
    fn duplicate_same_commit_is_noop() {
        let mut inv = Inventory::new();
        let main = RefId::branch("main").unwrap();
        inv.insert(main.clone(), oid('a')).unwrap();
        inv.insert(main, oid('a')).unwrap();
        assert_eq!(inv.len(), 1);
    }

    #[test]
    fn duplicate_different_commit_conflicts() {
        let mut inv = Inventory::new();
        let main = RefId::branch("main").unwrap();
        inv.insert(main.clone(), oid('a')).unwrap();
        let err = inv.insert(main, oid('b')).unwrap_err();
        assert!(matches!(err, InventoryError::Conflict { .. }));
        assert!(err.to_string().contains("heads/main"));
    }

    #[test]
    fn branch_and_tag_with_same_name_are_distinct() {
        let mut inv = Inventory::new();
        inv.insert(RefId::branch("v1").unwrap(), oid('a')).unwrap();
        inv.insert(RefId::tag("v1").unwrap(), oid('b')).unwrap();
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.branches().count(), 1);
        assert_eq!(inv.tags().count(), 1);
    }

    #[test]
    fn iteration_is_branches_then_tags() {
        let inv: Inventory = [
            (RefId::tag("a").unwrap(), oid('1')),
            (RefId::branch("z").unwrap(), oid('2')),
            (RefId::branch("b").unwrap(), oid('3')),
        ]
        .into_iter()
        .collect();

        let order: Vec<String> = inv.iter().map(|(id, _)| id.qualified()).collect();
        assert_eq!(order, vec!["heads/b", "heads/z", "tags/a"]);
    }

    #[test]
    fn fingerprint_tracks_changes() {
        let mut inv = Inventory::new();
        inv.insert(RefId::branch("main").unwrap(), oid('a')).unwrap();
        let before = inv.fingerprint();
        assert_eq!(before, inv.clone().fingerprint());

        inv.insert(RefId::tag("v1").unwrap(), oid('b')).unwrap();
        assert_ne!(before, inv.fingerprint());
    }
}
