//! core::classify
//!
//! The reference classifier.
//!
//! Given a source inventory (the public upstream, as held by the local
//! mirror) and a destination inventory (the private mirror's remote), every
//! reference name appearing on either side gets exactly one [`RefStatus`]:
//!
//! | status     | condition                                        |
//! |------------|--------------------------------------------------|
//! | `same`     | both sides point at the same commit              |
//! | `ahead`    | destination commit is an ancestor of the source  |
//! | `behind`   | source commit is an ancestor of the destination  |
//! | `diverged` | neither is an ancestor of the other              |
//! | `new`      | only the source has the reference                |
//! | `missing`  | only the destination has the reference           |
//!
//! Classification is a pure function of the two inventories and the
//! oracle. It performs no I/O beyond what the oracle does, and callers are
//! responsible for fetching before building the inventories.
//!
//! # Errors
//!
//! An oracle failure aborts the whole comparison with
//! [`ClassifyError::Oracle`]. It is never reported as `diverged`.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::inventory::Inventory;
use super::oracle::{AncestryOracle, OracleError};
use super::types::{Oid, RefId, RefKind};

/// Errors from classification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("cannot compare {reference}: {source}; re-fetch and try again")]
    Oracle {
        reference: RefId,
        #[source]
        source: OracleError,
    },
}

/// The relationship between the source and destination commits of one
/// reference.
///
/// Commit payloads live in the variants, so a record can never claim to
/// be `ahead` without both commits and a count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefStatus {
    /// Both sides agree.
    Same { commit: Oid },

    /// The destination can be fast-forwarded by `commits` commits.
    Ahead { source: Oid, dest: Oid, commits: usize },

    /// The destination holds `commits` commits the source lacks.
    Behind { source: Oid, dest: Oid, commits: usize },

    /// Histories disagree.
    Diverged { source: Oid, dest: Oid },

    /// Only the source has this reference.
    New { source: Oid },

    /// Only the destination has this reference (deleted upstream).
    Missing { dest: Oid },
}

impl RefStatus {
    /// Short lowercase label (`same`, `ahead`, ...).
    pub fn label(&self) -> &'static str {
        match self {
            RefStatus::Same { .. } => "same",
            RefStatus::Ahead { .. } => "ahead",
            RefStatus::Behind { .. } => "behind",
            RefStatus::Diverged { .. } => "diverged",
            RefStatus::New { .. } => "new",
            RefStatus::Missing { .. } => "missing",
        }
    }

    pub fn source_commit(&self) -> Option<&Oid> {
        match self {
            RefStatus::Same { commit } => Some(commit),
            RefStatus::Ahead { source, .. }
            | RefStatus::Behind { source, .. }
            | RefStatus::Diverged { source, .. }
            | RefStatus::New { source } => Some(source),
            RefStatus::Missing { .. } => None,
        }
    }

    pub fn dest_commit(&self) -> Option<&Oid> {
        match self {
            RefStatus::Same { commit } => Some(commit),
            RefStatus::Ahead { dest, .. }
            | RefStatus::Behind { dest, .. }
            | RefStatus::Diverged { dest, .. }
            | RefStatus::Missing { dest } => Some(dest),
            RefStatus::New { .. } => None,
        }
    }

    /// `ahead_count` of the record, present only for `ahead`.
    pub fn ahead_count(&self) -> Option<usize> {
        match self {
            RefStatus::Ahead { commits, .. } => Some(*commits),
            _ => None,
        }
    }

    /// `behind_count` of the record, present only for `behind`.
    pub fn behind_count(&self) -> Option<usize> {
        match self {
            RefStatus::Behind { commits, .. } => Some(*commits),
            _ => None,
        }
    }
}

/// One classified reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefRecord {
    #[serde(rename = "ref")]
    pub id: RefId,
    #[serde(flatten)]
    pub status: RefStatus,
}

impl RefRecord {
    pub fn name(&self) -> &str {
        self.id.name()
    }

    pub fn kind(&self) -> RefKind {
        self.id.kind()
    }
}

/// Per-status tallies of a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub same: usize,
    pub ahead: usize,
    pub behind: usize,
    pub diverged: usize,
    pub new: usize,
    pub missing: usize,
}

/// The full classification of two inventories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Comparison {
    records: Vec<RefRecord>,
}

impl Comparison {
    /// All records: branches then tags, each ordered by name.
    pub fn records(&self) -> &[RefRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RefRecord> {
        self.records
    }

    pub fn of_kind(&self, kind: RefKind) -> impl Iterator<Item = &RefRecord> {
        self.records.iter().filter(move |r| r.kind() == kind)
    }

    pub fn branches(&self) -> impl Iterator<Item = &RefRecord> {
        self.of_kind(RefKind::Branch)
    }

    pub fn tags(&self) -> impl Iterator<Item = &RefRecord> {
        self.of_kind(RefKind::Tag)
    }

    /// Partition records by kind for presentation.
    pub fn by_kind(&self) -> BTreeMap<RefKind, Vec<&RefRecord>> {
        let mut groups: BTreeMap<RefKind, Vec<&RefRecord>> = BTreeMap::new();
        for record in &self.records {
            groups.entry(record.kind()).or_default().push(record);
        }
        groups
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for record in &self.records {
            match record.status {
                RefStatus::Same { .. } => counts.same += 1,
                RefStatus::Ahead { .. } => counts.ahead += 1,
                RefStatus::Behind { .. } => counts.behind += 1,
                RefStatus::Diverged { .. } => counts.diverged += 1,
                RefStatus::New { .. } => counts.new += 1,
                RefStatus::Missing { .. } => counts.missing += 1,
            }
        }
        counts
    }

    /// Look up the record for one reference.
    pub fn get(&self, id: &RefId) -> Option<&RefRecord> {
        self.records.iter().find(|r| &r.id == id)
    }
}

/// Classify every reference in `source` and `dest`.
///
/// Ancestry is queried once per differing pair: first whether the
/// destination commit is an ancestor of the source commit, then the
/// reverse. If neither holds the reference is `diverged`.
///
/// # Example
///
/// ```
/// use mirrorsync::core::classify::{classify, RefStatus};
/// use mirrorsync::core::inventory::Inventory;
/// use mirrorsync::core::oracle::MemoryGraph;
/// use mirrorsync::core::types::{Oid, RefId};
///
/// let a = Oid::new("a".repeat(40)).unwrap();
/// let b = Oid::new("b".repeat(40)).unwrap();
/// let mut graph = MemoryGraph::new();
/// graph.add_chain(None, [a.clone(), b.clone()]);
///
/// let main = RefId::branch("main").unwrap();
/// let source: Inventory = [(main.clone(), b.clone())].into_iter().collect();
/// let dest: Inventory = [(main.clone(), a.clone())].into_iter().collect();
///
/// let comparison = classify(&source, &dest, &graph).unwrap();
/// assert_eq!(comparison.records()[0].status.ahead_count(), Some(1));
/// ```
pub fn classify<O: AncestryOracle + ?Sized>(
    source: &Inventory,
    dest: &Inventory,
    oracle: &O,
) -> Result<Comparison, ClassifyError> {
    let mut records = Vec::with_capacity(source.len().max(dest.len()));

    for (id, source_commit) in source.iter() {
        let status = match dest.get(id) {
            None => RefStatus::New {
                source: source_commit.clone(),
            },
            Some(dest_commit) if dest_commit == source_commit => RefStatus::Same {
                commit: source_commit.clone(),
            },
            Some(dest_commit) => compare_commits(id, source_commit, dest_commit, oracle)?,
        };
        records.push(RefRecord {
            id: id.clone(),
            status,
        });
    }

    for (id, dest_commit) in dest.iter() {
        if !source.contains(id) {
            records.push(RefRecord {
                id: id.clone(),
                status: RefStatus::Missing {
                    dest: dest_commit.clone(),
                },
            });
        }
    }

    records.sort_by(|a, b| a.id.cmp(&b.id));
    debug!(records = records.len(), "classified references");

    Ok(Comparison { records })
}

fn compare_commits<O: AncestryOracle + ?Sized>(
    id: &RefId,
    source: &Oid,
    dest: &Oid,
    oracle: &O,
) -> Result<RefStatus, ClassifyError> {
    let wrap = |source: OracleError| ClassifyError::Oracle {
        reference: id.clone(),
        source,
    };

    if oracle.is_ancestor(dest, source).map_err(wrap)? {
        let commits = oracle.count_exclusive(dest, source).map_err(wrap)?;
        return Ok(RefStatus::Ahead {
            source: source.clone(),
            dest: dest.clone(),
            commits,
        });
    }

    if oracle.is_ancestor(source, dest).map_err(wrap)? {
        let commits = oracle.count_exclusive(source, dest).map_err(wrap)?;
        return Ok(RefStatus::Behind {
            source: source.clone(),
            dest: dest.clone(),
            commits,
        });
    }

    Ok(RefStatus::Diverged {
        source: source.clone(),
        dest: dest.clone(),
    })
}
