//! core::verdict
//!
//! The sync-safety aggregator.
//!
//! Reduces a set of classified references to a [`SyncVerdict`]: whether an
//! automated mirror push is permitted, whether there is anything to push,
//! and why a push is blocked.
//!
//! # Policy
//!
//! - `behind` blocks. Under one-directional mirroring the destination can
//!   never legitimately hold commits the source lacks, and pushing would
//!   discard them.
//! - `diverged` blocks. Someone has to decide which side is authoritative.
//! - `ahead`, `new` and `missing` are changes. `missing` never blocks.
//!
//! Blocking reasons are reported once per condition class, not once per
//! reference.

use serde::Serialize;

use super::classify::{RefRecord, RefStatus};

/// A class of condition that blocks an automated push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockingReason {
    /// Some references are `behind`: the destination has commits the
    /// source does not.
    DestinationAhead { refs: usize },

    /// Some references are `diverged`.
    Diverged { refs: usize },
}

impl BlockingReason {
    /// Number of references in this class.
    pub fn refs(&self) -> usize {
        match self {
            BlockingReason::DestinationAhead { refs } | BlockingReason::Diverged { refs } => *refs,
        }
    }
}

impl std::fmt::Display for BlockingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockingReason::DestinationAhead { refs } => write!(
                f,
                "private has commits not in public ({} ref{})",
                refs,
                plural(*refs)
            ),
            BlockingReason::Diverged { refs } => write!(
                f,
                "private and public histories have diverged ({} ref{}); decide which side is authoritative",
                refs,
                plural(*refs)
            ),
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Whether a push is permitted and worthwhile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncVerdict {
    /// False iff any reference is `behind` or `diverged`.
    pub can_push: bool,
    /// True iff any reference is `ahead`, `new` or `missing`.
    pub has_changes: bool,
    /// One entry per blocking condition class, destination-ahead first.
    pub blocking_reasons: Vec<BlockingReason>,
}

impl SyncVerdict {
    /// True when every reference is `same`.
    pub fn is_clean(&self) -> bool {
        self.can_push && !self.has_changes
    }
}

/// Aggregate classification records into a verdict.
///
/// # Example
///
/// ```
/// use mirrorsync::core::verdict::aggregate;
///
/// let verdict = aggregate(&[]);
/// assert!(verdict.can_push);
/// assert!(!verdict.has_changes);
/// ```
pub fn aggregate(records: &[RefRecord]) -> SyncVerdict {
    let mut behind = 0;
    let mut diverged = 0;
    let mut has_changes = false;

    for record in records {
        match record.status {
            RefStatus::Behind { .. } => behind += 1,
            RefStatus::Diverged { .. } => diverged += 1,
            RefStatus::Ahead { .. } | RefStatus::New { .. } | RefStatus::Missing { .. } => {
                has_changes = true
            }
            RefStatus::Same { .. } => {}
        }
    }

    let mut blocking_reasons = Vec::new();
    if behind > 0 {
        blocking_reasons.push(BlockingReason::DestinationAhead { refs: behind });
    }
    if diverged > 0 {
        blocking_reasons.push(BlockingReason::Diverged { refs: diverged });
    }

    SyncVerdict {
        can_push: blocking_reasons.is_empty(),
        has_changes,
        blocking_reasons,
    }
}

/// What the push boundary should do with a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushDecision {
    /// Push every reference in one atomic operation.
    Proceed,
    /// Nothing differs; pushing would be a no-op.
    UpToDate,
    /// The verdict forbids an automated push.
    Blocked(Vec<BlockingReason>),
}

/// Decide whether to push.
///
/// Without `force`, any blocking reason wins. With `force` the safety
/// check is skipped, and a push happens whenever any reference differs,
/// including references that only differ by being `behind` or `diverged`.
///
/// # Example
///
/// ```
/// use mirrorsync::core::verdict::{decide, BlockingReason, PushDecision, SyncVerdict};
///
/// let verdict = SyncVerdict {
///     can_push: false,
///     has_changes: false,
///     blocking_reasons: vec![BlockingReason::Diverged { refs: 1 }],
/// };
/// assert!(matches!(decide(&verdict, false), PushDecision::Blocked(_)));
/// assert_eq!(decide(&verdict, true), PushDecision::Proceed);
/// ```
pub fn decide(verdict: &SyncVerdict, force: bool) -> PushDecision {
    if !verdict.can_push && !force {
        return PushDecision::Blocked(verdict.blocking_reasons.clone());
    }
    if verdict.has_changes || !verdict.can_push {
        PushDecision::Proceed
    } else {
        PushDecision::UpToDate
    }
}
