//! ui::report
//!
//! Rendering of status and push reports.
//!
//! # Format
//!
//! Only references that differ are listed, grouped by kind:
//!
//! ```text
//! widget
//!   Branches:
//!     main: 4f2a9c1 → 9b03e7d (+2 commits)
//!     ⚠ release: 77c0d12 ahead by 1
//!   Tags:
//!     v1.2.0: new
//!   14 unchanged
//!   push blocked:
//!     - private has commits not in public (1 ref)
//! ```

use std::fmt::Write;

use serde::Serialize;

use crate::core::classify::{RefRecord, RefStatus};
use crate::core::types::{RefKind, RepoName};
use crate::engine::{PullOutcome, PushOutcome, PushReport, StatusReport};

/// Abbreviated object id length in reports.
pub const SHORT_OID: usize = 7;

const WARNING: &str = "⚠";

/// Render one record, or `None` for `same`.
pub fn render_record(record: &RefRecord) -> Option<String> {
    let name = record.name();
    let line = match &record.status {
        RefStatus::Same { .. } => return None,
        RefStatus::Ahead {
            source,
            dest,
            commits,
        } => format!(
            "{}: {} → {} (+{} commit{})",
            name,
            source.short(SHORT_OID),
            dest.short(SHORT_OID),
            commits,
            if *commits == 1 { "" } else { "s" }
        ),
        RefStatus::Behind { dest, commits, .. } => format!(
            "{} {}: {} ahead by {}",
            WARNING,
            name,
            dest.short(SHORT_OID),
            commits
        ),
        RefStatus::Diverged { .. } => format!("{} {}: diverged", WARNING, name),
        RefStatus::New { .. } => format!("{}: new", name),
        RefStatus::Missing { .. } => format!("{}: deleted from public", name),
    };
    Some(line)
}

/// Render a full status report for one repository.
pub fn render_status(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.repo);
    out.push_str(&render_body(report));
    out
}

fn render_body(report: &StatusReport) -> String {
    let mut out = String::new();

    if report.comparison.records().is_empty() {
        let _ = writeln!(out, "  no branches or tags on either side");
    }

    for (kind, records) in report.comparison.by_kind() {
        let lines: Vec<String> = records.iter().filter_map(|r| render_record(r)).collect();
        if lines.is_empty() {
            continue;
        }
        let _ = writeln!(out, "  {}:", section_title(kind));
        for line in lines {
            let _ = writeln!(out, "    {}", line);
        }
    }

    let unchanged = report.comparison.counts().same;
    if unchanged > 0 {
        let _ = writeln!(out, "  {} unchanged", unchanged);
    }

    let verdict = &report.verdict;
    if !verdict.can_push {
        let _ = writeln!(out, "  push blocked:");
        for reason in &verdict.blocking_reasons {
            let _ = writeln!(out, "    - {}", reason);
        }
    } else if verdict.has_changes {
        let _ = writeln!(out, "  ready to push");
    } else {
        let _ = writeln!(out, "  up to date");
    }

    out
}

fn section_title(kind: RefKind) -> &'static str {
    match kind {
        RefKind::Branch => "Branches",
        RefKind::Tag => "Tags",
    }
}

/// Render the result of a push attempt.
pub fn render_push(report: &PushReport) -> String {
    let mut out = render_status(&report.status);
    let line = match &report.outcome {
        PushOutcome::Pushed { forced: false } => "pushed to private".to_string(),
        PushOutcome::Pushed { forced: true } => {
            format!("{} force-pushed to private, overriding the safety check", WARNING)
        }
        PushOutcome::UpToDate if report.status.comparison.counts().missing > 0 => {
            "nothing to push; refs deleted from public are kept on private".to_string()
        }
        PushOutcome::UpToDate => "nothing to push".to_string(),
        PushOutcome::Blocked { .. } => "not pushed; use --force to override".to_string(),
        PushOutcome::DryRun { forced: false } => "would push (dry run)".to_string(),
        PushOutcome::DryRun { forced: true } => {
            format!("{} would force-push (dry run)", WARNING)
        }
    };
    let _ = writeln!(out, "  {}", line);
    out
}

/// One-line summary of a pull.
pub fn render_pull(name: &RepoName, outcome: PullOutcome) -> String {
    match outcome {
        PullOutcome::Cloned => format!("{}: cloned", name),
        PullOutcome::Fetched => format!("{}: fetched", name),
    }
}

/// Pretty JSON for machine consumers.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
