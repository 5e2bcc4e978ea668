//! engine::mirror
//!
//! The per-repository pipeline.
//!
//! A [`Mirror`] owns one configured repository for the duration of a
//! command: its cache directory, its lock and its transport. Inventories
//! can only be obtained through [`Mirror::refresh`], which always fetches
//! both sides first, so a classification is never computed from stale refs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::classify::{classify, ClassifyError, Comparison, RefStatus};
use crate::core::config::RepoEntry;
use crate::core::inventory::Inventory;
use crate::core::lock::{LockError, MirrorLock};
use crate::core::paths::CachePaths;
use crate::core::types::{Fingerprint, RefKind, RepoName};
use crate::core::verdict::{aggregate, decide, BlockingReason, PushDecision, SyncVerdict};
use crate::git::{dest_prefix, Git, GitError, RefUpdate, Transport, TransportError};

/// Errors from a repository pipeline.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// The public refs moved between classification and push.
    #[error("public refs changed since they were compared (was {expected}, now {found}); run the command again")]
    SnapshotChanged {
        expected: Fingerprint,
        found: Fingerprint,
    },
}

/// What [`Mirror::pull`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PullOutcome {
    /// The mirror did not exist and was cloned.
    Cloned,
    /// The existing mirror was updated.
    Fetched,
}

/// Both inventories, read right after a fetch.
///
/// Only [`Mirror::refresh`] constructs one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    source: Inventory,
    dest: Inventory,
}

impl Snapshot {
    /// References at the public upstream.
    pub fn source(&self) -> &Inventory {
        &self.source
    }

    /// References at the private destination.
    pub fn dest(&self) -> &Inventory {
        &self.dest
    }
}

/// The classification report for one repository.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub repo: RepoName,
    #[serde(rename = "refs")]
    pub comparison: Comparison,
    pub verdict: SyncVerdict,
    pub source_fingerprint: Fingerprint,
    pub dest_fingerprint: Fingerprint,
    pub checked_at: DateTime<Utc>,
}

/// Push behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions {
    /// Skip the safety check and force-update differing refs.
    pub force: bool,
    /// Decide, but do not transfer anything.
    pub dry_run: bool,
}

/// What a push attempt did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PushOutcome {
    /// The destination was updated.
    Pushed { forced: bool },
    /// Nothing to transfer. References deleted from public may still be
    /// reported; they are kept on private.
    UpToDate,
    /// The verdict forbade the push.
    Blocked { reasons: Vec<BlockingReason> },
    /// A push would have happened.
    DryRun { forced: bool },
}

/// A push outcome together with the classification it was based on.
#[derive(Debug, Clone, Serialize)]
pub struct PushReport {
    pub status: StatusReport,
    #[serde(flatten)]
    pub outcome: PushOutcome,
}

/// One repository's mirror, locked for the lifetime of this value.
#[derive(Debug)]
pub struct Mirror {
    entry: RepoEntry,
    dir: PathBuf,
    namespace: String,
    transport: Transport,
    _lock: MirrorLock,
}

impl Mirror {
    /// Lock the repository's mirror.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process is working on it
    pub fn open(
        paths: &CachePaths,
        entry: &RepoEntry,
        namespace: &str,
        transport: Transport,
    ) -> Result<Self, SyncError> {
        let lock = MirrorLock::acquire(paths, &entry.name)?;
        debug!(repo = %entry.name, lock = %lock.path().display(), "acquired mirror lock");

        Ok(Self {
            entry: entry.clone(),
            dir: paths.mirror_dir(&entry.name),
            namespace: namespace.to_string(),
            transport,
            _lock: lock,
        })
    }

    pub fn name(&self) -> &RepoName {
        &self.entry.name
    }

    /// The bare mirror directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Bring the local mirror up to date with the public upstream.
    ///
    /// Clones when the mirror does not exist yet, fetches otherwise.
    pub fn pull(&self) -> Result<PullOutcome, SyncError> {
        if self.dir.exists() {
            info!(repo = %self.entry.name, "fetching from public");
            self.transport.fetch_source(&self.dir, &self.entry.public)?;
            Ok(PullOutcome::Fetched)
        } else {
            info!(repo = %self.entry.name, dir = %self.dir.display(), "cloning mirror");
            self.transport.clone_mirror(&self.entry.public, &self.dir)?;
            Ok(PullOutcome::Cloned)
        }
    }

    /// Fetch both sides and read their inventories.
    pub fn refresh(&self) -> Result<Snapshot, SyncError> {
        self.pull()?;

        info!(repo = %self.entry.name, namespace = %self.namespace, "fetching from private");
        self.transport
            .fetch_dest(&self.dir, &self.entry.private, &self.namespace)?;

        let git = self.git()?;
        let source = read_source(&git)?;
        let dest = git.read_inventory(
            &dest_prefix(&self.namespace, RefKind::Branch.namespace()),
            &dest_prefix(&self.namespace, RefKind::Tag.namespace()),
        )?;
        debug!(
            repo = %self.entry.name,
            source = source.len(),
            dest = dest.len(),
            "read inventories"
        );

        Ok(Snapshot { source, dest })
    }

    /// Classify every reference and compute the verdict.
    pub fn status(&self) -> Result<StatusReport, SyncError> {
        let snapshot = self.refresh()?;
        let git = self.git()?;

        let comparison = classify(&snapshot.source, &snapshot.dest, &git)?;
        let verdict = aggregate(comparison.records());
        info!(
            repo = %self.entry.name,
            can_push = verdict.can_push,
            has_changes = verdict.has_changes,
            "classified"
        );

        Ok(StatusReport {
            repo: self.entry.name.clone(),
            comparison,
            verdict,
            source_fingerprint: snapshot.source.fingerprint(),
            dest_fingerprint: snapshot.dest.fingerprint(),
            checked_at: Utc::now(),
        })
    }

    /// Classify, decide, and push when the decision allows it.
    pub fn push(&self, options: PushOptions) -> Result<PushReport, SyncError> {
        let status = self.status()?;
        self.push_classified(status, options)
    }

    fn push_classified(
        &self,
        status: StatusReport,
        options: PushOptions,
    ) -> Result<PushReport, SyncError> {
        let outcome = match decide(&status.verdict, options.force) {
            PushDecision::Blocked(reasons) => {
                warn!(repo = %self.entry.name, reasons = reasons.len(), "push blocked");
                PushOutcome::Blocked { reasons }
            }
            PushDecision::UpToDate => PushOutcome::UpToDate,
            PushDecision::Proceed => {
                let forced = options.force && !status.verdict.can_push;
                let updates = self.plan(&status.comparison, options.force)?;
                if updates.is_empty() {
                    info!(repo = %self.entry.name, "only refs deleted from public differ");
                    PushOutcome::UpToDate
                } else if options.dry_run {
                    PushOutcome::DryRun { forced }
                } else {
                    self.ensure_unchanged(&status.source_fingerprint)?;
                    info!(repo = %self.entry.name, refs = updates.len(), forced, "pushing to private");
                    self.transport
                        .push(&self.dir, &self.entry.private, &updates)?;
                    PushOutcome::Pushed { forced }
                }
            }
        };

        Ok(PushReport { status, outcome })
    }

    /// The references to write at the destination.
    ///
    /// `ahead` and `new` always; `behind` and `diverged` only under the
    /// override. Each update is leased on the destination value fetched by
    /// [`Mirror::refresh`], so a destination that moved since then rejects
    /// the whole push.
    fn plan(&self, comparison: &Comparison, force: bool) -> Result<Vec<RefUpdate>, SyncError> {
        let git = self.git()?;
        let mut updates = Vec::new();

        for record in comparison.records() {
            let transfer = match record.status {
                RefStatus::Ahead { .. } | RefStatus::New { .. } => true,
                RefStatus::Behind { .. } | RefStatus::Diverged { .. } => force,
                RefStatus::Same { .. } | RefStatus::Missing { .. } => false,
            };
            if !transfer {
                continue;
            }

            let tracking = format!(
                "{}{}",
                dest_prefix(&self.namespace, record.kind().namespace()),
                record.name()
            );
            let expect = match record.status {
                RefStatus::New { .. } => None,
                _ => git.ref_target(&tracking)?.map(String::from),
            };
            updates.push(RefUpdate {
                name: record.id.full_name(),
                expect,
            });
        }

        Ok(updates)
    }

    fn ensure_unchanged(&self, expected: &Fingerprint) -> Result<(), SyncError> {
        let found = read_source(&self.git()?)?.fingerprint();
        if &found != expected {
            return Err(SyncError::SnapshotChanged {
                expected: expected.clone(),
                found,
            });
        }
        Ok(())
    }

    fn git(&self) -> Result<Git, SyncError> {
        Ok(Git::open(&self.dir)?)
    }
}

fn read_source(git: &Git) -> Result<Inventory, GitError> {
    git.read_inventory("refs/heads/", "refs/tags/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RefId;
    use std::process::Command;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(["-c", "commit.gpgsign=false", "-c", "tag.gpgsign=false"])
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "Test")
            .env("GIT_AUTHOR_EMAIL", "test@example.com")
            .env("GIT_COMMITTER_NAME", "Test")
            .env("GIT_COMMITTER_EMAIL", "test@example.com")
            .status()
            .expect("failed to run git");
        assert!(status.success(), "git {:?} failed", args);
    }

    struct Fixture {
        _temp: TempDir,
        upstream: PathBuf,
        private: PathBuf,
        paths: CachePaths,
        entry: RepoEntry,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        let private = temp.path().join("private.git");
        std::fs::create_dir_all(&upstream).unwrap();
        std::fs::create_dir_all(&private).unwrap();

        git(&upstream, &["init", "-q", "-b", "main"]);
        git(&upstream, &["commit", "-q", "--allow-empty", "-m", "one"]);
        git(&private, &["init", "-q", "--bare"]);

        let entry = RepoEntry {
            name: RepoName::new("widget").unwrap(),
            public: upstream.display().to_string(),
            private: private.display().to_string(),
        };
        let paths = CachePaths::new(temp.path().join("cache"));
        Fixture {
            _temp: temp,
            upstream,
            private,
            paths,
            entry,
        }
    }

    fn rev(dir: &Path, rev: &str) -> String {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", rev])
            .current_dir(dir)
            .output()
            .expect("failed to run git");
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    fn open(fx: &Fixture) -> Mirror {
        Mirror::open(&fx.paths, &fx.entry, "private", Transport::default()).unwrap()
    }

    #[test]
    fn second_open_is_locked_out() {
        let fx = fixture();
        let _held = open(&fx);
        let err = Mirror::open(&fx.paths, &fx.entry, "private", Transport::default()).unwrap_err();
        assert!(matches!(err, SyncError::Lock(LockError::AlreadyLocked(_))));
    }

    #[test]
    fn pull_clones_then_fetches() {
        let fx = fixture();
        let mirror = open(&fx);
        assert_eq!(mirror.pull().unwrap(), PullOutcome::Cloned);
        assert_eq!(mirror.pull().unwrap(), PullOutcome::Fetched);
        assert!(mirror.dir().ends_with("widget.git"));
    }

    #[test]
    fn empty_destination_is_all_new() {
        let fx = fixture();
        let mirror = open(&fx);
        let report = mirror.status().unwrap();

        assert_eq!(report.comparison.counts().new, 1);
        assert!(report.verdict.can_push);
        assert!(report.verdict.has_changes);
    }

    #[test]
    fn push_then_up_to_date() {
        let fx = fixture();
        let mirror = open(&fx);

        let first = mirror.push(PushOptions::default()).unwrap();
        assert_eq!(first.outcome, PushOutcome::Pushed { forced: false });

        let second = mirror.push(PushOptions::default()).unwrap();
        assert_eq!(second.outcome, PushOutcome::UpToDate);
        assert!(second.status.verdict.is_clean());
    }

    #[test]
    fn dry_run_transfers_nothing() {
        let fx = fixture();
        let mirror = open(&fx);

        let report = mirror
            .push(PushOptions {
                dry_run: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(report.outcome, PushOutcome::DryRun { forced: false });

        let after = mirror.status().unwrap();
        assert_eq!(after.comparison.counts().new, 1);
    }

    #[test]
    fn source_fingerprint_tracks_upstream() {
        let fx = fixture();
        let mirror = open(&fx);
        let before = mirror.status().unwrap().source_fingerprint;

        git(&fx.upstream, &["commit", "-q", "--allow-empty", "-m", "two"]);
        let after = mirror.status().unwrap().source_fingerprint;
        assert_ne!(before, after);
    }

    #[test]
    fn moved_tag_is_pushed_with_branches() {
        let fx = fixture();
        git(&fx.upstream, &["tag", "v1"]);
        let mirror = open(&fx);
        mirror.push(PushOptions::default()).unwrap();

        git(&fx.upstream, &["commit", "-q", "--allow-empty", "-m", "two"]);
        git(&fx.upstream, &["tag", "-f", "v1"]);

        let report = mirror.push(PushOptions::default()).unwrap();
        let tag = report.status.comparison.get(&RefId::tag("v1").unwrap()).unwrap();
        assert_eq!(tag.status.ahead_count(), Some(1));
        assert_eq!(report.outcome, PushOutcome::Pushed { forced: false });

        assert_eq!(rev(&fx.private, "refs/tags/v1"), rev(&fx.upstream, "refs/tags/v1"));
        assert_eq!(rev(&fx.private, "refs/heads/main"), rev(&fx.upstream, "refs/heads/main"));
    }

    #[test]
    fn mirror_moving_after_classification_aborts_push() {
        let fx = fixture();
        let mirror = open(&fx);
        let status = mirror.status().unwrap();

        // Another writer touches the cache behind the lock.
        let head = rev(mirror.dir(), "refs/heads/main");
        git(mirror.dir(), &["update-ref", "refs/heads/stray", &head]);

        let err = mirror
            .push_classified(status, PushOptions::default())
            .unwrap_err();
        assert!(matches!(err, SyncError::SnapshotChanged { .. }));
        assert!(rev(&fx.private, "refs/heads/main").is_empty());
    }

    #[test]
    fn destination_moving_after_classification_rejects_push() {
        let fx = fixture();
        let mirror = open(&fx);
        mirror.push(PushOptions::default()).unwrap();

        git(&fx.upstream, &["commit", "-q", "--allow-empty", "-m", "two"]);
        let status = mirror.status().unwrap();
        assert!(status.verdict.can_push);

        // Private gains a commit between status and push.
        let private = fx.private.display().to_string();
        git(&fx.upstream, &["checkout", "-q", "-b", "hotfix", "main~1"]);
        git(&fx.upstream, &["commit", "-q", "--allow-empty", "-m", "hotfix"]);
        git(&fx.upstream, &["push", "-q", &private, "hotfix:refs/heads/main"]);
        let hotfix = rev(&fx.upstream, "hotfix");

        let err = mirror
            .push_classified(status, PushOptions::default())
            .unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
        assert_eq!(rev(&fx.private, "refs/heads/main"), hotfix);
    }

    #[test]
    fn only_deleted_refs_is_up_to_date() {
        let fx = fixture();
        git(&fx.upstream, &["branch", "old"]);
        let mirror = open(&fx);
        mirror.push(PushOptions::default()).unwrap();

        git(&fx.upstream, &["branch", "-D", "old"]);
        let report = mirror.push(PushOptions::default()).unwrap();
        assert_eq!(report.status.comparison.counts().missing, 1);
        assert!(report.status.verdict.has_changes);
        assert_eq!(report.outcome, PushOutcome::UpToDate);
        assert!(!rev(&fx.private, "refs/heads/old").is_empty());
    }
}
