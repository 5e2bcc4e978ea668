//! git::transport
//!
//! Network side effects: clone, fetch and push.
//!
//! These shell out to the `git` CLI, which brings credential helpers, SSH
//! configuration and protocol support for free. Every call blocks until
//! the git process exits. Nothing here interprets refs; that is the job of
//! [`super::Git`] and the classifier.
//!
//! # Refspecs
//!
//! Only branches and tags are ever transferred:
//! - source fetch: `refs/heads/*` and `refs/tags/*` into the same names
//! - destination fetch: into `refs/remotes/<namespace>/{heads,tags}/*`
//! - push: one explicit refspec per changed reference, atomically, each
//!   guarded by `--force-with-lease` on the value last fetched from the
//!   destination. Nothing is ever deleted.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

/// Errors from transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The git executable could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// git exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Runs git transport commands.
#[derive(Debug, Clone)]
pub struct Transport {
    program: PathBuf,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new("git")
    }
}

impl Transport {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Clone `url` as a bare mirror into `dir`.
    pub fn clone_mirror(&self, url: &str, dir: &Path) -> Result<(), TransportError> {
        let dir_arg = dir.as_os_str();
        self.run(
            None,
            [
                OsStr::new("clone"),
                OsStr::new("--mirror"),
                OsStr::new("--quiet"),
                OsStr::new("--"),
                OsStr::new(url),
                dir_arg,
            ],
        )
    }

    /// Update the mirror's branches and tags from the public upstream,
    /// pruning refs deleted upstream.
    pub fn fetch_source(&self, dir: &Path, url: &str) -> Result<(), TransportError> {
        self.run(
            Some(dir),
            [
                "fetch",
                "--prune",
                "--quiet",
                url,
                "+refs/heads/*:refs/heads/*",
                "+refs/tags/*:refs/tags/*",
            ]
            .map(OsStr::new),
        )
    }

    /// Fetch the destination's branches and tags into
    /// `refs/remotes/<namespace>/`.
    pub fn fetch_dest(&self, dir: &Path, url: &str, namespace: &str) -> Result<(), TransportError> {
        let [heads, tags] = dest_refspecs(namespace);
        self.run(
            Some(dir),
            [
                "fetch",
                "--prune",
                "--no-tags",
                "--quiet",
                url,
                heads.as_str(),
                tags.as_str(),
            ]
            .map(OsStr::new),
        )
    }

    /// Push `updates` to `url` in one atomic operation.
    ///
    /// Every update carries a lease: the destination must still hold the
    /// expected value (or lack the ref entirely), otherwise the whole push
    /// is rejected. With the lease satisfied git accepts the update even
    /// when it is not a fast-forward, which is what moves existing tags.
    /// References not listed are left alone.
    pub fn push(&self, dir: &Path, url: &str, updates: &[RefUpdate]) -> Result<(), TransportError> {
        if updates.is_empty() {
            debug!(url, "no references to push");
            return Ok(());
        }

        let leases: Vec<String> = updates.iter().map(RefUpdate::lease).collect();
        let refspecs: Vec<String> = updates.iter().map(RefUpdate::refspec).collect();

        let mut args = vec![OsStr::new("push"), OsStr::new("--atomic"), OsStr::new("--quiet")];
        args.extend(leases.iter().map(OsStr::new));
        args.push(OsStr::new(url));
        args.extend(refspecs.iter().map(OsStr::new));
        self.run(Some(dir), args)
    }

    fn run<'a>(
        &self,
        cwd: Option<&Path>,
        args: impl IntoIterator<Item = &'a OsStr>,
    ) -> Result<(), TransportError> {
        let args: Vec<&OsStr> = args.into_iter().collect();
        let command_line = describe(&self.program, &args);

        let mut cmd = Command::new(&self.program);
        if let Some(dir) = cwd {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(&args).env("GIT_TERMINAL_PROMPT", "0");

        debug!(command = %command_line, "running git");
        let output = cmd.output().map_err(|e| TransportError::Spawn {
            program: self.program.display().to_string(),
            source: e,
        })?;

        if output.status.success() {
            return Ok(());
        }

        Err(TransportError::Failed {
            command: command_line,
            status: output
                .status
                .code()
                .map(|c| format!("exit {c}"))
                .unwrap_or_else(|| "killed".to_string()),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// One reference to write at the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    /// Full ref name, identical on both sides (`refs/heads/main`).
    pub name: String,
    /// Raw object id the destination must still hold, or `None` when the
    /// ref must not exist there yet.
    pub expect: Option<String>,
}

impl RefUpdate {
    fn lease(&self) -> String {
        format!(
            "--force-with-lease={}:{}",
            self.name,
            self.expect.as_deref().unwrap_or("")
        )
    }

    fn refspec(&self) -> String {
        format!("{0}:{0}", self.name)
    }
}

/// `refs/remotes/<namespace>/<kind>/` for destination refs.
pub fn dest_prefix(namespace: &str, kind: &str) -> String {
    format!("refs/remotes/{namespace}/{kind}/")
}

fn dest_refspecs(namespace: &str) -> [String; 2] {
    ["heads", "tags"].map(|kind| format!("+refs/{kind}/*:{}*", dest_prefix(namespace, kind)))
}

fn describe(program: &Path, args: &[&OsStr]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dest_prefix_layout() {
        assert_eq!(dest_prefix("private", "heads"), "refs/remotes/private/heads/");
        assert_eq!(dest_prefix("m", "tags"), "refs/remotes/m/tags/");
    }

    #[test]
    fn dest_refspecs_are_wildcards() {
        assert_eq!(
            dest_refspecs("private"),
            [
                "+refs/heads/*:refs/remotes/private/heads/*",
                "+refs/tags/*:refs/remotes/private/tags/*",
            ]
        );
    }

    #[test]
    fn update_lease_and_refspec() {
        let moved = RefUpdate {
            name: "refs/tags/v1".to_string(),
            expect: Some("ab".repeat(20)),
        };
        assert_eq!(
            moved.lease(),
            format!("--force-with-lease=refs/tags/v1:{}", "ab".repeat(20))
        );
        assert_eq!(moved.refspec(), "refs/tags/v1:refs/tags/v1");

        let created = RefUpdate {
            name: "refs/heads/main".to_string(),
            expect: None,
        };
        assert_eq!(created.lease(), "--force-with-lease=refs/heads/main:");
    }

    #[test]
    fn empty_push_runs_nothing() {
        let transport = Transport::new("/nonexistent/git-binary");
        let dir = tempfile::TempDir::new().unwrap();
        assert!(transport.push(dir.path(), "file:///nowhere", &[]).is_ok());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let transport = Transport::new("/nonexistent/git-binary");
        let dir = tempfile::TempDir::new().unwrap();
        let err = transport.fetch_source(dir.path(), "file:///nowhere").unwrap_err();
        assert!(matches!(err, TransportError::Spawn { .. }));
    }

    #[test]
    fn failed_command_reports_stderr() {
        let transport = Transport::default();
        let dir = tempfile::TempDir::new().unwrap();
        let err = transport
            .clone_mirror(
                &dir.path().join("does-not-exist").display().to_string(),
                &dir.path().join("out.git"),
            )
            .unwrap_err();
        match err {
            TransportError::Failed { command, stderr, .. } => {
                assert!(command.contains("clone --mirror"));
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
