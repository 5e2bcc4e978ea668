//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each repository command handler:
//! 1. Loads the configuration and selects repositories
//! 2. Runs one [`Mirror`] pipeline per repository on the worker pool
//! 3. Formats and displays output in configuration order
//!
//! A failing repository is reported and counted; the others still run.
//! The handler fails at the end if any repository failed or was blocked.

mod completion;
mod list;
mod pull;
mod push;
mod status;

pub use completion::completion;
pub use list::list;
pub use pull::pull;
pub use push::push;
pub use status::status;

use crate::cli::args::Command;
use crate::core::config::RepoEntry;
use crate::core::paths::CachePaths;
use crate::core::types::RepoName;
use crate::engine::{run_all, Context, Mirror, SyncError};
use crate::git::Transport;
use anyhow::{bail, Context as _, Result};
use serde::Serialize;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::List => list::list(ctx),
        Command::Pull { repos } => pull::pull(ctx, &repos),
        Command::Status { repos, json } => status::status(ctx, &repos, json),
        Command::Push {
            repos,
            force,
            dry_run,
            json,
        } => push::push(ctx, &repos, force, dry_run, json),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Repositories chosen for one command, with everything a pipeline needs.
struct Selection {
    repos: Vec<RepoEntry>,
    paths: CachePaths,
    namespace: String,
    jobs: usize,
}

fn select(ctx: &Context, names: &[String]) -> Result<Selection> {
    let config = ctx.load_config().context("Failed to load configuration")?;
    let repos = config.select(names)?;
    if repos.is_empty() {
        bail!("No repositories configured. Add [[repos]] entries to your config file.");
    }

    Ok(Selection {
        paths: CachePaths::new(config.cache_dir()?),
        namespace: config.dest_namespace().to_string(),
        jobs: ctx.jobs(&config),
        repos,
    })
}

/// Per-repository result, in configuration order.
type RepoResult<R> = (RepoName, Result<R, String>);

fn run_pipelines<R, F>(selection: Selection, f: F) -> Vec<RepoResult<R>>
where
    R: Send + 'static,
    F: Fn(&Mirror) -> Result<R, SyncError> + Send + Sync + 'static,
{
    let Selection {
        repos,
        paths,
        namespace,
        jobs,
    } = selection;
    let names: Vec<RepoName> = repos.iter().map(|r| r.name.clone()).collect();

    let results = run_all(repos, jobs, move |entry| -> Result<R, SyncError> {
        let mirror = Mirror::open(&paths, &entry, &namespace, Transport::default())?;
        f(&mirror)
    });

    names
        .into_iter()
        .zip(results)
        .map(|(name, result)| {
            let result = match result {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(e)) => Err(e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            (name, result)
        })
        .collect()
}

/// JSON entry for one repository: its report, or its error.
#[derive(Serialize)]
#[serde(untagged)]
enum JsonEntry<'a, T: Serialize> {
    Report(&'a T),
    Failed { repo: &'a RepoName, error: &'a str },
}

fn print_json<R: Serialize>(results: &[RepoResult<R>]) -> Result<()> {
    let entries: Vec<JsonEntry<'_, R>> = results
        .iter()
        .map(|(repo, result)| match result {
            Ok(report) => JsonEntry::Report(report),
            Err(error) => JsonEntry::Failed { repo, error },
        })
        .collect();
    println!("{}", crate::ui::report::to_json(&entries)?);
    Ok(())
}

/// Turn failure and block counts into the command's result.
fn finish(failed: usize, blocked: usize) -> Result<()> {
    match (failed, blocked) {
        (0, 0) => Ok(()),
        (failed, 0) => bail!("{} {} failed", failed, repositories(failed)),
        (0, blocked) => bail!("push blocked for {} {}", blocked, repositories(blocked)),
        (failed, blocked) => bail!(
            "{} {} failed, push blocked for {}",
            failed,
            repositories(failed),
            blocked
        ),
    }
}

fn repositories(n: usize) -> &'static str {
    if n == 1 {
        "repository"
    } else {
        "repositories"
    }
}
