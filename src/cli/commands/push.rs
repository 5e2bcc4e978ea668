//! push command - Gated mirror push
//!
//! # Safety
//!
//! A push only happens when the comparison finds nothing behind or
//! diverged, unless `--force` is given. Blocked repositories are always
//! printed, even with `--quiet`, and make the command fail.

use super::{finish, print_json, run_pipelines, select};
use crate::engine::{Context, PushOptions, PushOutcome};
use crate::ui::output::{self, Verbosity};
use crate::ui::report::render_push;
use anyhow::Result;

/// Push each selected repository whose verdict allows it.
pub fn push(ctx: &Context, repos: &[String], force: bool, dry_run: bool, json: bool) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let selection = select(ctx, repos)?;

    if force && !dry_run {
        output::warn(
            "--force skips the safety check; private-only commits may be discarded",
            verbosity,
        );
    }

    let options = PushOptions { force, dry_run };
    let results = run_pipelines(selection, move |mirror| mirror.push(options));

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    let blocked = results
        .iter()
        .filter(|(_, r)| matches!(r, Ok(report) if matches!(report.outcome, PushOutcome::Blocked { .. })))
        .count();

    if json {
        print_json(&results)?;
        return finish(failed, blocked);
    }

    for (name, result) in &results {
        match result {
            Ok(report) if matches!(report.outcome, PushOutcome::Blocked { .. }) => {
                print!("{}", render_push(report));
            }
            Ok(report) => output::print(render_push(report), verbosity),
            Err(e) => output::repo_error(name, e),
        }
    }

    finish(failed, blocked)
}
