//! status command - Compare refs and report push safety
//!
//! Read-only with respect to the destination: fetches both sides into the
//! local mirror, classifies, and prints. A blocked verdict is reported but
//! does not fail the command.

use super::{finish, print_json, run_pipelines, select};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};
use crate::ui::report::render_status;
use anyhow::Result;

/// Show the classification report for each selected repository.
pub fn status(ctx: &Context, repos: &[String], json: bool) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let selection = select(ctx, repos)?;

    let results = run_pipelines(selection, |mirror| mirror.status());
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    if json {
        print_json(&results)?;
        return finish(failed, 0);
    }

    for (name, result) in &results {
        match result {
            Ok(report) => output::print(render_status(report), verbosity),
            Err(e) => output::repo_error(name, e),
        }
    }

    finish(failed, 0)
}
