//! pull command - Clone or update local mirrors

use super::{finish, run_pipelines, select};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};
use crate::ui::report::render_pull;
use anyhow::Result;

/// Clone or fetch each selected mirror from its public upstream.
pub fn pull(ctx: &Context, repos: &[String]) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let selection = select(ctx, repos)?;

    let results = run_pipelines(selection, |mirror| mirror.pull());

    let mut failed = 0;
    for (name, result) in &results {
        match result {
            Ok(outcome) => output::println(render_pull(name, *outcome), verbosity),
            Err(e) => {
                failed += 1;
                output::repo_error(name, e);
            }
        }
    }

    finish(failed, 0)
}
