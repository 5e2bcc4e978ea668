//! list command - Show configured repositories

use crate::engine::Context;
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

/// List configured repositories in configuration order.
pub fn list(ctx: &Context) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let config = ctx.load_config().context("Failed to load configuration")?;

    match config.loaded_from() {
        Some(path) => output::println(format!("# {}", path.display()), verbosity),
        None => {
            output::warn("no config file found", verbosity);
            return Ok(());
        }
    }

    if config.repos().is_empty() {
        output::println("no repositories configured", verbosity);
        return Ok(());
    }

    for repo in config.repos() {
        // Names are the one thing scripts need, so they survive --quiet.
        println!("{}", repo.name);
        output::println(format!("  public:  {}", repo.public), verbosity);
        output::println(format!("  private: {}", repo.private), verbosity);
    }

    Ok(())
}
