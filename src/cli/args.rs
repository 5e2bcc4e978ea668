//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--jobs` / `-j <n>`: Process up to n repositories at once

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::schema::MAX_JOBS;

/// mirrorsync - Keep private mirrors in sync with public upstreams
#[derive(Parser, Debug)]
#[command(name = "mirrorsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output: only errors and blocked pushes
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Process up to N repositories concurrently (overrides `jobs` in config)
    #[arg(
        short,
        long,
        global = true,
        value_name = "N",
        value_parser = clap::value_parser!(u16).range(1..=MAX_JOBS as i64)
    )]
    pub jobs: Option<u16>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List configured repositories
    #[command(
        name = "list",
        long_about = "List configured repositories.\n\n\
            Shows each repository's name with its public and private URLs, in \
            configuration order, and where the configuration was loaded from.",
        after_help = "\
EXAMPLES:
    # Show what mirrorsync manages
    mirrorsync list

    # Use a specific config file
    mirrorsync --config ./mirrors.toml list"
    )]
    List,

    /// Clone or update local mirrors from their public upstreams
    #[command(
        name = "pull",
        long_about = "Clone or update local mirrors from their public upstreams.\n\n\
            A mirror that does not exist yet is cloned; an existing one is fetched, \
            pruning branches and tags deleted upstream. Nothing is pushed.",
        after_help = "\
EXAMPLES:
    # Update every mirror
    mirrorsync pull

    # Update two mirrors, four at a time
    mirrorsync -j 4 pull widget gadget"
    )]
    Pull {
        /// Repositories to pull (default: all)
        #[arg(value_name = "REPO")]
        repos: Vec<String>,
    },

    /// Compare public and private refs and report whether a push is safe
    #[command(
        name = "status",
        long_about = "Compare public and private refs and report whether a push is safe.\n\n\
            Fetches both sides, then classifies every branch and tag: ahead (public has \
            new commits), behind (private has commits public lacks), diverged, new, \
            deleted from public, or unchanged. Behind and diverged refs block pushing.",
        after_help = "\
EXAMPLES:
    # Check every repository
    mirrorsync status

    # Machine-readable report for one repository
    mirrorsync status widget --json"
    )]
    Status {
        /// Repositories to check (default: all)
        #[arg(value_name = "REPO")]
        repos: Vec<String>,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Push public refs to the private mirror when it is safe
    #[command(
        name = "push",
        long_about = "Push public refs to the private mirror when it is safe.\n\n\
            Runs the same comparison as `status`. When no ref is behind or diverged \
            and something differs, every branch and tag is pushed in one atomic \
            operation. Refs deleted from public are left in place on private.\n\n\
            With --force the safety check is skipped and differing refs are \
            overwritten, discarding private-only commits.",
        after_help = "\
EXAMPLES:
    # Push everything that is safe to push
    mirrorsync push

    # See what would happen without pushing
    mirrorsync push --dry-run

    # Overwrite a diverged mirror with public history
    mirrorsync push widget --force"
    )]
    Push {
        /// Repositories to push (default: all)
        #[arg(value_name = "REPO")]
        repos: Vec<String>,

        /// Skip the safety check and force-update differing refs
        #[arg(long)]
        force: bool,

        /// Decide but do not push
        #[arg(long)]
        dry_run: bool,

        /// Print the reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    mirrorsync completion bash > /etc/bash_completion.d/mirrorsync
    mirrorsync completion zsh > \"${fpath[1]}/_mirrorsync\""
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
