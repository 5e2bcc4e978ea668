//! engine
//!
//! Orchestrates the per-repository pipeline: Lock -> Fetch -> Read -> Classify -> Decide -> Push.
//!
//! # Architecture
//!
//! The engine is the only place where I/O and the pure comparison core
//! meet. For each configured repository it:
//!
//! 1. **Lock**: takes the mirror's exclusive lock
//! 2. **Fetch**: updates the local mirror from the public upstream and the
//!    destination refs into a remote-tracking namespace
//! 3. **Read**: reads both inventories from the mirror
//! 4. **Classify**: compares every reference through the ancestry oracle
//! 5. **Decide**: aggregates a verdict and turns it into a push decision
//! 6. **Push**: performs the atomic push, only when the decision allows it
//!
//! # Invariants
//!
//! - Inventories are only ever read immediately after a fetch, under the lock
//! - A push never happens when the source moved after classification
//! - One repository's failure never affects another repository
//!
//! # Example
//!
//! ```ignore
//! use mirrorsync::engine::{Mirror, PushOptions};
//!
//! let mirror = Mirror::open(&paths, &entry, "private", Transport::default())?;
//! let report = mirror.status()?;
//! if report.verdict.can_push {
//!     mirror.push(PushOptions::default())?;
//! }
//! ```

pub mod mirror;
pub mod pool;

pub use mirror::{
    Mirror, PullOutcome, PushOptions, PushOutcome, PushReport, Snapshot, StatusReport, SyncError,
};
pub use pool::{run_all, PoolError};

use std::path::PathBuf;

use tracing::warn;

use crate::core::config::{Config, ConfigError};

/// Execution context passed to commands.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Config file override (`--config`).
    pub config_path: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Worker count override (`--jobs`).
    pub jobs: Option<usize>,
}

impl Context {
    /// Load the configuration this context points at.
    ///
    /// Load warnings are logged, not returned.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let result = Config::load(self.config_path.as_deref())?;
        for warning in &result.warnings {
            match &warning.path {
                Some(path) => warn!(path = %path.display(), "{}", warning.message),
                None => warn!("{}", warning.message),
            }
        }
        Ok(result.config)
    }

    /// Effective worker count: the flag wins over the config file.
    pub fn jobs(&self, config: &Config) -> usize {
        self.jobs.unwrap_or_else(|| config.jobs()).max(1)
    }
}
