//! core
//!
//! Core domain types and the reference comparison engine.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, RefId, RepoName, Fingerprint
//! - [`inventory`] - References observed at one location
//! - [`oracle`] - Ancestry query capability
//! - [`classify`] - Per-reference classification
//! - [`verdict`] - Sync-safety aggregation and push decisions
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Cache directory layout
//! - [`lock`] - Per-repository locking
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Classification and aggregation are pure functions of their inputs
//! - All I/O lives in [`crate::git`] and [`crate::engine`]

pub mod classify;
pub mod config;
pub mod inventory;
pub mod lock;
pub mod oracle;
pub mod paths;
pub mod types;
pub mod verdict;
