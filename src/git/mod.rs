//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. No other module imports
//! `git2` or spawns `git` directly.
//!
//! - [`Git`] (git2) reads refs and answers ancestry queries; it is the
//!   production [`crate::core::oracle::AncestryOracle`] and inventory
//!   provider.
//! - [`Transport`] (git CLI) performs clone, fetch and push.
//!
//! # Invariants
//!
//! - Reads never touch the network
//! - Transport never deletes refs; every pushed ref is leased on the value
//!   last fetched from the destination

mod interface;
mod transport;

pub use interface::{Git, GitError, RefEntry};
pub use transport::{dest_prefix, RefUpdate, Transport, TransportError};
