//! mirrorsync - Keep private mirrors in sync with public upstreams
//!
//! mirrorsync maintains a private copy of public git repositories. For each
//! configured repository it fetches both sides, classifies every branch and
//! tag by commit ancestry, and only pushes when doing so cannot discard
//! history that exists solely on the private side.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Per-repository pipeline and the bounded worker pool
//! - [`core`] - Domain types, classification, verdicts, configuration
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Report rendering and output helpers
//!
//! # Correctness Invariants
//!
//! mirrorsync maintains the following invariants:
//!
//! 1. Every reference on either side is classified exactly once
//! 2. No push happens while any reference is behind or diverged, unless forced
//! 3. Pushes are atomic and never delete references on the destination
//! 4. Classification only ever sees freshly fetched inventories

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
