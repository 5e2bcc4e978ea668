//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Verbosity-aware print helpers
//! - [`report`] - Status and push report rendering (text and JSON)
//!
//! # Design
//!
//! Everything meant for the operator goes through this module. Diagnostic
//! logging goes through `tracing` instead and lands on stderr.

pub mod output;
pub mod report;
