//! Opal - analytical query engine, logical planning and optimization layers.
//!
//! This crate re-exports the planning-side layers of Opal: the shared core
//! types, the logical plan and expression IR, and the rule-based optimizer.
//! The parser, analyzer, physical planner, and execution runtime live behind
//! their own crate boundaries and consume these layers by contract.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_error as error;
pub use opal_core as core;
pub use opal_logical as logical;
pub use opal_optimizer as optimizer;

/// Opal version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
