//! Display and visualization utilities for Opal.
//!
//! Provides tree-shaped formatting for query plans and expressions.

mod tree;

pub use tree::{DisplayNode, DisplayTree};

/// Indent a multi-line string.
pub fn indent(s: &str, prefix: &str) -> String {
    s.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
