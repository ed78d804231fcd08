//! Stable identifiers for named expressions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Identifier of a named expression (an alias or an attribute reference).
///
/// Ids are assigned once, during analysis, and are globally unique within a
/// plan. They are what distinguishes two attributes that happen to share a
/// name, and they survive every optimizer rewrite: a rule may drop or move a
/// named expression but never mint a fresh id or conflate two distinct ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ExpressionId(u64);

impl ExpressionId {
    /// Create an id from its raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic source of fresh `ExpressionId`s.
///
/// The analyzer owns one per resolution session; plan builders and tests mint
/// their ids from a local instance.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Create a generator starting at id 0.
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Produce the next unused id.
    pub fn next_id(&self) -> ExpressionId {
        ExpressionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let gen = IdGenerator::new();
        assert_eq!(gen.next_id(), ExpressionId::new(0));
        assert_eq!(gen.next_id(), ExpressionId::new(1));
        assert_eq!(gen.next_id(), ExpressionId::new(2));
    }

    #[test]
    fn test_display_and_raw() {
        assert_eq!(ExpressionId::new(7).to_string(), "#7");
        assert_eq!(ExpressionId::new(7).raw(), 7);
    }
}
