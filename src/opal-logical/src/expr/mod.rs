//! Expression system for Opal logical planning.
//!
//! Expressions are the smallest semantic units attached to plan operators:
//! filter predicates, projection lists, join conditions, limit counts. They
//! are pure, typed, and side-effect free; after analysis every attribute
//! reference carries a stable [`ExpressionId`](opal_core::ExpressionId) and a
//! data type, and the optimizer rewrites them without ever minting new ids.
//!
//! # Expression Categories
//!
//! - **Literal**: constant values (`Int64(42)`, `String("hello")`)
//! - **Attribute**: resolved column references with stable identity
//! - **Binary / Unary**: arithmetic, comparison, and boolean operators
//! - **Conditional**: `If` and `Coalesce`
//! - **Cast / Alias**: type conversion and renaming
//!
//! # Example
//!
//! ```rust
//! use opal_core::{DataType, IdGenerator};
//! use opal_logical::expr::{lit, AttributeRef};
//!
//! let ids = IdGenerator::new();
//! let age = AttributeRef::new(ids.next_id(), "age", DataType::Int64, false);
//!
//! // age > 18 AND age <= 65
//! let predicate = age
//!     .to_expr()
//!     .gt(lit(18i64))
//!     .and(age.to_expr().lt_eq(lit(65i64)));
//!
//! assert!(predicate.is_resolved());
//! assert!(predicate.is_well_typed());
//! ```

mod attribute;
mod binary;
mod eval;
mod expression;
mod predicate;
mod unary;

pub use attribute::AttributeRef;
pub use binary::BinaryOp;
pub use eval::evaluate;
pub use expression::Expr;
pub use predicate::{conjoin, inline_aliases, split_conjunction, to_cnf};
pub use unary::UnaryOp;

use opal_core::Value;

/// Create a literal expression from a Rust value.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::literal(value.into())
}

/// Create an unresolved column reference, the form the parser emits before
/// analysis binds it to an [`AttributeRef`].
pub fn col(name: impl Into<String>) -> Expr {
    Expr::UnresolvedAttribute {
        name: name.into(),
        qualifier: None,
    }
}

/// Create an unresolved qualified column reference (`relation.column`).
pub fn qualified_col(qualifier: impl Into<String>, name: impl Into<String>) -> Expr {
    Expr::UnresolvedAttribute {
        name: name.into(),
        qualifier: Some(qualifier.into()),
    }
}
