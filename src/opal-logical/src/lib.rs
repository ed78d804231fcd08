//! Logical planning layer for the Opal analytical engine.
//!
//! `opal-logical` provides the canonical logical IR: the expression system
//! and the relational operators the optimizer rewrites.
//!
//! # Overview
//!
//! The logical layer is responsible for:
//!
//! - **Expression System**: typed, pure expressions for predicates,
//!   projections, join conditions, and limit counts
//! - **Logical Operators**: the canonical operator set (Relation, Project,
//!   Filter, Join, Limit, Union, Subquery)
//! - **Plan Building**: a fluent API for constructing resolved plans
//!   programmatically
//!
//! # Key Design Principles
//!
//! 1. **Stable identity**: every named expression carries an `ExpressionId`
//!    assigned at resolution time; rewrites preserve ids and never mint new
//!    ones
//! 2. **Persistent trees**: children are `Arc`-held; a rewrite allocates only
//!    the nodes that change
//! 3. **Purity**: all expressions and operators are deterministic and free of
//!    side effects
//!
//! # Example
//!
//! ```rust
//! use opal_core::{DataType, IdGenerator};
//! use opal_logical::expr::lit;
//! use opal_logical::plan::PlanBuilder;
//!
//! // Build a query: Relation(t1) -> Filter(a > 18) -> Project(a) -> Limit(10)
//! let ids = IdGenerator::new();
//! let t1 = PlanBuilder::relation(
//!     "t1",
//!     &[("a", DataType::Int64), ("b", DataType::Int64)],
//!     &ids,
//! );
//! let a = t1.attr("a");
//!
//! let plan = t1
//!     .filter(a.to_expr().gt(lit(18i64)))
//!     .project(vec![a.to_expr()])
//!     .limit(10)
//!     .build();
//!
//! println!("{}", plan.pretty_tree());
//! ```

pub mod expr;
pub mod plan;
pub mod testing;

// Re-export operator and expression types at crate root for convenience
pub use expr::{AttributeRef, BinaryOp, Expr, UnaryOp};
pub use plan::{JoinType, LogicalPlan, PlanBuilder};
