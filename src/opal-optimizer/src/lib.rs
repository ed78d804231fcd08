//! Query optimizer for the Opal analytical engine.
//!
//! `opal-optimizer` rewrites resolved logical plans into semantically
//! equivalent but cheaper ones. It is a pure function from plan to plan:
//! no I/O, no shared mutable state, structure-shared output trees.
//!
//! # Overview
//!
//! The optimizer drives ordered **rule batches** over the plan. Within a
//! batch, rules apply sequentially; the batch repeats until the plan stops
//! changing (or a configured iteration cap is hit, in which case the last
//! plan is accepted with a warning). The shipped configuration is a single
//! `"Optimizations"` batch iterating the whole rule library to an unlimited
//! fixed point.
//!
//! # Implemented Rules
//!
//! Constant folding, boolean simplification, negation normalization, cast
//! and alias reduction, CNF conversion, duplicate predicate elimination,
//! filter and projection merging, subquery elimination, filter pushdown
//! through projections and inner joins, projection/limit reordering, nested
//! limit collapsing, and limit pushdown through unions. See [`rules`].
//!
//! # Example
//!
//! ```rust
//! use opal_core::{DataType, IdGenerator};
//! use opal_logical::expr::lit;
//! use opal_logical::PlanBuilder;
//! use opal_optimizer::optimize;
//!
//! let ids = IdGenerator::new();
//! let t1 = PlanBuilder::relation("t1", &[("a", DataType::Int64)], &ids);
//! let a = t1.attr("a");
//!
//! // (1 + 2) = 3 AND a > 0 simplifies to a > 0
//! let plan = t1
//!     .filter(lit(1i64).add_expr(lit(2i64)).eq(lit(3i64)).and(a.to_expr().gt(lit(0i64))))
//!     .build();
//!
//! let optimized = optimize(plan).unwrap();
//! println!("{}", optimized.plan.pretty_tree());
//! ```
//!
//! # Guarantees
//!
//! For every shipped rule, the rewrite:
//!
//! 1. Preserves row semantics (same bag of rows for any input data)
//! 2. Preserves the output schema (names and types, in order)
//! 3. Preserves attribute identity: no `ExpressionId` is invented or
//!    conflated
//! 4. Preserves resolution and strict typing

pub mod executor;
pub mod rules;

// Re-export commonly used types
pub use executor::{
    ExecutorConfig, OptimizedPlan, Rule, RuleBatch, RuleTrace, RulesExecutor, Strategy,
    Transformed,
};

use std::sync::Arc;

use common_error::OpalResult;
use opal_logical::LogicalPlan;

/// Optimize a resolved plan with the default executor.
pub fn optimize(plan: Arc<LogicalPlan>) -> OpalResult<OptimizedPlan> {
    RulesExecutor::default().execute(plan)
}

/// Optimize a resolved plan with tracing enabled, recording a before/after
/// snapshot for every rule application that changed the plan.
pub fn optimize_with_trace(plan: Arc<LogicalPlan>) -> OpalResult<OptimizedPlan> {
    let config = ExecutorConfig::default().with_trace(true);
    let executor = RulesExecutor::with_config(
        vec![RuleBatch::new(
            "Optimizations",
            Strategy::unlimited(),
            rules::default_rules(),
        )],
        config,
    );
    executor.execute(plan)
}
