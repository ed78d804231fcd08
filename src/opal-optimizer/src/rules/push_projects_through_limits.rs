//! Projection/limit reordering.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::tree;
use opal_logical::{Expr, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Reorder `Limit` over `Project` so the limit runs first and projection
/// expressions are evaluated on at most `n` rows. Projections never filter
/// rows in this algebra, so the rewrite fires unconditionally: the output is
/// still the first `n` rows of the original, with the same projection.
///
/// # Example
///
/// Before:
/// ```text
/// Limit (Int64(10))
///   └─ Project ([(b#1 + Int64(1)) AS x#2])
///        └─ Relation (t1)
/// ```
///
/// After:
/// ```text
/// Project ([(b#1 + Int64(1)) AS x#2])
///   └─ Limit (Int64(10))
///        └─ Relation (t1)
/// ```
pub struct PushProjectsThroughLimits;

impl Rule for PushProjectsThroughLimits {
    fn name(&self) -> &'static str {
        "PushProjectsThroughLimits"
    }

    fn description(&self) -> &'static str {
        "Hoist projections above limits so fewer rows are projected"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = tree::transform_up(&plan, &|node: &LogicalPlan| match node {
            LogicalPlan::Limit { input, count } => match input.as_ref() {
                LogicalPlan::Project { .. } => Some(hoist(input, count)),
                _ => None,
            },
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}

/// Sink the limit below a whole chain of projections.
fn hoist(input: &Arc<LogicalPlan>, count: &Arc<Expr>) -> LogicalPlan {
    match input.as_ref() {
        LogicalPlan::Project {
            input: project_input,
            projections,
        } => LogicalPlan::Project {
            input: Arc::new(hoist(project_input, count)),
            projections: projections.clone(),
        },
        _ => LogicalPlan::Limit {
            input: Arc::clone(input),
            count: Arc::clone(count),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_core::{DataType, IdGenerator};
    use opal_logical::expr::lit;
    use opal_logical::PlanBuilder;

    fn t1(ids: &IdGenerator) -> PlanBuilder {
        PlanBuilder::relation(
            "t1",
            &[("a", DataType::Int64), ("b", DataType::Int64)],
            ids,
        )
    }

    #[test]
    fn test_limit_sinks_below_projection() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let b = t1.attr("b");
        let x = ids.next_id();

        let plan = t1
            .clone()
            .project(vec![b.to_expr().add_expr(lit(1i64)).alias("x", x)])
            .limit(10)
            .build();

        let result = PushProjectsThroughLimits.apply(plan).unwrap();
        assert!(result.changed);

        let expected = t1
            .limit(10)
            .project(vec![b.to_expr().add_expr(lit(1i64)).alias("x", x)])
            .build();
        assert_eq!(result.plan, expected);
    }

    #[test]
    fn test_limit_sinks_below_projection_chain_in_one_pass() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let (a, b) = (t1.attr("a"), t1.attr("b"));

        let plan = t1
            .clone()
            .project(vec![a.to_expr(), b.to_expr()])
            .project(vec![a.to_expr()])
            .limit(10)
            .build();

        let result = PushProjectsThroughLimits.apply(plan).unwrap();
        let expected = t1
            .limit(10)
            .project(vec![a.to_expr(), b.to_expr()])
            .project(vec![a.to_expr()])
            .build();
        assert_eq!(result.plan, expected);
    }

    #[test]
    fn test_limit_over_relation_is_untouched() {
        let ids = IdGenerator::new();
        let plan = t1(&ids).limit(10).build();
        let result = PushProjectsThroughLimits.apply(Arc::clone(&plan)).unwrap();

        assert!(!result.changed);
        assert!(Arc::ptr_eq(&result.plan, &plan));
    }
}
