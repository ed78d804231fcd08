//! Filter pushdown through projections.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::tree;
use opal_logical::expr::inline_aliases;
use opal_logical::{Expr, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Push a filter below the projection it sits on, inlining projection aliases
/// into the predicate so it speaks the input's attributes.
///
/// # Legal When
///
/// - Every projection expression is pure: an impure projection must not be
///   re-evaluated a different number of times
///
/// # Example
///
/// Before:
/// ```text
/// Filter ((x#2 > Int64(3)))
///   └─ Project ([(b#1 + Int64(1)) AS x#2])
///        └─ Relation (t1)
/// ```
///
/// After:
/// ```text
/// Project ([(b#1 + Int64(1)) AS x#2])
///   └─ Filter (((b#1 + Int64(1)) > Int64(3)))
///        └─ Relation (t1)
/// ```
pub struct PushFiltersThroughProjects;

impl Rule for PushFiltersThroughProjects {
    fn name(&self) -> &'static str {
        "PushFiltersThroughProjects"
    }

    fn description(&self) -> &'static str {
        "Push filters below pure projections, inlining aliases"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = tree::transform_up(&plan, &|node: &LogicalPlan| match node {
            LogicalPlan::Filter { input, predicate } => push(predicate, input),
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}

/// Push `predicate` through as many stacked pure projections as possible.
fn push(predicate: &Expr, input: &Arc<LogicalPlan>) -> Option<LogicalPlan> {
    match input.as_ref() {
        LogicalPlan::Project {
            input: project_input,
            projections,
        } if projections.iter().all(|projection| projection.is_pure()) => {
            let inlined = inline_aliases(projections, predicate);
            let pushed = match push(&inlined, project_input) {
                Some(deeper) => deeper,
                None => LogicalPlan::filter(Arc::clone(project_input), inlined),
            };
            Some(LogicalPlan::Project {
                input: Arc::new(pushed),
                projections: projections.clone(),
            })
        }
        _ => None,
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
    fn test_filter_pushes_below_projection_with_inlining() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let b = t1.attr("b");
        let x = ids.next_id();

        let projected = t1
            .clone()
            .project(vec![b.to_expr().add_expr(lit(1i64)).alias("x", x)]);
        let x_attr = projected.attr("x");
        let plan = projected.filter(x_attr.to_expr().gt(lit(3i64))).build();

        let result = PushFiltersThroughProjects.apply(plan).unwrap();
        assert!(result.changed);

        let expected = t1
            .filter(b.to_expr().add_expr(lit(1i64)).gt(lit(3i64)))
            .project(vec![b.to_expr().add_expr(lit(1i64)).alias("x", x)])
            .build();
        assert_eq!(result.plan, expected);
    }

    #[test]
    fn test_filter_pushes_through_projection_chain_in_one_pass() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let (a, b) = (t1.attr("a"), t1.attr("b"));

        let plan = t1
            .clone()
            .project(vec![a.to_expr(), b.to_expr()])
            .project(vec![a.to_expr()])
            .filter(a.to_expr().gt(lit(0i64)))
            .build();

        let result = PushFiltersThroughProjects.apply(plan).unwrap();
        let expected = t1
            .filter(a.to_expr().gt(lit(0i64)))
            .project(vec![a.to_expr(), b.to_expr()])
            .project(vec![a.to_expr()])
            .build();
        assert_eq!(result.plan, expected);
    }

    #[test]
    fn test_filter_over_relation_is_untouched() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let a = t1.attr("a");

        let plan = t1.filter(a.to_expr().gt(lit(0i64))).build();
        let result = PushFiltersThroughProjects.apply(Arc::clone(&plan)).unwrap();

        assert!(!result.changed);
        assert!(Arc::ptr_eq(&result.plan, &plan));
    }
}
