//! Limit pushdown through unions.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::tree;
use opal_logical::{Expr, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Push a limit into both sides of a union: each side can contribute at most
/// `n` rows, so limiting them early prunes work. The outer limit stays,
/// since the two pruned sides together may still exceed `n` rows.
///
/// The rule skips unions whose sides are both already limited by a count
/// structurally equal to the outer one, which is exactly the shape this rule
/// produces; that is what keeps it from re-firing on its own output.
///
/// # Example
///
/// Before:
/// ```text
/// Limit (Int64(10))
///   └─ Union
///        ├─ Relation (t1)
///        └─ Relation (t2)
/// ```
///
/// After:
/// ```text
/// Limit (Int64(10))
///   └─ Union
///        ├─ Limit (Int64(10))
///        │  └─ Relation (t1)
///        └─ Limit (Int64(10))
///           └─ Relation (t2)
/// ```
pub struct PushLimitsThroughUnions;

impl Rule for PushLimitsThroughUnions {
    fn name(&self) -> &'static str {
        "PushLimitsThroughUnions"
    }

    fn description(&self) -> &'static str {
        "Prune both sides of a union with the outer limit"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = tree::transform_up(&plan, &|node: &LogicalPlan| match node {
            LogicalPlan::Limit { input, count } => match input.as_ref() {
                LogicalPlan::Union { left, right } => {
                    if is_limited_by(left, count) && is_limited_by(right, count) {
                        return None;
                    }
                    Some(LogicalPlan::Limit {
                        input: Arc::new(LogicalPlan::Union {
                            left: Arc::new(limit_side(left, count)),
                            right: Arc::new(limit_side(right, count)),
                        }),
                        count: Arc::clone(count),
                    })
                }
                _ => None,
            },
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}

fn is_limited_by(side: &Arc<LogicalPlan>, count: &Arc<Expr>) -> bool {
    matches!(
        side.as_ref(),
        LogicalPlan::Limit { count: existing, .. } if existing.as_ref() == count.as_ref()
    )
}

/// Limit one union side, recursing through nested unions.
fn limit_side(side: &Arc<LogicalPlan>, count: &Arc<Expr>) -> LogicalPlan {
    if is_limited_by(side, count) {
        return side.as_ref().clone();
    }
    if let LogicalPlan::Union { left, right } = side.as_ref() {
        return LogicalPlan::Limit {
            input: Arc::new(LogicalPlan::Union {
                left: Arc::new(limit_side(left, count)),
                right: Arc::new(limit_side(right, count)),
            }),
            count: Arc::clone(count),
        };
    }
    LogicalPlan::Limit {
        input: Arc::clone(side),
        count: Arc::clone(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_core::{DataType, IdGenerator};
    use opal_logical::PlanBuilder;

    fn table(name: &str, ids: &IdGenerator) -> PlanBuilder {
        PlanBuilder::relation(name, &[("a", DataType::Int64)], ids)
    }

    #[test]
    fn test_limit_pushes_into_both_sides() {
        let ids = IdGenerator::new();
        let t1 = table("t1", &ids);
        let t2 = table("t2", &ids);

        let plan = t1.clone().union(t2.clone()).limit(10).build();
        let result = PushLimitsThroughUnions.apply(plan).unwrap();

        assert!(result.changed);
        let expected = t1.limit(10).union(t2.limit(10)).limit(10).build();
        assert_eq!(result.plan, expected);
    }

    #[test]
    fn test_rule_does_not_refire_on_its_own_output() {
        let ids = IdGenerator::new();
        let t1 = table("t1", &ids);
        let t2 = table("t2", &ids);

        let plan = t1.union(t2).limit(10).build();
        let once = PushLimitsThroughUnions.apply(plan).unwrap();
        let twice = PushLimitsThroughUnions
            .apply(Arc::clone(&once.plan))
            .unwrap();

        assert!(!twice.changed);
        assert!(Arc::ptr_eq(&twice.plan, &once.plan));
    }

    #[test]
    fn test_nested_unions_are_limited_in_one_pass() {
        let ids = IdGenerator::new();
        let t1 = table("t1", &ids);
        let t2 = table("t2", &ids);
        let t3 = table("t3", &ids);

        let plan = t1
            .clone()
            .union(t2.clone())
            .union(t3.clone())
            .limit(10)
            .build();
        let result = PushLimitsThroughUnions.apply(plan).unwrap();

        let expected = t1
            .limit(10)
            .union(t2.limit(10))
            .limit(10)
            .union(t3.limit(10))
            .limit(10)
            .build();
        assert_eq!(result.plan, expected);
    }

    #[test]
    fn test_limit_over_relation_is_untouched() {
        let ids = IdGenerator::new();
        let plan = table("t1", &ids).limit(10).build();
        let result = PushLimitsThroughUnions.apply(Arc::clone(&plan)).unwrap();

        assert!(!result.changed);
    }
}
