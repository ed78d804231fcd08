//! Negation normalization rule.

use std::sync::Arc;

use common_error::OpalResult;
use opal_logical::expr::{lit, BinaryOp, Expr, UnaryOp};
use opal_logical::plan::{transform_expressions_up, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Push `NOT` inward and collapse redundancies:
///
/// - `NOT NOT x` becomes `x`
/// - `NOT (a = b)` becomes `a != b`, and likewise for every comparison
/// - `NOT (x IS NULL)` becomes `x IS NOT NULL` and vice versa
/// - `IF(NOT c, t, f)` becomes `IF(c, f, t)`
/// - `a AND NOT a` becomes `FALSE`, `a OR NOT a` becomes `TRUE`
///
/// The contradiction and tautology cases fire only for non-nullable `a`:
/// `NULL AND NOT NULL` is null, not false, so a nullable operand must keep
/// its runtime check. De Morgan over `AND`/`OR` is left to CNF conversion.
pub struct ReduceNegations;

impl Rule for ReduceNegations {
    fn name(&self) -> &'static str {
        "ReduceNegations"
    }

    fn description(&self) -> &'static str {
        "Push negations inward and collapse double negation"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = transform_expressions_up(&plan, &reduce);
        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}

fn reduce(expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Unary {
            op: UnaryOp::Not,
            child,
        } => match child.as_ref() {
            Expr::Unary {
                op: UnaryOp::Not,
                child: inner,
            } => Some(inner.as_ref().clone()),

            Expr::Unary {
                op: UnaryOp::IsNull,
                child: inner,
            } => Some(Expr::Unary {
                op: UnaryOp::IsNotNull,
                child: Arc::clone(inner),
            }),

            Expr::Unary {
                op: UnaryOp::IsNotNull,
                child: inner,
            } => Some(Expr::Unary {
                op: UnaryOp::IsNull,
                child: Arc::clone(inner),
            }),

            Expr::Binary { left, op, right } => op.negated().map(|negated| Expr::Binary {
                left: Arc::clone(left),
                op: negated,
                right: Arc::clone(right),
            }),

            _ => None,
        },

        Expr::If {
            condition,
            when_true,
            when_false,
        } => match condition.as_ref() {
            Expr::Unary {
                op: UnaryOp::Not,
                child,
            } => Some(Expr::If {
                condition: Arc::clone(child),
                when_true: Arc::clone(when_false),
                when_false: Arc::clone(when_true),
            }),
            _ => None,
        },

        Expr::Binary {
            left,
            op: BinaryOp::And,
            right,
        } if contradicts(left, right) => Some(lit(false)),

        Expr::Binary {
            left,
            op: BinaryOp::Or,
            right,
        } if contradicts(left, right) => Some(lit(true)),

        _ => None,
    }
}

/// Whether one side is the negation of the other and the plain side cannot
/// be null.
fn contradicts(left: &Expr, right: &Expr) -> bool {
    negation_of(left, right) || negation_of(right, left)
}

fn negation_of(plain: &Expr, negated: &Expr) -> bool {
    match negated {
        Expr::Unary {
            op: UnaryOp::Not,
            child,
        } => child.same(plain) && !plain.nullable(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opal_core::{DataType, IdGenerator};
    use opal_logical::PlanBuilder;

    fn t1(ids: &IdGenerator) -> PlanBuilder {
        PlanBuilder::relation(
            "t1",
            &[("a", DataType::Int64), ("b", DataType::Bool)],
            ids,
        )
    }

    #[test]
    fn test_double_negation() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let a = t1.attr("a");
        let predicate = a.to_expr().gt(lit(0i64));

        let plan = t1
            .clone()
            .filter(predicate.clone().logical_not().logical_not())
            .build();
        let result = ReduceNegations.apply(plan).unwrap();

        assert!(result.changed);
        assert_eq!(result.plan, t1.filter(predicate).build());
    }

    #[test]
    fn test_quadruple_negation_in_one_pass() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let b = t1.attr("b");

        let plan = t1
            .clone()
            .filter(
                b.to_expr()
                    .logical_not()
                    .logical_not()
                    .logical_not()
                    .logical_not(),
            )
            .build();
        let result = ReduceNegations.apply(plan).unwrap();

        assert_eq!(result.plan, t1.filter(b.to_expr()).build());
    }

    #[test]
    fn test_negated_comparisons_flip() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let a = t1.attr("a");

        let cases = [
            (a.to_expr().eq(lit(1i64)), a.to_expr().not_eq(lit(1i64))),
            (a.to_expr().gt(lit(1i64)), a.to_expr().lt_eq(lit(1i64))),
            (a.to_expr().gt_eq(lit(1i64)), a.to_expr().lt(lit(1i64))),
            (a.to_expr().lt(lit(1i64)), a.to_expr().gt_eq(lit(1i64))),
        ];

        for (input, expected) in cases {
            let plan = t1.clone().filter(input.logical_not()).build();
            let result = ReduceNegations.apply(plan).unwrap();
            assert_eq!(result.plan, t1.clone().filter(expected).build());
        }
    }

    #[test]
    fn test_negated_null_checks_flip() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let a = t1.attr("a");

        let plan = t1
            .clone()
            .filter(a.to_expr().is_null().logical_not())
            .build();
        let result = ReduceNegations.apply(plan).unwrap();

        assert_eq!(result.plan, t1.filter(a.to_expr().is_not_null()).build());
    }

    #[test]
    fn test_negated_conditional_swaps_branches() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let b = t1.attr("b");

        let reduced = reduce(&Expr::conditional(
            b.to_expr().logical_not(),
            lit(1i64),
            lit(2i64),
        ));
        assert_eq!(
            reduced,
            Some(Expr::conditional(b.to_expr(), lit(2i64), lit(1i64)))
        );
    }

    #[test]
    fn test_contradiction_needs_non_nullable() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let b = t1.attr("b");

        let plan = t1
            .clone()
            .filter(b.to_expr().and(b.to_expr().logical_not()))
            .build();
        let result = ReduceNegations.apply(plan).unwrap();
        assert_eq!(result.plan, t1.clone().filter(lit(false)).build());

        // A nullable operand keeps its runtime check.
        let nullable = b.clone().as_nullable();
        let plan = t1
            .clone()
            .filter(nullable.to_expr().and(nullable.to_expr().logical_not()))
            .build();
        let result = ReduceNegations.apply(Arc::clone(&plan)).unwrap();
        assert!(!result.changed);
    }

    #[test]
    fn test_tautology() {
        let ids = IdGenerator::new();
        let t1 = t1(&ids);
        let b = t1.attr("b");

        let plan = t1
            .clone()
            .filter(b.to_expr().logical_not().or(b.to_expr()))
            .build();
        let result = ReduceNegations.apply(plan).unwrap();
        assert_eq!(result.plan, t1.filter(lit(true)).build());
    }
}
