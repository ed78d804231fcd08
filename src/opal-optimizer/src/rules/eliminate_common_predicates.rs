//! Duplicate subexpression elimination.

use std::sync::Arc;

use common_error::OpalResult;
use opal_logical::expr::{BinaryOp, Expr};
use opal_logical::plan::{transform_expressions_up, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Collapse operators whose operands are semantically identical:
///
/// - `a AND b` with `a` same as `b` becomes `a`
/// - `a OR b` with `a` same as `b` becomes `a`
/// - `IF(c, y, n)` with `y` same as `n` becomes `y`, provided `c` is pure
///
/// "Same" is equality modulo alias wrapping and cosmetic metadata. The
/// conditional case drops `c` entirely: both branches compute the same value,
/// and a null condition merely routes to the else branch, which is that same
/// value again.
pub struct EliminateCommonPredicates;

impl Rule for EliminateCommonPredicates {
    fn name(&self) -> &'static str {
        "EliminateCommonPredicates"
    }

    fn description(&self) -> &'static str {
        "Collapse operators over semantically identical operands"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = transform_expressions_up(&plan, &|expr| match expr {
            Expr::Binary { left, op, right }
                if matches!(op, BinaryOp::And | BinaryOp::Or) && left.same(right) =>
            {
                Some(left.as_ref().clone())
            }

            Expr::If {
                condition,
                when_true,
                when_false,
            } if when_true.same(when_false) && condition.is_pure() => {
                Some(when_true.as_ref().clone())
            }

            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}
