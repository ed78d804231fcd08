//! Boolean lattice simplification rule.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::Value;
use opal_logical::expr::{lit, BinaryOp, Expr};
use opal_logical::plan::{transform_expressions_up, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Tautological simplifications over the boolean lattice:
///
/// | Pattern                     | Result  |
/// |-----------------------------|---------|
/// | `TRUE OR x`, `x OR TRUE`    | `TRUE`  |
/// | `FALSE AND x`, `x AND FALSE`| `FALSE` |
/// | `TRUE AND x`, `x AND TRUE`  | `x`     |
/// | `FALSE OR x`, `x OR FALSE`  | `x`     |
/// | `a AND b` with `a` same `b` | `a`     |
/// | `a OR b` with `a` same `b`  | `a`     |
/// | `IF(TRUE, t, _)`            | `t`     |
/// | `IF(FALSE, _, f)`           | `f`     |
///
/// All identities hold under three-valued logic: `FALSE AND NULL` is `FALSE`
/// and `TRUE OR NULL` is `TRUE`, so absorbing a null operand is sound.
pub struct FoldLogicalPredicates;

impl Rule for FoldLogicalPredicates {
    fn name(&self) -> &'static str {
        "FoldLogicalPredicates"
    }

    fn description(&self) -> &'static str {
        "Simplify boolean expressions against constant and duplicate operands"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = transform_expressions_up(&plan, &simplify);
        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}

fn simplify(expr: &Expr) -> Option<Expr> {
    match expr {
        Expr::Binary {
            left,
            op: BinaryOp::And,
            right,
        } => {
            if is_bool(left, false) || is_bool(right, false) {
                return Some(lit(false));
            }
            if is_bool(left, true) {
                return Some(right.as_ref().clone());
            }
            if is_bool(right, true) {
                return Some(left.as_ref().clone());
            }
            left.same(right).then(|| left.as_ref().clone())
        }

        Expr::Binary {
            left,
            op: BinaryOp::Or,
            right,
        } => {
            if is_bool(left, true) || is_bool(right, true) {
                return Some(lit(true));
            }
            if is_bool(left, false) {
                return Some(right.as_ref().clone());
            }
            if is_bool(right, false) {
                return Some(left.as_ref().clone());
            }
            left.same(right).then(|| left.as_ref().clone())
        }

        Expr::If {
            condition,
            when_true,
            when_false,
        } => {
            if is_bool(condition, true) {
                return Some(when_true.as_ref().clone());
            }
            if is_bool(condition, false) {
                return Some(when_false.as_ref().clone());
            }
            None
        }

        _ => None,
    }
}

fn is_bool(expr: &Expr, expected: bool) -> bool {
    expr.as_literal() == Some(&Value::Bool(expected))
}
