//! Constant folding rule.

use std::sync::Arc;

use common_error::OpalResult;
use opal_logical::expr::{evaluate, Expr};
use opal_logical::plan::{transform_expressions, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Replace every foldable expression with a literal of its value.
///
/// # Legal When
///
/// - The expression references no attributes and every operator is pure
/// - Evaluation is total: a zero divisor folds to null, while integer
///   overflow and unrepresentable casts simply leave the expression alone
///
/// # Example
///
/// Before:
/// ```text
/// Filter (((Int64(1) + Int64(2)) = Int64(3)))
///   └─ Relation (t1)
/// ```
///
/// After:
/// ```text
/// Filter (Bool(true))
///   └─ Relation (t1)
/// ```
pub struct FoldConstants;

impl Rule for FoldConstants {
    fn name(&self) -> &'static str {
        "FoldConstants"
    }

    fn description(&self) -> &'static str {
        "Evaluate constant expressions at plan time"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = transform_expressions(&plan, &|expr| {
            if expr.is_literal() || !expr.is_foldable() {
                return None;
            }
            let value = evaluate(expr)?;
            Some(Expr::Literal {
                data_type: expr.data_type(),
                value,
            })
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}
