//! Nested limit collapsing.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::tree;
use opal_logical::{Expr, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Collapse `Limit(Limit(p, m), n)` to a single limit taking the tighter
/// bound: `Limit(p, IF(n < m, n, m))`. With literal bounds, constant folding
/// reduces the conditional to the smaller number on the next iteration; with
/// non-literal bounds the choice stays lazy.
pub struct ReduceLimits;

impl Rule for ReduceLimits {
    fn name(&self) -> &'static str {
        "ReduceLimits"
    }

    fn description(&self) -> &'static str {
        "Collapse nested limits to the tighter bound"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = tree::transform_up(&plan, &|node: &LogicalPlan| match node {
            LogicalPlan::Limit {
                input: outer_input,
                count: outer,
            } => match outer_input.as_ref() {
                LogicalPlan::Limit { input, count: inner } => {
                    let tighter = Expr::conditional(
                        outer.as_ref().clone().lt(inner.as_ref().clone()),
                        outer.as_ref().clone(),
                        inner.as_ref().clone(),
                    );
                    Some(LogicalPlan::Limit {
                        input: Arc::clone(input),
                        count: Arc::new(tighter),
                    })
                }
                _ => None,
            },
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}
