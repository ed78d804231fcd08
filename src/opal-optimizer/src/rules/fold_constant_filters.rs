//! Constant filter elimination (optional rule).

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::tree;
use opal_core::Value;
use opal_logical::LogicalPlan;

use crate::executor::{Rule, Transformed};

/// Eliminate filters whose predicate folded to a constant: an always-true
/// filter disappears, an always-false filter becomes an empty inline
/// relation with the same output attributes.
///
/// Not part of the default batch; callers assembling their own batches can
/// opt in.
pub struct FoldConstantFilters;

impl Rule for FoldConstantFilters {
    fn name(&self) -> &'static str {
        "FoldConstantFilters"
    }

    fn description(&self) -> &'static str {
        "Drop always-true filters and empty out always-false ones"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = tree::transform_up(&plan, &|node: &LogicalPlan| match node {
            LogicalPlan::Filter { input, predicate } => match predicate.as_literal() {
                Some(&Value::Bool(true)) => Some(input.as_ref().clone()),
                Some(&Value::Bool(false)) => Some(LogicalPlan::LocalRelation {
                    rows: Vec::new(),
                    output: input.output(),
                }),
                _ => None,
            },
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}
