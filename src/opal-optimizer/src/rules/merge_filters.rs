//! Adjacent filter merging.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::tree;
use opal_logical::LogicalPlan;

use crate::executor::{Rule, Transformed};

/// Merge directly stacked filters into one conjunction. The inner predicate
/// comes first in the conjunction so short-circuit evaluation downstream
/// keeps the original order.
///
/// # Example
///
/// Before:
/// ```text
/// Filter ((b#1 < Int64(5)))
///   └─ Filter ((a#0 > Int64(0)))
///        └─ Relation (t1)
/// ```
///
/// After:
/// ```text
/// Filter (((a#0 > Int64(0)) AND (b#1 < Int64(5))))
///   └─ Relation (t1)
/// ```
pub struct MergeFilters;

impl Rule for MergeFilters {
    fn name(&self) -> &'static str {
        "MergeFilters"
    }

    fn description(&self) -> &'static str {
        "Merge stacked filters into a single conjunction"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = tree::transform_up(&plan, &|node: &LogicalPlan| match node {
            LogicalPlan::Filter {
                input,
                predicate: outer,
            } => match input.as_ref() {
                LogicalPlan::Filter {
                    input: inner_input,
                    predicate: inner,
                } => Some(LogicalPlan::filter(
                    Arc::clone(inner_input),
                    inner.as_ref().clone().and(outer.as_ref().clone()),
                )),
                _ => None,
            },
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}
