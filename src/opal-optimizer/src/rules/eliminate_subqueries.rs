//! Subquery scope removal.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::tree;
use opal_logical::plan::transform_expressions;
use opal_logical::{Expr, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Remove every `Subquery` node, then clear the qualifier of every attribute
/// reference in the plan.
///
/// After resolution a subquery scope is purely cosmetic: the attributes it
/// re-qualifies keep their ids, so references bound through the scope stay
/// bound once it is gone. Qualifiers are cleared unconditionally; with no
/// scopes left there is nothing for them to refer to.
pub struct EliminateSubqueries;

impl Rule for EliminateSubqueries {
    fn name(&self) -> &'static str {
        "EliminateSubqueries"
    }

    fn description(&self) -> &'static str {
        "Remove subquery scopes and clear attribute qualifiers"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let unscoped = tree::transform_up(&plan, &|node: &LogicalPlan| match node {
            LogicalPlan::Subquery { input, .. } => Some(input.as_ref().clone()),
            _ => None,
        });

        let cleared = transform_expressions(&unscoped, &|expr| match expr {
            Expr::Attribute(attr) if attr.qualifier.is_some() => {
                Some(Expr::Attribute(attr.clone().without_qualifier()))
            }
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, cleared))
    }
}
