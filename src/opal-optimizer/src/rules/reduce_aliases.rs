//! Alias collapsing rule.

use std::sync::Arc;

use common_error::OpalResult;
use opal_logical::plan::{transform_expressions_up, LogicalPlan};
use opal_logical::Expr;

use crate::executor::{Rule, Transformed};

/// Collapse directly nested aliases. The outer alias's name and id survive;
/// the inner name is shadowed and its id no longer reachable from above.
pub struct ReduceAliases;

impl Rule for ReduceAliases {
    fn name(&self) -> &'static str {
        "ReduceAliases"
    }

    fn description(&self) -> &'static str {
        "Collapse nested aliases to the outermost one"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = transform_expressions_up(&plan, &|expr| match expr {
            Expr::Alias {
                child,
                name,
                id,
                generated,
            } => match child.as_ref() {
                Expr::Alias { child: inner, .. } => Some(Expr::Alias {
                    child: Arc::clone(inner),
                    name: name.clone(),
                    id: *id,
                    generated: *generated,
                }),
                _ => None,
            },
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}
