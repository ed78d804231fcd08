//! CNF normalization of filter predicates.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::tree;
use opal_logical::expr::to_cnf;
use opal_logical::LogicalPlan;

use crate::executor::{Rule, Transformed};

/// Rewrite every filter predicate into conjunctive normal form.
///
/// CNF is what the join pushdown rule partitions: a conjunction of
/// disjunctions splits cleanly into per-side conjuncts. Conversion pushes
/// negations inward via De Morgan and distributes `OR` over `AND`; the
/// result is idempotent under reconversion, which is what lets the
/// fixed-point loop terminate.
pub struct CnfConversion;

impl Rule for CnfConversion {
    fn name(&self) -> &'static str {
        "CnfConversion"
    }

    fn description(&self) -> &'static str {
        "Normalize filter predicates to conjunctive normal form"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = tree::transform_down(&plan, &|node: &LogicalPlan| match node {
            LogicalPlan::Filter { input, predicate } => {
                let cnf = to_cnf(predicate);
                (cnf != **predicate).then(|| LogicalPlan::Filter {
                    input: Arc::clone(input),
                    predicate: Arc::new(cnf),
                })
            }
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}
