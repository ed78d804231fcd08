//! Filter pushdown through inner joins.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::tree;
use opal_logical::expr::{conjoin, split_conjunction, to_cnf};
use opal_logical::{Expr, JoinType, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Absorb a filter sitting on an inner join. The predicate splits through CNF
/// into conjuncts, which partition three ways:
///
/// - conjuncts referencing only the left side filter the left input
/// - conjuncts referencing only the right side filter the right input
/// - the remainder joins the join condition itself
///
/// The outer filter disappears entirely; its semantics live on in the
/// children's filters and the join condition.
///
/// Non-inner joins are never transformed: pushing a predicate below an outer
/// join would filter rows the join is required to null-extend.
///
/// # Example
///
/// Before:
/// ```text
/// Filter (((a#0 > Int64(0)) AND (d#3 < Int64(5))))
///   └─ Join (Inner, on (a#0 = c#2))
///        ├─ Relation (t1)
///        └─ Relation (t2)
/// ```
///
/// After:
/// ```text
/// Join (Inner, on (a#0 = c#2))
///   ├─ Filter ((a#0 > Int64(0)))
///   │  └─ Relation (t1)
///   └─ Filter ((d#3 < Int64(5)))
///      └─ Relation (t2)
/// ```
pub struct PushFiltersThroughJoins;

impl Rule for PushFiltersThroughJoins {
    fn name(&self) -> &'static str {
        "PushFiltersThroughJoins"
    }

    fn description(&self) -> &'static str {
        "Split filters over inner joins into per-side filters and join conditions"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = tree::transform_up(&plan, &|node: &LogicalPlan| match node {
            LogicalPlan::Filter { input, predicate } => push(predicate, input),
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}

fn push(predicate: &Expr, input: &Arc<LogicalPlan>) -> Option<LogicalPlan> {
    let LogicalPlan::Join {
        left,
        right,
        join_type: JoinType::Inner,
        condition,
    } = input.as_ref()
    else {
        return None;
    };

    let left_ids = left.output_id_set();
    let right_ids = right.output_id_set();

    let mut left_predicates = Vec::new();
    let mut right_predicates = Vec::new();
    let mut common_predicates = Vec::new();

    for conjunct in split_conjunction(&to_cnf(predicate)) {
        let references = conjunct.references();
        if references.is_subset(&left_ids) {
            left_predicates.push(conjunct);
        } else if references.is_subset(&right_ids) {
            right_predicates.push(conjunct);
        } else {
            common_predicates.push(conjunct);
        }
    }

    let condition = conjoin(
        condition
            .iter()
            .map(|condition| condition.as_ref().clone())
            .chain(common_predicates),
    );

    Some(LogicalPlan::Join {
        left: attach(left, conjoin(left_predicates)),
        right: attach(right, conjoin(right_predicates)),
        join_type: JoinType::Inner,
        condition: condition.map(Arc::new),
    })
}

/// Filter a join side, recursing when that side is itself an inner join.
fn attach(side: &Arc<LogicalPlan>, predicate: Option<Expr>) -> Arc<LogicalPlan> {
    let Some(predicate) = predicate else {
        return Arc::clone(side);
    };
    match push(&predicate, side) {
        Some(pushed) => Arc::new(pushed),
        None => Arc::new(LogicalPlan::filter(Arc::clone(side), predicate)),
    }
}
