//! Testing utilities for the planning layers.
//!
//! Two tools live here: id normalization, which renumbers every
//! `ExpressionId` by first occurrence so structurally equal plans compare
//! equal regardless of which generator minted their ids, and a reference
//! interpreter over `LocalRelation` inputs that the optimizer's semantic
//! soundness tests compare row bags with.
//!
//! The interpreter is test support, not an execution engine: nested-loop
//! joins and row-at-a-time evaluation, correctness over speed.

use std::collections::HashMap;
use std::sync::Arc;

use common_error::{OpalError, OpalResult};
use opal_core::tree::{self, TreeNode};
use opal_core::{ExpressionId, Value};

use crate::expr::{evaluate, AttributeRef, Expr};
use crate::plan::{transform_expressions, JoinType, LogicalPlan};

/// Renumber every `ExpressionId` in the plan by first occurrence, in document
/// order (plan pre-order; expression slots before leaf relation outputs
/// follow the node's own order).
pub fn normalize_ids(plan: &Arc<LogicalPlan>) -> Arc<LogicalPlan> {
    let mut mapping: HashMap<ExpressionId, ExpressionId> = HashMap::new();
    let mut next = 0u64;
    assign_plan_ids(plan, &mut mapping, &mut next);

    let renumbered = tree::transform_down(plan, &|node: &LogicalPlan| match node {
        LogicalPlan::Relation { name, output } => Some(LogicalPlan::Relation {
            name: name.clone(),
            output: remap_attrs(output, &mapping),
        }),
        LogicalPlan::LocalRelation { rows, output } => Some(LogicalPlan::LocalRelation {
            rows: rows.clone(),
            output: remap_attrs(output, &mapping),
        }),
        _ => None,
    });

    transform_expressions(&renumbered, &|expr| match expr {
        Expr::Attribute(attr) => {
            let new_id = *mapping.get(&attr.id)?;
            (new_id != attr.id).then(|| {
                let mut attr = attr.clone();
                attr.id = new_id;
                Expr::Attribute(attr)
            })
        }
        Expr::Alias {
            child,
            name,
            id,
            generated,
        } => {
            let new_id = *mapping.get(id)?;
            (new_id != *id).then(|| Expr::Alias {
                child: Arc::clone(child),
                name: name.clone(),
                id: new_id,
                generated: *generated,
            })
        }
        _ => None,
    })
}

/// Structural equality after id normalization, the equality convention the
/// test suites use.
pub fn normalized_eq(a: &Arc<LogicalPlan>, b: &Arc<LogicalPlan>) -> bool {
    normalize_ids(a) == normalize_ids(b)
}

fn assign_plan_ids(
    plan: &LogicalPlan,
    mapping: &mut HashMap<ExpressionId, ExpressionId>,
    next: &mut u64,
) {
    for slot in plan.expressions() {
        assign_expr_ids(slot, mapping, next);
    }
    if let LogicalPlan::Relation { output, .. } | LogicalPlan::LocalRelation { output, .. } = plan
    {
        for attr in output {
            assign(attr.id, mapping, next);
        }
    }
    for child in plan.children() {
        assign_plan_ids(child, mapping, next);
    }
}

fn assign_expr_ids(
    expr: &Expr,
    mapping: &mut HashMap<ExpressionId, ExpressionId>,
    next: &mut u64,
) {
    match expr {
        Expr::Attribute(attr) => assign(attr.id, mapping, next),
        Expr::Alias { id, .. } => assign(*id, mapping, next),
        _ => {}
    }
    for child in expr.children() {
        assign_expr_ids(child, mapping, next);
    }
}

fn assign(id: ExpressionId, mapping: &mut HashMap<ExpressionId, ExpressionId>, next: &mut u64) {
    mapping.entry(id).or_insert_with(|| {
        let fresh = ExpressionId::new(*next);
        *next += 1;
        fresh
    });
}

fn remap_attrs(
    attrs: &[AttributeRef],
    mapping: &HashMap<ExpressionId, ExpressionId>,
) -> Vec<AttributeRef> {
    attrs
        .iter()
        .map(|attr| {
            let mut attr = attr.clone();
            if let Some(new_id) = mapping.get(&attr.id) {
                attr.id = *new_id;
            }
            attr
        })
        .collect()
}

/// Execute a plan whose leaves are all `LocalRelation`s, producing its rows.
pub fn execute(plan: &LogicalPlan) -> OpalResult<Vec<Vec<Value>>> {
    match plan {
        LogicalPlan::LocalRelation { rows, .. } => Ok(rows.clone()),
        LogicalPlan::Relation { name, .. } => Err(OpalError::not_implemented(format!(
            "execution of base relation `{name}` requires a catalog"
        ))),

        LogicalPlan::Project { input, projections } => {
            let attrs = input.output();
            execute(input)?
                .iter()
                .map(|row| {
                    projections
                        .iter()
                        .map(|projection| eval_row(projection, &attrs, row))
                        .collect()
                })
                .collect()
        }

        LogicalPlan::Filter { input, predicate } => {
            let attrs = input.output();
            let mut out = Vec::new();
            for row in execute(input)? {
                if eval_row(predicate, &attrs, &row)? == Value::Bool(true) {
                    out.push(row);
                }
            }
            Ok(out)
        }

        LogicalPlan::Join {
            left,
            right,
            join_type,
            condition,
        } => execute_join(left, right, *join_type, condition.as_ref()),

        LogicalPlan::Limit { input, count } => {
            let n = evaluate(count)
                .and_then(|value| value.as_int64())
                .ok_or_else(|| {
                    OpalError::internal(format!("limit count `{count}` did not fold to an integer"))
                })?;
            let n = usize::try_from(n).unwrap_or(0);
            Ok(execute(input)?.into_iter().take(n).collect())
        }

        LogicalPlan::Union { left, right } => {
            let mut rows = execute(left)?;
            rows.extend(execute(right)?);
            Ok(rows)
        }

        LogicalPlan::Subquery { input, .. } => execute(input),
    }
}

fn execute_join(
    left: &Arc<LogicalPlan>,
    right: &Arc<LogicalPlan>,
    join_type: JoinType,
    condition: Option<&Arc<Expr>>,
) -> OpalResult<Vec<Vec<Value>>> {
    let left_attrs = left.output();
    let right_attrs = right.output();
    let mut combined = left_attrs.clone();
    combined.extend(right_attrs.clone());

    let left_rows = execute(left)?;
    let right_rows = execute(right)?;

    let matches = |l: &[Value], r: &[Value]| -> OpalResult<bool> {
        match condition {
            None => Ok(true),
            Some(condition) => {
                let mut row = l.to_vec();
                row.extend(r.to_vec());
                Ok(eval_row(condition, &combined, &row)? == Value::Bool(true))
            }
        }
    };

    let mut out = Vec::new();
    let mut right_matched = vec![false; right_rows.len()];

    for left_row in &left_rows {
        let mut matched = false;
        for (i, right_row) in right_rows.iter().enumerate() {
            if matches(left_row, right_row)? {
                matched = true;
                right_matched[i] = true;
                let mut row = left_row.clone();
                row.extend(right_row.clone());
                out.push(row);
            }
        }
        if !matched && matches!(join_type, JoinType::LeftOuter | JoinType::FullOuter) {
            let mut row = left_row.clone();
            row.extend(vec![Value::Null; right_attrs.len()]);
            out.push(row);
        }
    }

    if matches!(join_type, JoinType::RightOuter | JoinType::FullOuter) {
        for (i, right_row) in right_rows.iter().enumerate() {
            if !right_matched[i] {
                let mut row = vec![Value::Null; left_attrs.len()];
                row.extend(right_row.clone());
                out.push(row);
            }
        }
    }

    Ok(out)
}

/// Evaluate an expression against one row by substituting each attribute
/// reference with the row's value, then constant-folding the result.
fn eval_row(expr: &Arc<Expr>, attrs: &[AttributeRef], row: &[Value]) -> OpalResult<Value> {
    let bound = tree::transform_down(expr, &|e: &Expr| match e {
        Expr::Attribute(attr) => {
            let position = attrs.iter().position(|a| a.id == attr.id)?;
            Some(Expr::Literal {
                value: row.get(position)?.clone(),
                data_type: attr.data_type,
            })
        }
        _ => None,
    });

    evaluate(&bound)
        .ok_or_else(|| OpalError::internal(format!("expression `{bound}` did not evaluate")))
}

/// Order-insensitive rendering of a row bag for comparisons.
pub fn row_bag(rows: &[Vec<Value>]) -> Vec<String> {
    let mut bag: Vec<String> = rows.iter().map(|row| format!("{row:?}")).collect();
    bag.sort();
    bag
}
