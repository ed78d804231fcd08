//! Predicate manipulation helpers shared by the optimizer rules.

use std::collections::HashMap;
use std::sync::Arc;

use opal_core::tree;
use opal_core::ExpressionId;

use super::{BinaryOp, Expr};

/// Flatten an expression into its top-level conjuncts.
///
/// `a AND (b AND c)` yields `[a, b, c]`; a non-conjunction yields itself.
pub fn split_conjunction(expr: &Expr) -> Vec<Expr> {
    match expr {
        Expr::Binary {
            left,
            op: BinaryOp::And,
            right,
        } => {
            let mut conjuncts = split_conjunction(left);
            conjuncts.extend(split_conjunction(right));
            conjuncts
        }
        _ => vec![expr.clone()],
    }
}

/// Combine expressions into a left-associated conjunction. Empty input yields
/// `None`.
pub fn conjoin(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(Expr::and)
}

/// Convert an expression to conjunctive normal form.
///
/// Negations are pushed inward via De Morgan and disjunctions are distributed
/// over conjunctions (`a OR (b AND c)` becomes `(a OR b) AND (a OR c)`). The
/// result is idempotent under reconversion; anything that is not a boolean
/// connective is treated as an opaque literal.
pub fn to_cnf(expr: &Expr) -> Expr {
    match expr {
        Expr::Binary {
            left,
            op: BinaryOp::And,
            right,
        } => to_cnf(left).and(to_cnf(right)),

        Expr::Binary {
            left,
            op: BinaryOp::Or,
            right,
        } => distribute_or(to_cnf(left), to_cnf(right)),

        Expr::Unary {
            op: super::UnaryOp::Not,
            child,
        } => match child.as_ref() {
            // NOT NOT x
            Expr::Unary {
                op: super::UnaryOp::Not,
                child: inner,
            } => to_cnf(inner),
            // De Morgan
            Expr::Binary {
                left,
                op: BinaryOp::And,
                right,
            } => distribute_or(
                to_cnf(&left.as_ref().clone().logical_not()),
                to_cnf(&right.as_ref().clone().logical_not()),
            ),
            Expr::Binary {
                left,
                op: BinaryOp::Or,
                right,
            } => to_cnf(&left.as_ref().clone().logical_not())
                .and(to_cnf(&right.as_ref().clone().logical_not())),
            _ => expr.clone(),
        },

        _ => expr.clone(),
    }
}

/// Distribute OR over AND: both operands are already in CNF.
fn distribute_or(left: Expr, right: Expr) -> Expr {
    if let Expr::Binary {
        left: l1,
        op: BinaryOp::And,
        right: l2,
    } = &left
    {
        return distribute_or(l1.as_ref().clone(), right.clone())
            .and(distribute_or(l2.as_ref().clone(), right));
    }

    if let Expr::Binary {
        left: r1,
        op: BinaryOp::And,
        right: r2,
    } = &right
    {
        return distribute_or(left.clone(), r1.as_ref().clone())
            .and(distribute_or(left, r2.as_ref().clone()));
    }

    left.or(right)
}

/// Replace every attribute reference in `expr` whose id matches an alias in
/// `projections` with that alias's child expression. Other references are
/// left untouched. Matching is by id, so shadowing cannot occur.
pub fn inline_aliases(projections: &[Arc<Expr>], expr: &Expr) -> Expr {
    let definitions: HashMap<ExpressionId, &Arc<Expr>> = projections
        .iter()
        .filter_map(|projection| match projection.as_ref() {
            Expr::Alias { id, child, .. } => Some((*id, child)),
            _ => None,
        })
        .collect();

    if definitions.is_empty() {
        return expr.clone();
    }

    let root = Arc::new(expr.clone());
    let inlined = tree::transform_down(&root, &|e: &Expr| match e {
        Expr::Attribute(attr) => definitions
            .get(&attr.id)
            .map(|definition| definition.as_ref().clone()),
        _ => None,
    });
    inlined.as_ref().clone()
}
