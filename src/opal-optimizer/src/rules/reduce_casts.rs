//! Cast simplification rule.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::DataType;
use opal_logical::plan::{transform_expressions_up, LogicalPlan};
use opal_logical::Expr;

use crate::executor::{Rule, Transformed};

/// Remove redundant casts and collapse cast chains:
///
/// - `CAST(e AS T)` where `e` already has type `T` becomes `e`
/// - `CAST(CAST(e AS U) AS T)` where `e` has type `T` becomes `e`, provided
///   `T` round-trips through `U` exactly
/// - `CAST(CAST(e AS U) AS T)` becomes `CAST(e AS T)` when the direct cast
///   is valid and the intermediate is faithful: a null or integer source,
///   whose rendering casts onward exactly as the source itself would
///
/// # Legal When
///
/// - Dropping an intermediate must not change any value: `"007"` parsed to
///   `Int64` and re-rendered is `"7"`, so a `String -> Int64 -> String`
///   chain stays intact
/// - The flattened cast must stay well-typed: there is no direct
///   `Bool -> Int64` cast, so `Bool -> String -> Int64` stays intact
/// - A float rendering may fail to parse as an integer, so a float-sourced
///   chain collapses only when it returns to `Float64`
pub struct ReduceCasts;

impl Rule for ReduceCasts {
    fn name(&self) -> &'static str {
        "ReduceCasts"
    }

    fn description(&self) -> &'static str {
        "Remove redundant casts and collapse faithful cast chains"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = transform_expressions_up(&plan, &|expr| match expr {
            Expr::Cast { child, data_type } => simplify_cast(child, *data_type),
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}

/// Reduce one cast toward `target`, recursing so a whole chain normalizes in
/// a single application.
fn simplify_cast(child: &Arc<Expr>, target: DataType) -> Option<Expr> {
    if child.data_type() == target {
        return Some(child.as_ref().clone());
    }

    let Expr::Cast {
        child: inner,
        data_type: via,
    } = child.as_ref()
    else {
        return None;
    };
    let source = inner.data_type();

    // The chain returns to its origin; both casts vanish only when the
    // value survives the trip exactly.
    if source == target {
        return source
            .cast_round_trips(via)
            .then(|| inner.as_ref().clone());
    }

    // A null or canonical integer rendering casts onward exactly as the
    // source would; any other intermediate must stay.
    let faithful = matches!(source, DataType::Null)
        || (source == DataType::Int64 && source.cast_round_trips(via));
    if faithful && source.can_cast_to(&target) {
        let flattened = simplify_cast(inner, target).unwrap_or_else(|| Expr::Cast {
            child: Arc::clone(inner),
            data_type: target,
        });
        return Some(flattened);
    }

    None
}
