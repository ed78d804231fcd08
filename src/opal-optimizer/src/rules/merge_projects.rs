//! Projection merging and identity-projection removal.

use std::sync::Arc;

use common_error::OpalResult;
use opal_core::tree;
use opal_logical::expr::inline_aliases;
use opal_logical::{Expr, LogicalPlan};

use crate::executor::{Rule, Transformed};

/// Two rewrites over projections:
///
/// - A projection that reproduces its input's output exactly (same length,
///   ids, and names, all plain attribute references) is dropped.
/// - Directly stacked projections merge into one by inlining the inner
///   aliases into the outer list, provided every inner projection is pure.
///
/// Inlining substitutes by id, so an inner alias can never be captured by an
/// unrelated name. A merged list can itself turn out to be an identity
/// projection, so the merge helper re-checks before returning.
pub struct MergeProjects;

impl Rule for MergeProjects {
    fn name(&self) -> &'static str {
        "MergeProjects"
    }

    fn description(&self) -> &'static str {
        "Merge stacked projections and drop identity projections"
    }

    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed> {
        let rewritten = tree::transform_up(&plan, &|node: &LogicalPlan| match node {
            LogicalPlan::Project { input, projections } => merge(projections, input),
            _ => None,
        });

        Ok(Transformed::from_rewrite(&plan, rewritten))
    }
}

fn merge(projections: &[Arc<Expr>], input: &Arc<LogicalPlan>) -> Option<LogicalPlan> {
    if let LogicalPlan::Project {
        input: inner_input,
        projections: inner,
    } = input.as_ref()
    {
        if inner.iter().all(|projection| projection.is_pure()) {
            let merged: Vec<Arc<Expr>> = projections
                .iter()
                .map(|outer| Arc::new(inline_aliases(inner, outer)))
                .collect();
            // The inner input may itself be a projection chain.
            return Some(merge(&merged, inner_input).unwrap_or_else(|| LogicalPlan::Project {
                input: Arc::clone(inner_input),
                projections: merged,
            }));
        }
    }

    is_identity(projections, input).then(|| input.as_ref().clone())
}

/// Whether the projection list reproduces `input.output()` unchanged.
fn is_identity(projections: &[Arc<Expr>], input: &Arc<LogicalPlan>) -> bool {
    let output = input.output();
    projections.len() == output.len()
        && projections.iter().zip(&output).all(|(projection, attr)| {
            matches!(
                projection.as_ref(),
                Expr::Attribute(a) if a.id == attr.id && a.name == attr.name
            )
        })
}
