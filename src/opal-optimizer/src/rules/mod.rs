//! The rewrite rule library.
//!
//! One module per rule. The default batch applies them in the order
//! [`default_rules`] lists; each rule is individually idempotent, and the
//! executor's fixed-point loop runs the batch until the plan stops changing.

mod cnf_conversion;
mod eliminate_common_predicates;
mod eliminate_subqueries;
mod fold_constant_filters;
mod fold_constants;
mod fold_logical_predicates;
mod merge_filters;
mod merge_projects;
mod push_filters_through_joins;
mod push_filters_through_projects;
mod push_limits_through_unions;
mod push_projects_through_limits;
mod reduce_aliases;
mod reduce_casts;
mod reduce_limits;
mod reduce_negations;

pub use cnf_conversion::CnfConversion;
pub use eliminate_common_predicates::EliminateCommonPredicates;
pub use eliminate_subqueries::EliminateSubqueries;
pub use fold_constant_filters::FoldConstantFilters;
pub use fold_constants::FoldConstants;
pub use fold_logical_predicates::FoldLogicalPredicates;
pub use merge_filters::MergeFilters;
pub use merge_projects::MergeProjects;
pub use push_filters_through_joins::PushFiltersThroughJoins;
pub use push_filters_through_projects::PushFiltersThroughProjects;
pub use push_limits_through_unions::PushLimitsThroughUnions;
pub use push_projects_through_limits::PushProjectsThroughLimits;
pub use reduce_aliases::ReduceAliases;
pub use reduce_casts::ReduceCasts;
pub use reduce_limits::ReduceLimits;
pub use reduce_negations::ReduceNegations;

use crate::executor::Rule;

/// The shipped rule library, in batch order. `FoldConstantFilters` is
/// deliberately absent; it ships as an opt-in rule.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(FoldConstants),
        Box::new(FoldLogicalPredicates),
        Box::new(ReduceNegations),
        Box::new(ReduceCasts),
        Box::new(ReduceAliases),
        Box::new(CnfConversion),
        Box::new(EliminateCommonPredicates),
        Box::new(MergeFilters),
        Box::new(MergeProjects),
        Box::new(EliminateSubqueries),
        Box::new(PushFiltersThroughProjects),
        Box::new(PushFiltersThroughJoins),
        Box::new(PushProjectsThroughLimits),
        Box::new(ReduceLimits),
        Box::new(PushLimitsThroughUnions),
    ]
}
