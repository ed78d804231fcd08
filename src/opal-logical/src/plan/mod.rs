//! Logical plan operators for Opal query planning.
//!
//! These operators define *what* a query computes, not *how* it is executed.
//! A plan is a tree of operators; each operator holds its child plans behind
//! `Arc` and its attached expressions in dedicated slots (`Project` carries a
//! projection list, `Filter` a predicate, `Join` an optional condition,
//! `Limit` a count expression).
//!
//! | Category    | Operators                       |
//! | ----------- | ------------------------------- |
//! | Source      | `Relation`, `LocalRelation`     |
//! | Restriction | `Filter`                        |
//! | Shape       | `Project`                       |
//! | Combination | `Join`, `Union`                 |
//! | Control     | `Limit`                         |
//! | Scoping     | `Subquery`                      |
//!
//! The analyzer hands the optimizer *resolved* plans: every attribute
//! reference is bound to a producer below it, with a stable id and a data
//! type. Rewrites preserve ids; only `Project` rebinds them, through aliases.

mod builder;

pub use builder::PlanBuilder;

use std::collections::HashSet;
use std::sync::Arc;

use common_display::{DisplayNode, DisplayTree};
use opal_core::tree::{self, TreeNode};
use opal_core::{DataType, ExpressionId, Value};
use serde::{Deserialize, Serialize};

use crate::expr::{AttributeRef, Expr};

/// Join type. Only `Inner` joins admit filter pushdown into both sides;
/// outer joins null-extend the unmatched side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    /// Rows with matches on both sides.
    Inner,
    /// Every left row, null-extended when unmatched.
    LeftOuter,
    /// Every right row, null-extended when unmatched.
    RightOuter,
    /// Every row from both sides.
    FullOuter,
}

impl JoinType {
    /// Display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Inner => "Inner",
            Self::LeftOuter => "LeftOuter",
            Self::RightOuter => "RightOuter",
            Self::FullOuter => "FullOuter",
        }
    }
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A logical operator in the Opal query plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalPlan {
    /// A named base relation, bound by the catalog at analysis time.
    Relation {
        /// Relation name.
        name: String,
        /// Attributes the relation produces.
        output: Vec<AttributeRef>,
    },

    /// An inline relation carrying its own rows (`VALUES` clauses, tests).
    LocalRelation {
        /// Row data, one `Vec<Value>` per row, positionally matching `output`.
        rows: Vec<Vec<Value>>,
        /// Attributes the relation produces.
        output: Vec<AttributeRef>,
    },

    /// Column selection and derivation.
    Project {
        /// Input plan.
        input: Arc<LogicalPlan>,
        /// Projection list; every element is named (an attribute or alias)
        /// once the plan is resolved.
        projections: Vec<Arc<Expr>>,
    },

    /// Predicate-based row filtering.
    Filter {
        /// Input plan.
        input: Arc<LogicalPlan>,
        /// Filter predicate (must evaluate to bool).
        predicate: Arc<Expr>,
    },

    /// Relational join.
    Join {
        /// Left input plan.
        left: Arc<LogicalPlan>,
        /// Right input plan.
        right: Arc<LogicalPlan>,
        /// Join type.
        join_type: JoinType,
        /// Optional join condition; `None` is a cross join.
        condition: Option<Arc<Expr>>,
    },

    /// Row count restriction. The count is an expression so rewrites can
    /// defer `min(m, n)` of non-literal bounds; it must be attribute-free.
    Limit {
        /// Input plan.
        input: Arc<LogicalPlan>,
        /// Maximum number of rows.
        count: Arc<Expr>,
    },

    /// Bag union of two schema-compatible plans.
    Union {
        /// Left input plan.
        left: Arc<LogicalPlan>,
        /// Right input plan.
        right: Arc<LogicalPlan>,
    },

    /// A named scope introduced for a nested query. Purely cosmetic after
    /// resolution; the optimizer removes it.
    Subquery {
        /// Input plan.
        input: Arc<LogicalPlan>,
        /// Scope alias, becoming the qualifier of the attributes above.
        alias: String,
    },
}

impl LogicalPlan {
    // ========== Constructors ==========

    /// Create a named base relation.
    pub fn relation(name: impl Into<String>, output: Vec<AttributeRef>) -> Self {
        Self::Relation {
            name: name.into(),
            output,
        }
    }

    /// Create an inline relation.
    pub fn local_relation(rows: Vec<Vec<Value>>, output: Vec<AttributeRef>) -> Self {
        Self::LocalRelation { rows, output }
    }

    /// Create a projection.
    pub fn project(input: Arc<LogicalPlan>, projections: Vec<Expr>) -> Self {
        Self::Project {
            input,
            projections: projections.into_iter().map(Arc::new).collect(),
        }
    }

    /// Create a filter.
    pub fn filter(input: Arc<LogicalPlan>, predicate: Expr) -> Self {
        Self::Filter {
            input,
            predicate: Arc::new(predicate),
        }
    }

    /// Create a join.
    pub fn join(
        left: Arc<LogicalPlan>,
        right: Arc<LogicalPlan>,
        join_type: JoinType,
        condition: Option<Expr>,
    ) -> Self {
        Self::Join {
            left,
            right,
            join_type,
            condition: condition.map(Arc::new),
        }
    }

    /// Create a limit.
    pub fn limit(input: Arc<LogicalPlan>, count: Expr) -> Self {
        Self::Limit {
            input,
            count: Arc::new(count),
        }
    }

    /// Create a union.
    pub fn union(left: Arc<LogicalPlan>, right: Arc<LogicalPlan>) -> Self {
        Self::Union { left, right }
    }

    /// Create a subquery scope.
    pub fn subquery(input: Arc<LogicalPlan>, alias: impl Into<String>) -> Self {
        Self::Subquery {
            input,
            alias: alias.into(),
        }
    }

    // ========== Analysis methods ==========

    /// Get the operator name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Relation { .. } => "Relation",
            Self::LocalRelation { .. } => "LocalRelation",
            Self::Project { .. } => "Project",
            Self::Filter { .. } => "Filter",
            Self::Join { .. } => "Join",
            Self::Limit { .. } => "Limit",
            Self::Union { .. } => "Union",
            Self::Subquery { .. } => "Subquery",
        }
    }

    /// The expressions attached to this node (not its children's).
    pub fn expressions(&self) -> Vec<&Arc<Expr>> {
        match self {
            Self::Project { projections, .. } => projections.iter().collect(),
            Self::Filter { predicate, .. } => vec![predicate],
            Self::Join { condition, .. } => condition.iter().collect(),
            Self::Limit { count, .. } => vec![count],
            Self::Relation { .. } | Self::LocalRelation { .. } | Self::Union { .. } | Self::Subquery { .. } => {
                vec![]
            }
        }
    }

    /// The attributes this operator produces, in order.
    pub fn output(&self) -> Vec<AttributeRef> {
        match self {
            Self::Relation { output, .. } | Self::LocalRelation { output, .. } => output.clone(),
            Self::Project { projections, .. } => projections
                .iter()
                .filter_map(|projection| projection.to_attribute())
                .collect(),
            Self::Filter { input, .. } | Self::Limit { input, .. } => input.output(),
            Self::Join {
                left,
                right,
                join_type,
                ..
            } => {
                let mut left_output = left.output();
                let mut right_output = right.output();
                // Outer joins null-extend the unmatched side.
                match join_type {
                    JoinType::Inner => {}
                    JoinType::LeftOuter => nullify(&mut right_output),
                    JoinType::RightOuter => nullify(&mut left_output),
                    JoinType::FullOuter => {
                        nullify(&mut left_output);
                        nullify(&mut right_output);
                    }
                }
                left_output.extend(right_output);
                left_output
            }
            Self::Union { left, right } => {
                // Ids come from the left side; nullability merges pairwise.
                left.output()
                    .into_iter()
                    .zip(right.output())
                    .map(|(l, r)| AttributeRef {
                        nullable: l.nullable || r.nullable,
                        ..l
                    })
                    .collect()
            }
            Self::Subquery { input, alias } => input
                .output()
                .into_iter()
                .map(|attr| attr.with_qualifier(alias.clone()))
                .collect(),
        }
    }

    /// The set of ids in `output()`.
    pub fn output_id_set(&self) -> HashSet<ExpressionId> {
        self.output().into_iter().map(|attr| attr.id).collect()
    }

    /// Whether analysis has fully bound this plan: no unresolved references,
    /// every projection named, and every expression referencing only
    /// attributes its children produce.
    pub fn is_resolved(&self) -> bool {
        let references_ok = match self {
            Self::Filter { input, predicate } => predicate
                .references()
                .is_subset(&input.output_id_set()),
            Self::Project { input, projections } => {
                let available = input.output_id_set();
                projections.iter().all(|projection| {
                    projection.to_attribute().is_some()
                        && projection.references().is_subset(&available)
                })
            }
            Self::Join {
                left,
                right,
                condition,
                ..
            } => condition.as_ref().map_or(true, |condition| {
                let mut available = left.output_id_set();
                available.extend(right.output_id_set());
                condition.references().is_subset(&available)
            }),
            Self::Limit { count, .. } => count.references().is_empty(),
            _ => true,
        };

        references_ok
            && self.expressions().iter().all(|expr| expr.is_resolved())
            && self.children().iter().all(|child| child.is_resolved())
    }

    /// Whether every operator's operand types are in its accepted set.
    pub fn is_well_typed(&self) -> bool {
        let self_ok = match self {
            Self::Relation { .. } | Self::Project { .. } | Self::Subquery { .. } => true,
            Self::LocalRelation { rows, output } => rows.iter().all(|row| {
                row.len() == output.len()
                    && row
                        .iter()
                        .zip(output)
                        .all(|(value, attr)| value.data_type().can_coerce_to(&attr.data_type))
            }),
            Self::Filter { predicate, .. } => {
                predicate.data_type().can_coerce_to(&DataType::Bool)
            }
            Self::Join { condition, .. } => condition
                .as_ref()
                .map_or(true, |condition| {
                    condition.data_type().can_coerce_to(&DataType::Bool)
                }),
            Self::Limit { count, .. } => count.data_type() == DataType::Int64,
            Self::Union { left, right } => {
                let left_output = left.output();
                let right_output = right.output();
                left_output.len() == right_output.len()
                    && left_output.iter().zip(&right_output).all(|(l, r)| {
                        l.data_type.common_supertype(&r.data_type).is_some()
                    })
            }
        };

        self_ok
            && self.expressions().iter().all(|expr| expr.is_well_typed())
            && self.children().iter().all(|child| child.is_well_typed())
    }

    /// Whether the plan is well-typed with no redundant implicit casts, and
    /// union sides match exactly rather than up to coercion.
    pub fn is_strictly_typed(&self) -> bool {
        let self_strict = match self {
            Self::Union { left, right } => left
                .output()
                .iter()
                .zip(right.output())
                .all(|(l, r)| l.data_type == r.data_type),
            _ => true,
        };

        self_strict
            && self.is_well_typed()
            && self
                .expressions()
                .iter()
                .all(|expr| expr.is_strictly_typed())
            && self.children().iter().all(|child| child.is_strictly_typed())
    }

    /// Rebuild this node with each expression slot replaced through `g`,
    /// returning `None` when every slot comes back pointer-identical.
    fn map_expressions<G>(&self, g: &G) -> Option<Self>
    where
        G: Fn(&Arc<Expr>) -> Arc<Expr>,
    {
        match self {
            Self::Project { input, projections } => {
                let mut changed = false;
                let new_projections: Vec<Arc<Expr>> = projections
                    .iter()
                    .map(|projection| {
                        let new = g(projection);
                        if !Arc::ptr_eq(&new, projection) {
                            changed = true;
                        }
                        new
                    })
                    .collect();
                changed.then(|| Self::Project {
                    input: Arc::clone(input),
                    projections: new_projections,
                })
            }
            Self::Filter { input, predicate } => {
                let new = g(predicate);
                (!Arc::ptr_eq(&new, predicate)).then(|| Self::Filter {
                    input: Arc::clone(input),
                    predicate: new,
                })
            }
            Self::Join {
                left,
                right,
                join_type,
                condition: Some(condition),
            } => {
                let new = g(condition);
                (!Arc::ptr_eq(&new, condition)).then(|| Self::Join {
                    left: Arc::clone(left),
                    right: Arc::clone(right),
                    join_type: *join_type,
                    condition: Some(new),
                })
            }
            Self::Limit { input, count } => {
                let new = g(count);
                (!Arc::ptr_eq(&new, count)).then(|| Self::Limit {
                    input: Arc::clone(input),
                    count: new,
                })
            }
            _ => None,
        }
    }

    /// Render this plan as an indented tree.
    pub fn pretty_tree(&self) -> String {
        DisplayTree::new(self).to_string()
    }
}

/// Apply `f` pre-order inside every expression slot of every plan node.
pub fn transform_expressions<F>(plan: &Arc<LogicalPlan>, f: &F) -> Arc<LogicalPlan>
where
    F: Fn(&Expr) -> Option<Expr>,
{
    tree::transform_down(plan, &|node: &LogicalPlan| {
        node.map_expressions(&|slot| tree::transform_down(slot, f))
    })
}

/// Apply `f` post-order inside every expression slot of every plan node.
/// Collapsing rewrites use this so nested patterns reduce in one pass.
pub fn transform_expressions_up<F>(plan: &Arc<LogicalPlan>, f: &F) -> Arc<LogicalPlan>
where
    F: Fn(&Expr) -> Option<Expr>,
{
    tree::transform_down(plan, &|node: &LogicalPlan| {
        node.map_expressions(&|slot| tree::transform_up(slot, f))
    })
}

/// Gather `f`'s matches across every expression of the plan, in document
/// order.
pub fn collect_expressions<B, F>(plan: &LogicalPlan, f: &F) -> Vec<B>
where
    F: Fn(&Expr) -> Option<B>,
{
    let mut out = Vec::new();
    collect_expressions_into(plan, f, &mut out);
    out
}

fn collect_expressions_into<B, F>(plan: &LogicalPlan, f: &F, out: &mut Vec<B>)
where
    F: Fn(&Expr) -> Option<B>,
{
    for slot in plan.expressions() {
        out.extend(tree::collect(slot, f));
    }
    for child in plan.children() {
        collect_expressions_into(child, f, out);
    }
}

fn nullify(attrs: &mut [AttributeRef]) {
    for attr in attrs {
        attr.nullable = true;
    }
}

impl TreeNode for LogicalPlan {
    fn children(&self) -> Vec<&Arc<Self>> {
        match self {
            Self::Relation { .. } | Self::LocalRelation { .. } => vec![],
            Self::Project { input, .. }
            | Self::Filter { input, .. }
            | Self::Limit { input, .. }
            | Self::Subquery { input, .. } => vec![input],
            Self::Join { left, right, .. } | Self::Union { left, right } => vec![left, right],
        }
    }

    fn with_children(&self, children: Vec<Arc<Self>>) -> Self {
        debug_assert_eq!(children.len(), self.children().len());
        let mut it = children.into_iter();
        match self {
            Self::Relation { .. } | Self::LocalRelation { .. } => self.clone(),
            Self::Project { projections, .. } => Self::Project {
                input: it.next().unwrap(),
                projections: projections.clone(),
            },
            Self::Filter { predicate, .. } => Self::Filter {
                input: it.next().unwrap(),
                predicate: Arc::clone(predicate),
            },
            Self::Join {
                join_type,
                condition,
                ..
            } => Self::Join {
                left: it.next().unwrap(),
                right: it.next().unwrap(),
                join_type: *join_type,
                condition: condition.clone(),
            },
            Self::Limit { count, .. } => Self::Limit {
                input: it.next().unwrap(),
                count: Arc::clone(count),
            },
            Self::Union { .. } => Self::Union {
                left: it.next().unwrap(),
                right: it.next().unwrap(),
            },
            Self::Subquery { alias, .. } => Self::Subquery {
                input: it.next().unwrap(),
                alias: alias.clone(),
            },
        }
    }
}

impl std::fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.details() {
            Some(details) => write!(f, "{}: {details}", self.name()),
            None => write!(f, "{}", self.name()),
        }
    }
}

impl DisplayNode for LogicalPlan {
    fn node_name(&self) -> &str {
        self.name()
    }

    fn child_nodes(&self) -> Vec<&dyn DisplayNode> {
        self.children()
            .into_iter()
            .map(|child| child.as_ref() as &dyn DisplayNode)
            .collect()
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Relation { name, .. } => Some(name.clone()),
            Self::LocalRelation { rows, output } => {
                let attrs = output
                    .iter()
                    .map(|attr| attr.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(format!("[{attrs}], {} rows", rows.len()))
            }
            Self::Project { projections, .. } => {
                let items = projections
                    .iter()
                    .map(|projection| projection.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                Some(format!("[{items}]"))
            }
            Self::Filter { predicate, .. } => Some(predicate.to_string()),
            Self::Join {
                join_type,
                condition,
                ..
            } => match condition {
                Some(condition) => Some(format!("{join_type}, on {condition}")),
                None => Some(join_type.to_string()),
            },
            Self::Limit { count, .. } => Some(count.to_string()),
            Self::Union { .. } => None,
            Self::Subquery { alias, .. } => Some(alias.clone()),
        }
    }
}
