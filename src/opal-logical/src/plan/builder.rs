//! Fluent construction of logical plans.
//!
//! The builder mirrors what the analyzer produces: it mints attribute ids
//! from a caller-supplied [`IdGenerator`] and keeps the running plan's output
//! available for building resolved expressions against it.

use std::sync::Arc;

use opal_core::{DataType, IdGenerator, Value};

use super::{JoinType, LogicalPlan};
use crate::expr::{lit, AttributeRef, Expr};

/// Builder for logical plans.
///
/// ```rust
/// use opal_core::{DataType, IdGenerator};
/// use opal_logical::expr::lit;
/// use opal_logical::plan::PlanBuilder;
///
/// let ids = IdGenerator::new();
/// let t1 = PlanBuilder::relation("t1", &[("a", DataType::Int64)], &ids);
/// let a = t1.attr("a");
///
/// let plan = t1.filter(a.to_expr().gt(lit(0i64))).limit(10).build();
/// assert!(plan.is_resolved());
/// ```
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    plan: Arc<LogicalPlan>,
}

impl PlanBuilder {
    /// Start from a named base relation with the given columns, minting one
    /// attribute id per column.
    pub fn relation(name: &str, columns: &[(&str, DataType)], ids: &IdGenerator) -> Self {
        let output = columns
            .iter()
            .map(|(column, data_type)| {
                AttributeRef::new(ids.next_id(), *column, *data_type, false)
            })
            .collect();
        Self {
            plan: Arc::new(LogicalPlan::relation(name, output)),
        }
    }

    /// Start from an inline relation. Column nullability is inferred from the
    /// rows.
    pub fn local_relation(
        rows: Vec<Vec<Value>>,
        columns: &[(&str, DataType)],
        ids: &IdGenerator,
    ) -> Self {
        let output = columns
            .iter()
            .enumerate()
            .map(|(position, (column, data_type))| {
                let nullable = rows
                    .iter()
                    .any(|row| row.get(position).is_some_and(Value::is_null));
                let mut attr = AttributeRef::new(ids.next_id(), *column, *data_type, false);
                attr.nullable = nullable;
                attr
            })
            .collect();
        Self {
            plan: Arc::new(LogicalPlan::local_relation(rows, output)),
        }
    }

    /// Continue building from an existing plan.
    pub fn from_plan(plan: Arc<LogicalPlan>) -> Self {
        Self { plan }
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(self, predicate: Expr) -> Self {
        Self {
            plan: Arc::new(LogicalPlan::filter(self.plan, predicate)),
        }
    }

    /// Add a projection.
    #[must_use]
    pub fn project(self, projections: Vec<Expr>) -> Self {
        Self {
            plan: Arc::new(LogicalPlan::project(self.plan, projections)),
        }
    }

    /// Join with another plan.
    #[must_use]
    pub fn join(self, right: Self, join_type: JoinType, condition: Option<Expr>) -> Self {
        Self {
            plan: Arc::new(LogicalPlan::join(self.plan, right.plan, join_type, condition)),
        }
    }

    /// Add a literal limit.
    #[must_use]
    pub fn limit(self, count: i64) -> Self {
        self.limit_expr(lit(count))
    }

    /// Add a limit with an arbitrary (attribute-free) count expression.
    #[must_use]
    pub fn limit_expr(self, count: Expr) -> Self {
        Self {
            plan: Arc::new(LogicalPlan::limit(self.plan, count)),
        }
    }

    /// Union with another plan.
    #[must_use]
    pub fn union(self, right: Self) -> Self {
        Self {
            plan: Arc::new(LogicalPlan::union(self.plan, right.plan)),
        }
    }

    /// Wrap in a named subquery scope.
    #[must_use]
    pub fn subquery(self, alias: &str) -> Self {
        Self {
            plan: Arc::new(LogicalPlan::subquery(self.plan, alias)),
        }
    }

    /// The attributes the current plan produces.
    pub fn output(&self) -> Vec<AttributeRef> {
        self.plan.output()
    }

    /// Look up an output attribute by name.
    ///
    /// # Panics
    ///
    /// Panics if the current plan produces no attribute named `name`.
    #[track_caller]
    pub fn attr(&self, name: &str) -> AttributeRef {
        self.output()
            .into_iter()
            .find(|attr| attr.name == name)
            .unwrap_or_else(|| panic!("no output attribute named `{name}`"))
    }

    /// Finish building.
    pub fn build(self) -> Arc<LogicalPlan> {
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let ids = IdGenerator::new();
        let t1 = PlanBuilder::relation(
            "t1",
            &[("a", DataType::Int64), ("b", DataType::Int64)],
            &ids,
        );
        let a = t1.attr("a");
        let b = t1.attr("b");

        let plan = t1
            .filter(a.to_expr().gt(lit(0i64)))
            .project(vec![b.to_expr().add_expr(lit(1i64)).alias("x", ids.next_id())])
            .limit(10)
            .build();

        assert!(plan.is_resolved());
        assert!(plan.is_well_typed());
        assert_eq!(plan.output().len(), 1);
        assert_eq!(plan.output()[0].name, "x");
    }

    #[test]
    fn test_from_plan_continues_building() {
        let ids = IdGenerator::new();
        let t1 = PlanBuilder::relation("t1", &[("a", DataType::Int64)], &ids);
        let a = t1.attr("a");
        let base = t1.build();

        let extended = PlanBuilder::from_plan(base)
            .filter(a.to_expr().gt(lit(0i64)))
            .build();
        assert!(extended.is_resolved());
    }

    #[test]
    fn test_local_relation_nullability() {
        let ids = IdGenerator::new();
        let rows = vec![
            vec![Value::Int64(1), Value::Null],
            vec![Value::Int64(2), Value::Int64(5)],
        ];
        let t = PlanBuilder::local_relation(
            rows,
            &[("a", DataType::Int64), ("b", DataType::Int64)],
            &ids,
        );

        assert!(!t.attr("a").nullable);
        assert!(t.attr("b").nullable);
    }

    #[test]
    fn test_join_exposes_both_sides() {
        let ids = IdGenerator::new();
        let t1 = PlanBuilder::relation("t1", &[("a", DataType::Int64)], &ids);
        let t2 = PlanBuilder::relation("t2", &[("c", DataType::Int64)], &ids);
        let (a, c) = (t1.attr("a"), t2.attr("c"));

        let joined = t1.join(t2, JoinType::Inner, Some(a.to_expr().eq(c.to_expr())));
        assert_eq!(joined.output().len(), 2);
        assert!(joined.build().is_resolved());
    }

    #[test]
    fn test_subquery_qualifies_attrs() {
        let ids = IdGenerator::new();
        let t1 = PlanBuilder::relation("t1", &[("a", DataType::Int64)], &ids).subquery("s");

        assert_eq!(t1.attr("a").qualifier.as_deref(), Some("s"));
    }
}
