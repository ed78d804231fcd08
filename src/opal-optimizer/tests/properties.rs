//! Property tests for the optimizer's universal guarantees.
//!
//! Plans are generated as small abstract shapes over inline relations with
//! random rows (nulls included), so every guarantee is checked against
//! three-valued semantics, not just the happy path:
//!
//! 1. `optimize` is idempotent
//! 2. resolution and strict typing are preserved
//! 3. the output schema (names and types) is stable
//! 4. root output ids are preserved
//! 5. each individual rule is idempotent
//! 6. the optimized plan evaluates to the same row bag as the input

use std::sync::Arc;

use proptest::prelude::*;

use opal_core::{DataType, ExpressionId, IdGenerator, Value};
use opal_logical::expr::{lit, AttributeRef, Expr};
use opal_logical::testing::{execute, row_bag};
use opal_logical::{JoinType, LogicalPlan, PlanBuilder};
use opal_optimizer::{optimize, rules, Rule};

/// Abstract predicate over two attributes, realized against concrete
/// attribute references at build time.
#[derive(Debug, Clone)]
enum Pred {
    CmpFirst(u8, i64),
    CmpSecond(u8, i64),
    SecondIsNull,
    Const(bool),
    Not(Box<Pred>),
    And(Box<Pred>, Box<Pred>),
    Or(Box<Pred>, Box<Pred>),
}

fn arb_pred() -> impl Strategy<Value = Pred> {
    let leaf = prop_oneof![
        (0u8..6, -4i64..5).prop_map(|(op, n)| Pred::CmpFirst(op, n)),
        (0u8..6, -4i64..5).prop_map(|(op, n)| Pred::CmpSecond(op, n)),
        Just(Pred::SecondIsNull),
        any::<bool>().prop_map(Pred::Const),
    ];
    leaf.prop_recursive(3, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(|p| Pred::Not(Box::new(p))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Pred::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner).prop_map(|(a, b)| Pred::Or(Box::new(a), Box::new(b))),
        ]
    })
}

fn compare(attr: &AttributeRef, op: u8, n: i64) -> Expr {
    let (lhs, rhs) = (attr.to_expr(), lit(n));
    match op % 6 {
        0 => lhs.eq(rhs),
        1 => lhs.not_eq(rhs),
        2 => lhs.lt(rhs),
        3 => lhs.lt_eq(rhs),
        4 => lhs.gt(rhs),
        _ => lhs.gt_eq(rhs),
    }
}

fn build_pred(pred: &Pred, first: &AttributeRef, second: &AttributeRef) -> Expr {
    match pred {
        Pred::CmpFirst(op, n) => compare(first, *op, *n),
        Pred::CmpSecond(op, n) => compare(second, *op, *n),
        Pred::SecondIsNull => second.to_expr().is_null(),
        Pred::Const(b) => lit(*b),
        Pred::Not(inner) => build_pred(inner, first, second).logical_not(),
        Pred::And(a, b) => {
            build_pred(a, first, second).and(build_pred(b, first, second))
        }
        Pred::Or(a, b) => build_pred(a, first, second).or(build_pred(b, first, second)),
    }
}

/// Plan shapes exercising every operator the rule library rewrites.
#[derive(Debug, Clone)]
enum Shape {
    Filter(Pred),
    /// Filter over a projection that derives `x = b + 1`; the predicate
    /// speaks `a` and `x`, so pushdown must inline the alias.
    ProjectFilter(Pred),
    NestedLimits(u8, u8),
    UnionLimit(u8),
    /// Filter over an inner join of two relations; the predicate speaks one
    /// attribute of each side.
    JoinFilter(Pred),
    SubqueryFilter(Pred),
    /// Projections wrapping cast chains over string, bool, and int columns:
    /// a round-tripping `Int64 -> String -> Int64` chain, a reparsing
    /// `String -> Int64 -> String` chain over zero-padded numerals, and a
    /// `Bool -> String -> Int64` chain whose flattened form would be
    /// ill-typed.
    CastChains,
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        arb_pred().prop_map(Shape::Filter),
        arb_pred().prop_map(Shape::ProjectFilter),
        (any::<u8>(), any::<u8>()).prop_map(|(m, n)| Shape::NestedLimits(m, n)),
        any::<u8>().prop_map(Shape::UnionLimit),
        arb_pred().prop_map(Shape::JoinFilter),
        arb_pred().prop_map(Shape::SubqueryFilter),
        Just(Shape::CastChains),
    ]
}

fn arb_rows() -> impl Strategy<Value = Vec<Vec<Value>>> {
    let cell = prop_oneof![
        3 => (-4i64..5).prop_map(Value::Int64),
        1 => Just(Value::Null),
    ];
    prop::collection::vec((cell.clone(), cell).prop_map(|(a, b)| vec![a, b]), 0..7)
}

fn build(shape: &Shape, rows1: Vec<Vec<Value>>, rows2: Vec<Vec<Value>>) -> Arc<LogicalPlan> {
    let ids = IdGenerator::new();
    let t1 = PlanBuilder::local_relation(
        rows1,
        &[("a", DataType::Int64), ("b", DataType::Int64)],
        &ids,
    );

    match shape {
        Shape::Filter(pred) => {
            let (a, b) = (t1.attr("a"), t1.attr("b"));
            t1.filter(build_pred(pred, &a, &b)).build()
        }
        Shape::ProjectFilter(pred) => {
            let (a, b) = (t1.attr("a"), t1.attr("b"));
            let projected = t1.project(vec![
                a.to_expr(),
                b.to_expr().add_expr(lit(1i64)).alias("x", ids.next_id()),
            ]);
            let x = projected.attr("x");
            projected.filter(build_pred(pred, &a, &x)).build()
        }
        Shape::NestedLimits(m, n) => t1.limit(i64::from(*m)).limit(i64::from(*n)).build(),
        Shape::UnionLimit(n) => {
            let t2 = PlanBuilder::local_relation(
                rows2,
                &[("a", DataType::Int64), ("b", DataType::Int64)],
                &ids,
            );
            t1.union(t2).limit(i64::from(*n)).build()
        }
        Shape::JoinFilter(pred) => {
            let t2 = PlanBuilder::local_relation(
                rows2,
                &[("c", DataType::Int64), ("d", DataType::Int64)],
                &ids,
            );
            let (a, c, d) = (t1.attr("a"), t2.attr("c"), t2.attr("d"));
            t1.join(t2, JoinType::Inner, Some(a.to_expr().eq(c.to_expr())))
                .filter(build_pred(pred, &a, &d))
                .build()
        }
        Shape::SubqueryFilter(pred) => {
            let scoped = t1.subquery("s");
            let (a, b) = (scoped.attr("a"), scoped.attr("b"));
            scoped.filter(build_pred(pred, &a, &b)).build()
        }
        Shape::CastChains => {
            // Zero-padded numerals ("007") parse as integers but do not
            // survive a re-render, which is what the cast rule must respect.
            let rows = rows2
                .iter()
                .map(|row| {
                    let s = match row.first() {
                        Some(Value::Int64(v)) => Value::String(format!("{v:03}")),
                        _ => Value::Null,
                    };
                    let flag = match row.get(1) {
                        Some(Value::Int64(v)) => Value::Bool(*v > 0),
                        _ => Value::Null,
                    };
                    let n = row.first().cloned().unwrap_or(Value::Null);
                    vec![s, flag, n]
                })
                .collect();
            let t3 = PlanBuilder::local_relation(
                rows,
                &[
                    ("s", DataType::String),
                    ("flag", DataType::Bool),
                    ("n", DataType::Int64),
                ],
                &ids,
            );
            let (s, flag, n) = (t3.attr("s"), t3.attr("flag"), t3.attr("n"));
            t3.project(vec![
                n.to_expr()
                    .cast(DataType::String)
                    .cast(DataType::Int64)
                    .alias("x", ids.next_id()),
                s.to_expr()
                    .cast(DataType::Int64)
                    .cast(DataType::String)
                    .alias("y", ids.next_id()),
                flag.to_expr()
                    .cast(DataType::String)
                    .cast(DataType::Int64)
                    .alias("z", ids.next_id()),
            ])
            .build()
        }
    }
}

fn schema(plan: &Arc<LogicalPlan>) -> Vec<(String, DataType)> {
    plan.output()
        .into_iter()
        .map(|attr| (attr.name, attr.data_type))
        .collect()
}

fn output_ids(plan: &Arc<LogicalPlan>) -> Vec<ExpressionId> {
    let mut ids: Vec<ExpressionId> = plan.output().into_iter().map(|attr| attr.id).collect();
    ids.sort();
    ids
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn optimizer_guarantees_hold(
        shape in arb_shape(),
        rows1 in arb_rows(),
        rows2 in arb_rows(),
    ) {
        let plan = build(&shape, rows1, rows2);
        prop_assert!(plan.is_resolved());
        prop_assert!(plan.is_strictly_typed());

        let optimized = optimize(Arc::clone(&plan)).unwrap().plan;

        // Resolution and strict typing are preserved.
        prop_assert!(optimized.is_resolved());
        prop_assert!(optimized.is_strictly_typed());

        // The output schema and the root's attribute ids are stable.
        prop_assert_eq!(schema(&plan), schema(&optimized));
        prop_assert_eq!(output_ids(&plan), output_ids(&optimized));

        // Optimization is idempotent.
        let again = optimize(Arc::clone(&optimized)).unwrap().plan;
        prop_assert_eq!(&again, &optimized);

        // The optimized plan computes the same row bag; a plan whose
        // evaluation fails (an unparseable cast at runtime) must still fail.
        match execute(&plan) {
            Ok(rows) => prop_assert_eq!(
                row_bag(&execute(&optimized).unwrap()),
                row_bag(&rows)
            ),
            Err(_) => prop_assert!(execute(&optimized).is_err()),
        }
    }

    #[test]
    fn every_rule_is_individually_idempotent(
        shape in arb_shape(),
        rows1 in arb_rows(),
        rows2 in arb_rows(),
    ) {
        let plan = build(&shape, rows1, rows2);

        let mut all: Vec<Box<dyn Rule>> = rules::default_rules();
        all.push(Box::new(rules::FoldConstantFilters));

        for rule in &all {
            let once = rule.apply(Arc::clone(&plan)).unwrap().plan;
            let twice = rule.apply(Arc::clone(&once)).unwrap();
            prop_assert_eq!(
                &twice.plan,
                &once,
                "rule {} is not idempotent",
                rule.name()
            );
        }
    }

    #[test]
    fn every_rule_preserves_semantics(
        shape in arb_shape(),
        rows1 in arb_rows(),
        rows2 in arb_rows(),
    ) {
        let plan = build(&shape, rows1, rows2);
        let baseline = execute(&plan);

        let mut all: Vec<Box<dyn Rule>> = rules::default_rules();
        all.push(Box::new(rules::FoldConstantFilters));

        for rule in &all {
            let rewritten = rule.apply(Arc::clone(&plan)).unwrap().plan;
            match &baseline {
                Ok(rows) => prop_assert_eq!(
                    &row_bag(&execute(&rewritten).unwrap()),
                    &row_bag(rows),
                    "rule {} changed semantics",
                    rule.name()
                ),
                Err(_) => prop_assert!(
                    execute(&rewritten).is_err(),
                    "rule {} made a failing plan succeed",
                    rule.name()
                ),
            }
        }
    }
}
