//! End-to-end optimizer scenarios.
//!
//! Each test drives the full default batch over a small plan and pins the
//! exact optimized shape, then re-checks the universal guarantees: schema
//! stability, id hygiene, preserved resolution and typing, and idempotence
//! of the whole pipeline.

use std::sync::Arc;

use opal_core::{DataType, ExpressionId, IdGenerator, Value};
use opal_logical::expr::{lit, Expr};
use opal_logical::plan::collect_expressions;
use opal_logical::testing::{execute, row_bag};
use opal_logical::{JoinType, LogicalPlan, PlanBuilder};
use opal_optimizer::optimize;

fn t1(ids: &IdGenerator) -> PlanBuilder {
    PlanBuilder::relation(
        "t1",
        &[("a", DataType::Int64), ("b", DataType::Int64)],
        ids,
    )
}

fn t2(ids: &IdGenerator) -> PlanBuilder {
    PlanBuilder::relation(
        "t2",
        &[("c", DataType::Int64), ("d", DataType::Int64)],
        ids,
    )
}

/// The guarantees every optimization run must uphold.
fn check_invariants(input: &Arc<LogicalPlan>, output: &Arc<LogicalPlan>) {
    let schema = |plan: &Arc<LogicalPlan>| {
        plan.output()
            .into_iter()
            .map(|attr| (attr.name, attr.data_type))
            .collect::<Vec<_>>()
    };
    assert_eq!(schema(input), schema(output), "output schema must be stable");

    let output_ids = |plan: &Arc<LogicalPlan>| {
        let mut ids: Vec<ExpressionId> = plan.output().into_iter().map(|attr| attr.id).collect();
        ids.sort();
        ids
    };
    assert_eq!(
        output_ids(input),
        output_ids(output),
        "root output ids must be preserved"
    );

    assert!(output.is_resolved());
    if input.is_strictly_typed() {
        assert!(output.is_strictly_typed());
    }

    // Whole-pipeline idempotence.
    let again = optimize(Arc::clone(output)).unwrap();
    assert_eq!(&again.plan, output, "optimize must be idempotent");
}

fn run(plan: Arc<LogicalPlan>) -> Arc<LogicalPlan> {
    let result = optimize(Arc::clone(&plan)).unwrap();
    assert!(result.converged);
    check_invariants(&plan, &result.plan);
    result.plan
}

#[test]
fn s1_constant_folding() {
    let ids = IdGenerator::new();
    let t1 = t1(&ids);
    let a = t1.attr("a");

    let plan = t1
        .clone()
        .filter(
            lit(1i64)
                .add_expr(lit(2i64))
                .eq(lit(3i64))
                .and(a.to_expr().gt(lit(0i64))),
        )
        .build();

    let optimized = run(plan);
    assert_eq!(optimized, t1.filter(a.to_expr().gt(lit(0i64))).build());
}

#[test]
fn s2_filter_pushdown_through_inner_join() {
    let ids = IdGenerator::new();
    let t1 = t1(&ids);
    let t2 = t2(&ids);
    let (a, c, d) = (t1.attr("a"), t2.attr("c"), t2.attr("d"));
    let on = a.to_expr().eq(c.to_expr());

    let plan = t1
        .clone()
        .join(t2.clone(), JoinType::Inner, Some(on.clone()))
        .filter(
            a.to_expr()
                .gt(lit(0i64))
                .and(d.to_expr().lt(lit(5i64)))
                .and(a.to_expr().add_expr(c.to_expr()).eq(lit(10i64))),
        )
        .build();

    let optimized = run(plan);
    let expected = t1
        .filter(a.to_expr().gt(lit(0i64)))
        .join(
            t2.filter(d.to_expr().lt(lit(5i64))),
            JoinType::Inner,
            Some(on.and(a.to_expr().add_expr(c.to_expr()).eq(lit(10i64)))),
        )
        .build();
    assert_eq!(optimized, expected);
}

#[test]
fn s3_filter_pushdown_through_project_with_alias_inlining() {
    let ids = IdGenerator::new();
    let t1 = t1(&ids);
    let b = t1.attr("b");
    let x = ids.next_id();

    let projected = t1
        .clone()
        .project(vec![b.to_expr().add_expr(lit(1i64)).alias("x", x)]);
    let x_attr = projected.attr("x");
    let plan = projected.filter(x_attr.to_expr().gt(lit(3i64))).build();

    let optimized = run(plan);
    let expected = t1
        .filter(b.to_expr().add_expr(lit(1i64)).gt(lit(3i64)))
        .project(vec![b.to_expr().add_expr(lit(1i64)).alias("x", x)])
        .build();
    assert_eq!(optimized, expected);
}

#[test]
fn s4_double_negation_and_de_morgan() {
    let ids = IdGenerator::new();
    let t1 = t1(&ids);
    let (a, b) = (t1.attr("a"), t1.attr("b"));

    let plan = t1
        .clone()
        .filter(
            a.to_expr()
                .gt(lit(0i64))
                .logical_not()
                .logical_not()
                .and(
                    a.to_expr()
                        .eq(lit(1i64))
                        .and(b.to_expr().eq(lit(2i64)))
                        .logical_not(),
                ),
        )
        .build();

    let optimized = run(plan);
    let expected = t1
        .filter(
            a.to_expr().gt(lit(0i64)).and(
                a.to_expr()
                    .not_eq(lit(1i64))
                    .or(b.to_expr().not_eq(lit(2i64))),
            ),
        )
        .build();
    assert_eq!(optimized, expected);
}

#[test]
fn s5_limit_under_union() {
    let ids = IdGenerator::new();
    let t1 = t1(&ids);
    let t2 = t2(&ids);

    let plan = t1.clone().union(t2.clone()).limit(10).build();

    let optimized = run(plan);
    let expected = t1.limit(10).union(t2.limit(10)).limit(10).build();
    assert_eq!(optimized, expected);
}

#[test]
fn s6_nested_limit_collapse() {
    let ids = IdGenerator::new();
    let t1 = t1(&ids);

    let plan = t1.clone().limit(5).limit(10).build();

    let optimized = run(plan);
    assert_eq!(optimized, t1.limit(5).build());
}

#[test]
fn s7_subquery_elimination() {
    let ids = IdGenerator::new();
    let t1 = t1(&ids);
    let (a, b) = (t1.attr("a"), t1.attr("b"));

    let scoped = t1
        .clone()
        .project(vec![a.to_expr(), b.to_expr()])
        .subquery("s");
    let qualified = scoped.attr("a");
    assert_eq!(qualified.qualifier.as_deref(), Some("s"));
    let plan = scoped.filter(qualified.to_expr().gt(lit(0i64))).build();

    let optimized = run(plan);

    // The scope is gone, every qualifier is cleared, and the identity
    // projection the subquery wrapped dissolves with it.
    let expected = t1.filter(a.to_expr().gt(lit(0i64))).build();
    assert_eq!(optimized, expected);

    let qualifiers = collect_expressions(&optimized, &|e| match e {
        Expr::Attribute(attr) => attr.qualifier.clone(),
        _ => None,
    });
    assert!(qualifiers.is_empty());
}

#[test]
fn unresolved_plans_are_rejected() {
    let ids = IdGenerator::new();
    let plan = t1(&ids)
        .filter(opal_logical::expr::col("a").gt(lit(0i64)))
        .build();

    let error = optimize(plan).unwrap_err();
    assert!(error.to_string().starts_with("UnresolvedPlan"));
}

#[test]
fn optimized_plans_evaluate_identically() {
    let ids = IdGenerator::new();
    let data = PlanBuilder::local_relation(
        vec![
            vec![Value::Int64(1), Value::Int64(10)],
            vec![Value::Int64(2), Value::Int64(20)],
            vec![Value::Int64(3), Value::Null],
            vec![Value::Int64(4), Value::Int64(40)],
        ],
        &[("a", DataType::Int64), ("b", DataType::Int64)],
        &ids,
    );
    let (a, b) = (data.attr("a"), data.attr("b"));
    let x = ids.next_id();

    // A little of everything: arithmetic, negation, aliasing, limits.
    let plan = data
        .project(vec![
            a.to_expr(),
            b.to_expr().add_expr(lit(1i64)).alias("x", x),
        ])
        .filter(
            a.to_expr()
                .lt_eq(lit(1i64))
                .logical_not()
                .and(lit(0i64).lt(lit(1i64))),
        )
        .limit(2)
        .build();

    let optimized = optimize(Arc::clone(&plan)).unwrap().plan;
    assert_ne!(plan, optimized);
    assert_eq!(
        row_bag(&execute(&plan).unwrap()),
        row_bag(&execute(&optimized).unwrap())
    );
}

#[test]
fn trace_reports_the_rules_that_fired() {
    let ids = IdGenerator::new();
    let t1 = t1(&ids);
    let a = t1.attr("a");

    let plan = t1
        .filter(a.to_expr().gt(lit(1i64).add_expr(lit(1i64))))
        .build();

    let result = opal_optimizer::optimize_with_trace(plan).unwrap();
    assert!(result.trace.iter().any(|t| t.rule_name == "FoldConstants"));
    assert!(result.format_trace().contains("FoldConstants"));
}
