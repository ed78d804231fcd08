//! Constant evaluation for foldable expressions.
//!
//! Evaluation follows SQL three-valued logic: comparisons and arithmetic over
//! a null operand yield null, `AND`/`OR` use the Kleene truth tables, and a
//! zero divisor yields null rather than trapping. Integer overflow makes the
//! expression non-evaluable instead of wrapping, so folding simply skips it.

use opal_core::Value;

use super::{BinaryOp, Expr, UnaryOp};

/// Evaluate a foldable expression to a constant.
///
/// Returns `None` when the expression references an attribute, overflows, or
/// casts a value that does not convert. Callers fold only on `Some`.
pub fn evaluate(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Literal { value, .. } => Some(value.clone()),
        Expr::Attribute(_) | Expr::UnresolvedAttribute { .. } => None,
        Expr::Alias { child, .. } => evaluate(child),
        Expr::Cast { child, data_type } => evaluate(child)?.cast_to(data_type),

        Expr::Binary { left, op, right } => {
            let lhs = evaluate(left)?;
            let rhs = evaluate(right)?;
            match op {
                BinaryOp::And => Some(kleene_and(&lhs, &rhs)),
                BinaryOp::Or => Some(kleene_or(&lhs, &rhs)),
                _ if lhs.is_null() || rhs.is_null() => Some(Value::Null),
                _ => evaluate_binary(&lhs, *op, &rhs),
            }
        }

        Expr::Unary { op, child } => {
            let value = evaluate(child)?;
            evaluate_unary(*op, &value)
        }

        Expr::If {
            condition,
            when_true,
            when_false,
        } => {
            // A null condition routes to the else branch.
            if evaluate(condition)? == Value::Bool(true) {
                evaluate(when_true)
            } else {
                evaluate(when_false)
            }
        }

        Expr::Coalesce { args } => {
            for arg in args {
                let value = evaluate(arg)?;
                if !value.is_null() {
                    return Some(value);
                }
            }
            Some(Value::Null)
        }
    }
}

/// Kleene AND: false dominates, null absorbs the rest.
fn kleene_and(left: &Value, right: &Value) -> Value {
    match (left.as_bool(), right.as_bool()) {
        (Some(false), _) | (_, Some(false)) => Value::Bool(false),
        (Some(true), Some(true)) => Value::Bool(true),
        _ => Value::Null,
    }
}

/// Kleene OR: true dominates, null absorbs the rest.
fn kleene_or(left: &Value, right: &Value) -> Value {
    match (left.as_bool(), right.as_bool()) {
        (Some(true), _) | (_, Some(true)) => Value::Bool(true),
        (Some(false), Some(false)) => Value::Bool(false),
        _ => Value::Null,
    }
}

/// Evaluate a binary operation on two non-null literal values.
fn evaluate_binary(left: &Value, op: BinaryOp, right: &Value) -> Option<Value> {
    match (left, right, op) {
        // Integer arithmetic, overflow-checked
        (Value::Int64(l), Value::Int64(r), BinaryOp::Add) => l.checked_add(*r).map(Value::Int64),
        (Value::Int64(l), Value::Int64(r), BinaryOp::Sub) => l.checked_sub(*r).map(Value::Int64),
        (Value::Int64(l), Value::Int64(r), BinaryOp::Mul) => l.checked_mul(*r).map(Value::Int64),
        (Value::Int64(_), Value::Int64(0), BinaryOp::Div | BinaryOp::Mod) => Some(Value::Null),
        (Value::Int64(l), Value::Int64(r), BinaryOp::Div) => l.checked_div(*r).map(Value::Int64),
        (Value::Int64(l), Value::Int64(r), BinaryOp::Mod) => l.checked_rem(*r).map(Value::Int64),

        // Mixed or float arithmetic promotes to Float64
        (l, r, op)
            if op.is_arithmetic()
                && l.data_type().is_numeric()
                && r.data_type().is_numeric() =>
        {
            let (l, r) = (l.as_float64()?, r.as_float64()?);
            let out = match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div if r == 0.0 => return Some(Value::Null),
                BinaryOp::Div => l / r,
                BinaryOp::Mod if r == 0.0 => return Some(Value::Null),
                BinaryOp::Mod => l % r,
                _ => unreachable!(),
            };
            Some(Value::Float64(out))
        }

        // Integer comparisons stay exact
        (Value::Int64(l), Value::Int64(r), op) if op.is_comparison() => compare(op, l.cmp(r)),

        // Mixed or float comparisons
        (l, r, op)
            if op.is_comparison()
                && l.data_type().is_numeric()
                && r.data_type().is_numeric() =>
        {
            let (l, r) = (l.as_float64()?, r.as_float64()?);
            compare(op, l.partial_cmp(&r)?)
        }

        // String comparisons
        (Value::String(l), Value::String(r), op) if op.is_comparison() => compare(op, l.cmp(r)),

        // Boolean equality
        (Value::Bool(l), Value::Bool(r), BinaryOp::Eq) => Some(Value::Bool(l == r)),
        (Value::Bool(l), Value::Bool(r), BinaryOp::Neq) => Some(Value::Bool(l != r)),

        _ => None,
    }
}

fn compare(op: BinaryOp, ordering: std::cmp::Ordering) -> Option<Value> {
    let result = match op {
        BinaryOp::Eq => ordering.is_eq(),
        BinaryOp::Neq => ordering.is_ne(),
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Lte => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Gte => ordering.is_ge(),
        _ => return None,
    };
    Some(Value::Bool(result))
}

/// Evaluate a unary operation on a literal value.
fn evaluate_unary(op: UnaryOp, value: &Value) -> Option<Value> {
    match (op, value) {
        (UnaryOp::IsNull, v) => Some(Value::Bool(v.is_null())),
        (UnaryOp::IsNotNull, v) => Some(Value::Bool(!v.is_null())),
        (UnaryOp::Not | UnaryOp::Neg, Value::Null) => Some(Value::Null),
        (UnaryOp::Not, Value::Bool(b)) => Some(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int64(i)) => i.checked_neg().map(Value::Int64),
        (UnaryOp::Neg, Value::Float64(f)) => Some(Value::Float64(-f)),
        _ => None,
    }
}
