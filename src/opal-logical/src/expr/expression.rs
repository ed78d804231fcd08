//! The expression tree.

use std::collections::HashSet;
use std::sync::Arc;

use opal_core::tree::TreeNode;
use opal_core::{DataType, ExpressionId, Value};
use serde::{Deserialize, Serialize};

use super::{AttributeRef, BinaryOp, UnaryOp};

/// A logical expression in the Opal query system.
///
/// Expressions are pure computations over attributes. Children are `Arc`-held
/// so rewrites share every subtree they do not touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A literal constant value. The declared type matters for null literals,
    /// whose value alone does not determine one.
    Literal {
        /// The constant value.
        value: Value,
        /// Declared type of the literal.
        data_type: DataType,
    },

    /// A resolved attribute reference.
    Attribute(AttributeRef),

    /// An unresolved column reference, as emitted by the parser. The analyzer
    /// replaces every one of these; the optimizer rejects plans that still
    /// contain any.
    UnresolvedAttribute {
        /// Column name.
        name: String,
        /// Optional relation qualifier.
        qualifier: Option<String>,
    },

    /// A named expression. The id makes the name referenceable from operators
    /// above the owning `Project`.
    Alias {
        /// The expression being named.
        child: Arc<Expr>,
        /// The visible name.
        name: String,
        /// Stable identity of the name.
        id: ExpressionId,
        /// Whether the analyzer synthesized this alias.
        generated: bool,
    },

    /// An explicit type conversion.
    Cast {
        /// The expression being converted.
        child: Arc<Expr>,
        /// Target type.
        data_type: DataType,
    },

    /// A binary operation.
    Binary {
        /// Left operand.
        left: Arc<Expr>,
        /// Binary operator.
        op: BinaryOp,
        /// Right operand.
        right: Arc<Expr>,
    },

    /// A unary operation.
    Unary {
        /// Unary operator.
        op: UnaryOp,
        /// Operand.
        child: Arc<Expr>,
    },

    /// A conditional. A null or false condition selects `when_false`.
    If {
        /// Boolean condition.
        condition: Arc<Expr>,
        /// Result when the condition is true.
        when_true: Arc<Expr>,
        /// Result when the condition is false or null.
        when_false: Arc<Expr>,
    },

    /// The first non-null argument, or null when all arguments are null.
    Coalesce {
        /// Candidate expressions, evaluated in order.
        args: Vec<Arc<Expr>>,
    },
}

impl Expr {
    // ========== Constructors ==========

    /// Create a literal expression; the type is taken from the value.
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        let data_type = value.data_type();
        Self::Literal { value, data_type }
    }

    /// Create a typed null literal.
    pub const fn null_literal(data_type: DataType) -> Self {
        Self::Literal {
            value: Value::Null,
            data_type,
        }
    }

    /// Create a binary expression.
    pub fn binary(left: Self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Arc::new(left),
            op,
            right: Arc::new(right),
        }
    }

    /// Create a unary expression.
    pub fn unary(op: UnaryOp, child: Self) -> Self {
        Self::Unary {
            op,
            child: Arc::new(child),
        }
    }

    /// Create a conditional expression.
    pub fn conditional(condition: Self, when_true: Self, when_false: Self) -> Self {
        Self::If {
            condition: Arc::new(condition),
            when_true: Arc::new(when_true),
            when_false: Arc::new(when_false),
        }
    }

    /// Create a COALESCE expression.
    pub fn coalesce(args: impl IntoIterator<Item = Self>) -> Self {
        Self::Coalesce {
            args: args.into_iter().map(Arc::new).collect(),
        }
    }

    /// Name this expression.
    #[must_use]
    pub fn alias(self, name: impl Into<String>, id: ExpressionId) -> Self {
        Self::Alias {
            child: Arc::new(self),
            name: name.into(),
            id,
            generated: false,
        }
    }

    /// Name this expression with an analyzer-synthesized alias.
    #[must_use]
    pub fn generated_alias(self, name: impl Into<String>, id: ExpressionId) -> Self {
        Self::Alias {
            child: Arc::new(self),
            name: name.into(),
            id,
            generated: true,
        }
    }

    /// Cast this expression to another type.
    #[must_use]
    pub fn cast(self, data_type: DataType) -> Self {
        Self::Cast {
            child: Arc::new(self),
            data_type,
        }
    }

    // ========== Convenience builders ==========

    /// Create an AND expression.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::And, other)
    }

    /// Create an OR expression.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Or, other)
    }

    /// Create a NOT expression.
    #[must_use]
    pub fn logical_not(self) -> Self {
        Self::unary(UnaryOp::Not, self)
    }

    /// Create an equality expression.
    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Eq, other)
    }

    /// Create an inequality expression.
    #[must_use]
    pub fn not_eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Neq, other)
    }

    /// Create a less than expression.
    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Lt, other)
    }

    /// Create a less than or equal expression.
    #[must_use]
    pub fn lt_eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Lte, other)
    }

    /// Create a greater than expression.
    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Gt, other)
    }

    /// Create a greater than or equal expression.
    #[must_use]
    pub fn gt_eq(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Gte, other)
    }

    /// Create an addition expression.
    #[must_use]
    pub fn add_expr(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Add, other)
    }

    /// Create a subtraction expression.
    #[must_use]
    pub fn sub_expr(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Sub, other)
    }

    /// Create a multiplication expression.
    #[must_use]
    pub fn mul_expr(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Mul, other)
    }

    /// Create a division expression.
    #[must_use]
    pub fn div_expr(self, other: Self) -> Self {
        Self::binary(self, BinaryOp::Div, other)
    }

    /// Create an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Self {
        Self::unary(UnaryOp::IsNull, self)
    }

    /// Create an IS NOT NULL expression.
    #[must_use]
    pub fn is_not_null(self) -> Self {
        Self::unary(UnaryOp::IsNotNull, self)
    }

    // ========== Analysis methods ==========

    /// Check if this expression is a literal.
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }

    /// Get the literal value if this expression is one.
    pub const fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The result type of this expression. Only meaningful on well-typed
    /// trees; ill-typed operators report `Null`.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Literal { data_type, .. } | Self::Cast { data_type, .. } => *data_type,
            Self::Attribute(attr) => attr.data_type,
            Self::UnresolvedAttribute { .. } => DataType::Null,
            Self::Alias { child, .. } => child.data_type(),
            Self::Binary { left, op, right } => op
                .result_type(&left.data_type(), &right.data_type())
                .unwrap_or(DataType::Null),
            Self::Unary { op, child } => {
                op.result_type(&child.data_type()).unwrap_or(DataType::Null)
            }
            Self::If {
                when_true,
                when_false,
                ..
            } => when_true
                .data_type()
                .common_supertype(&when_false.data_type())
                .unwrap_or(DataType::Null),
            Self::Coalesce { args } => args
                .iter()
                .map(|arg| arg.data_type())
                .reduce(|a, b| a.common_supertype(&b).unwrap_or(DataType::Null))
                .unwrap_or(DataType::Null),
        }
    }

    /// Whether this expression may evaluate to null.
    pub fn nullable(&self) -> bool {
        match self {
            Self::Literal { value, .. } => value.is_null(),
            Self::Attribute(attr) => attr.nullable,
            Self::UnresolvedAttribute { .. } => true,
            Self::Alias { child, .. } | Self::Cast { child, .. } => child.nullable(),
            Self::Binary { left, op, right } => {
                // Division and modulo yield null on a zero divisor.
                matches!(op, BinaryOp::Div | BinaryOp::Mod)
                    || left.nullable()
                    || right.nullable()
            }
            Self::Unary { op, child } => match op {
                UnaryOp::IsNull | UnaryOp::IsNotNull => false,
                UnaryOp::Not | UnaryOp::Neg => child.nullable(),
            },
            Self::If {
                when_true,
                when_false,
                ..
            } => when_true.nullable() || when_false.nullable(),
            Self::Coalesce { args } => args.iter().all(|arg| arg.nullable()),
        }
    }

    /// Whether this expression can be evaluated at optimization time: no
    /// attribute references, every operator pure.
    pub fn is_foldable(&self) -> bool {
        match self {
            Self::Literal { .. } => true,
            Self::Attribute(_) | Self::UnresolvedAttribute { .. } => false,
            _ => self.is_pure() && self.children().iter().all(|child| child.is_foldable()),
        }
    }

    /// Whether evaluating this expression is free of side effects. Every
    /// operator in this algebra is pure; rules still gate on the predicate so
    /// that impure scalar functions slot in without touching them.
    pub fn is_pure(&self) -> bool {
        self.children().iter().all(|child| child.is_pure())
    }

    /// Whether analysis has bound every reference in this expression.
    pub fn is_resolved(&self) -> bool {
        match self {
            Self::UnresolvedAttribute { .. } => false,
            _ => self.children().iter().all(|child| child.is_resolved()),
        }
    }

    /// Whether every operator's operand types are in its accepted set.
    pub fn is_well_typed(&self) -> bool {
        let self_ok = match self {
            Self::Literal { value, data_type } => value.data_type().can_coerce_to(data_type),
            Self::Attribute(_) => true,
            Self::UnresolvedAttribute { .. } => false,
            Self::Alias { .. } => true,
            Self::Cast { child, data_type } => child.data_type().can_cast_to(data_type),
            Self::Binary { left, op, right } => op
                .result_type(&left.data_type(), &right.data_type())
                .is_some(),
            Self::Unary { op, child } => op.result_type(&child.data_type()).is_some(),
            Self::If {
                condition,
                when_true,
                when_false,
            } => {
                condition.data_type().can_coerce_to(&DataType::Bool)
                    && when_true
                        .data_type()
                        .common_supertype(&when_false.data_type())
                        .is_some()
            }
            Self::Coalesce { args } => {
                let mut types = args.iter().map(|arg| arg.data_type());
                match types.next() {
                    None => false,
                    Some(first) => types.try_fold(first, |a, b| a.common_supertype(&b)).is_some(),
                }
            }
        };

        self_ok && self.children().iter().all(|child| child.is_well_typed())
    }

    /// Whether this expression is well-typed and free of redundant casts.
    pub fn is_strictly_typed(&self) -> bool {
        self.is_well_typed()
            && !self.any(&|e| {
                matches!(e, Self::Cast { child, data_type } if child.data_type() == *data_type)
            })
    }

    /// The set of attribute ids this expression uses.
    pub fn references(&self) -> HashSet<ExpressionId> {
        let mut refs = HashSet::new();
        self.collect_references(&mut refs);
        refs
    }

    fn collect_references(&self, refs: &mut HashSet<ExpressionId>) {
        if let Self::Attribute(attr) = self {
            refs.insert(attr.id);
        }
        for child in self.children() {
            child.collect_references(refs);
        }
    }

    /// The attribute this expression produces when used in a projection list:
    /// attribute references pass through, aliases bind their id and name to
    /// the child's type. Anything unnamed yields `None`.
    pub fn to_attribute(&self) -> Option<AttributeRef> {
        match self {
            Self::Attribute(attr) => Some(attr.clone()),
            Self::Alias {
                child,
                name,
                id,
                generated,
            } => Some(AttributeRef {
                id: *id,
                name: name.clone(),
                data_type: child.data_type(),
                nullable: child.nullable(),
                qualifier: None,
                generated: *generated,
            }),
            _ => None,
        }
    }

    /// Strip any number of alias wrappers.
    pub fn unaliased(&self) -> &Self {
        let mut expr = self;
        while let Self::Alias { child, .. } = expr {
            expr = child;
        }
        expr
    }

    /// Semantic equality: structural equality modulo alias wrapping and
    /// cosmetic metadata. Attribute references compare by id alone; names and
    /// qualifiers do not participate.
    pub fn same(&self, other: &Self) -> bool {
        let (a, b) = (self.unaliased(), other.unaliased());
        match (a, b) {
            (
                Self::Literal {
                    value: v1,
                    data_type: t1,
                },
                Self::Literal {
                    value: v2,
                    data_type: t2,
                },
            ) => v1 == v2 && t1 == t2,
            (Self::Attribute(x), Self::Attribute(y)) => x.id == y.id,
            (
                Self::UnresolvedAttribute {
                    name: n1,
                    qualifier: q1,
                },
                Self::UnresolvedAttribute {
                    name: n2,
                    qualifier: q2,
                },
            ) => n1 == n2 && q1 == q2,
            (
                Self::Cast {
                    child: c1,
                    data_type: t1,
                },
                Self::Cast {
                    child: c2,
                    data_type: t2,
                },
            ) => t1 == t2 && c1.same(c2),
            (
                Self::Binary {
                    left: l1,
                    op: o1,
                    right: r1,
                },
                Self::Binary {
                    left: l2,
                    op: o2,
                    right: r2,
                },
            ) => o1 == o2 && l1.same(l2) && r1.same(r2),
            (Self::Unary { op: o1, child: c1 }, Self::Unary { op: o2, child: c2 }) => {
                o1 == o2 && c1.same(c2)
            }
            (
                Self::If {
                    condition: c1,
                    when_true: t1,
                    when_false: f1,
                },
                Self::If {
                    condition: c2,
                    when_true: t2,
                    when_false: f2,
                },
            ) => c1.same(c2) && t1.same(t2) && f1.same(f2),
            (Self::Coalesce { args: a1 }, Self::Coalesce { args: a2 }) => {
                a1.len() == a2.len() && a1.iter().zip(a2).all(|(x, y)| x.same(y))
            }
            _ => false,
        }
    }
}

impl Expr {
    /// Render this expression as an indented tree.
    pub fn pretty_tree(&self) -> String {
        common_display::DisplayTree::new(self).to_string()
    }
}

impl common_display::DisplayNode for Expr {
    fn node_name(&self) -> &str {
        match self {
            Self::Literal { .. } => "Literal",
            Self::Attribute(_) => "Attribute",
            Self::UnresolvedAttribute { .. } => "UnresolvedAttribute",
            Self::Alias { .. } => "Alias",
            Self::Cast { .. } => "Cast",
            Self::Binary { .. } => "Binary",
            Self::Unary { .. } => "Unary",
            Self::If { .. } => "If",
            Self::Coalesce { .. } => "Coalesce",
        }
    }

    fn child_nodes(&self) -> Vec<&dyn common_display::DisplayNode> {
        self.children()
            .into_iter()
            .map(|child| child.as_ref() as &dyn common_display::DisplayNode)
            .collect()
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Literal { value, .. } => Some(format!("{value:?}")),
            Self::Attribute(attr) => Some(attr.to_string()),
            Self::UnresolvedAttribute { name, qualifier } => Some(match qualifier {
                Some(qualifier) => format!("{qualifier}.{name}"),
                None => name.clone(),
            }),
            Self::Alias { name, id, .. } => Some(format!("{name}{id}")),
            Self::Cast { data_type, .. } => Some(data_type.to_string()),
            Self::Binary { op, .. } => Some(op.symbol().to_string()),
            Self::Unary { op, .. } => Some(op.name().to_string()),
            Self::If { .. } | Self::Coalesce { .. } => None,
        }
    }
}

impl TreeNode for Expr {
    fn children(&self) -> Vec<&Arc<Self>> {
        match self {
            Self::Literal { .. } | Self::Attribute(_) | Self::UnresolvedAttribute { .. } => {
                vec![]
            }
            Self::Alias { child, .. } | Self::Cast { child, .. } | Self::Unary { child, .. } => {
                vec![child]
            }
            Self::Binary { left, right, .. } => vec![left, right],
            Self::If {
                condition,
                when_true,
                when_false,
            } => vec![condition, when_true, when_false],
            Self::Coalesce { args } => args.iter().collect(),
        }
    }

    fn with_children(&self, children: Vec<Arc<Self>>) -> Self {
        debug_assert_eq!(children.len(), self.children().len());
        let mut it = children.into_iter();
        match self {
            Self::Literal { .. } | Self::Attribute(_) | Self::UnresolvedAttribute { .. } => {
                self.clone()
            }
            Self::Alias {
                name, id, generated, ..
            } => Self::Alias {
                child: it.next().unwrap(),
                name: name.clone(),
                id: *id,
                generated: *generated,
            },
            Self::Cast { data_type, .. } => Self::Cast {
                child: it.next().unwrap(),
                data_type: *data_type,
            },
            Self::Unary { op, .. } => Self::Unary {
                op: *op,
                child: it.next().unwrap(),
            },
            Self::Binary { op, .. } => Self::Binary {
                left: it.next().unwrap(),
                op: *op,
                right: it.next().unwrap(),
            },
            Self::If { .. } => Self::If {
                condition: it.next().unwrap(),
                when_true: it.next().unwrap(),
                when_false: it.next().unwrap(),
            },
            Self::Coalesce { .. } => Self::Coalesce { args: it.collect() },
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal { value, .. } => write!(f, "{value:?}"),
            Self::Attribute(attr) => write!(f, "{attr}"),
            Self::UnresolvedAttribute { name, qualifier } => {
                if let Some(qualifier) = qualifier {
                    write!(f, "'{qualifier}.{name}")
                } else {
                    write!(f, "'{name}")
                }
            }
            Self::Alias {
                child, name, id, ..
            } => write!(f, "{child} AS {name}{id}"),
            Self::Cast { child, data_type } => write!(f, "CAST({child} AS {data_type})"),
            Self::Binary { left, op, right } => write!(f, "({left} {op} {right})"),
            Self::Unary { op, child } => {
                if op.is_prefix() {
                    write!(f, "{op} {child}")
                } else {
                    write!(f, "{child} {op}")
                }
            }
            Self::If {
                condition,
                when_true,
                when_false,
            } => write!(f, "IF({condition}, {when_true}, {when_false})"),
            Self::Coalesce { args } => {
                let items = args
                    .iter()
                    .map(|arg| arg.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "COALESCE({items})")
            }
        }
    }
}
