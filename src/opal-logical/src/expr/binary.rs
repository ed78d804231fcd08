//! Binary operators for expressions.

use opal_core::DataType;
use serde::{Deserialize, Serialize};

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    // Comparison
    /// Equality (=).
    Eq,
    /// Inequality (!=).
    Neq,
    /// Greater than (>).
    Gt,
    /// Greater than or equal (>=).
    Gte,
    /// Less than (<).
    Lt,
    /// Less than or equal (<=).
    Lte,

    // Logical
    /// Logical AND.
    And,
    /// Logical OR.
    Or,

    // Arithmetic
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Modulo.
    Mod,
}

impl BinaryOp {
    /// Get the operator symbol for display.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }

    /// Check if this is a comparison operator.
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Neq | Self::Gt | Self::Gte | Self::Lt | Self::Lte
        )
    }

    /// Check if this is a logical operator.
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Check if this is an arithmetic operator.
    pub const fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod
        )
    }

    /// The comparison with the opposite truth table, if any. `NOT (a < b)`
    /// rewrites to `a >= b` through this.
    pub const fn negated(&self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::Neq),
            Self::Neq => Some(Self::Eq),
            Self::Gt => Some(Self::Lte),
            Self::Gte => Some(Self::Lt),
            Self::Lt => Some(Self::Gte),
            Self::Lte => Some(Self::Gt),
            _ => None,
        }
    }

    /// Result type of applying this operator to operands of the given types,
    /// or `None` when the operand types are not acceptable.
    pub fn result_type(&self, left: &DataType, right: &DataType) -> Option<DataType> {
        if self.is_logical() {
            let bool_sides = left.can_coerce_to(&DataType::Bool) && right.can_coerce_to(&DataType::Bool);
            return bool_sides.then_some(DataType::Bool);
        }

        if self.is_comparison() {
            return left.common_supertype(right).map(|_| DataType::Bool);
        }

        // Arithmetic
        left.common_supertype(right).filter(DataType::is_numeric)
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
