//! Unary operators for expressions.

use opal_core::DataType;
use serde::{Deserialize, Serialize};

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical NOT.
    Not,
    /// Arithmetic negation.
    Neg,
    /// IS NULL check.
    IsNull,
    /// IS NOT NULL check.
    IsNotNull,
}

impl UnaryOp {
    /// Get the operator name for display.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Not => "NOT",
            Self::Neg => "-",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// Whether this operator prints before its operand.
    pub const fn is_prefix(&self) -> bool {
        matches!(self, Self::Not | Self::Neg)
    }

    /// Result type of applying this operator to an operand of the given type,
    /// or `None` when the operand type is not acceptable.
    pub fn result_type(&self, input: &DataType) -> Option<DataType> {
        match self {
            Self::Not => input
                .can_coerce_to(&DataType::Bool)
                .then_some(DataType::Bool),
            Self::Neg => input.is_numeric().then_some(*input),
            Self::IsNull | Self::IsNotNull => Some(DataType::Bool),
        }
    }
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
