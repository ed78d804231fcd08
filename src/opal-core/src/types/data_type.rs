//! Data type definitions for Opal schemas.

use serde::{Deserialize, Serialize};

/// Data type of an attribute or expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Null type (unknown or absent).
    Null,
    /// Boolean type.
    Bool,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
}

impl DataType {
    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }

    /// Get the display name for this type.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool => "Bool",
            Self::Int64 => "Int64",
            Self::Float64 => "Float64",
            Self::String => "String",
        }
    }

    /// Check if this type can be implicitly coerced to another type.
    pub fn can_coerce_to(&self, target: &Self) -> bool {
        if self == target {
            return true;
        }

        matches!(
            (self, target),
            (Self::Null, _) | (Self::Int64, Self::Float64)
        )
    }

    /// Check if an explicit `CAST` from this type to `target` is valid.
    pub fn can_cast_to(&self, target: &Self) -> bool {
        if self == target || matches!(self, Self::Null) {
            return true;
        }

        matches!(
            (self, target),
            (Self::Int64, Self::Float64)
                | (Self::Float64, Self::Int64)
                | (Self::Bool | Self::Int64 | Self::Float64, Self::String)
                | (Self::String, Self::Int64 | Self::Float64)
        )
    }

    /// Whether casting a value of this type to `target` and back recovers
    /// the original value exactly. Integer and float renderings are
    /// canonical, so they survive a trip through `String`; a parsed string
    /// does not (`"007"` re-renders as `"7"`), and `Int64` through
    /// `Float64` loses precision beyond 2^53.
    pub fn cast_round_trips(&self, target: &Self) -> bool {
        if self == target || matches!(self, Self::Null) {
            return true;
        }

        matches!((self, target), (Self::Int64 | Self::Float64, Self::String))
    }

    /// Get the common supertype of two types (for type inference).
    pub fn common_supertype(&self, other: &Self) -> Option<Self> {
        if self == other {
            return Some(*self);
        }

        match (self, other) {
            (Self::Null, t) | (t, Self::Null) => Some(*t),
            (Self::Int64, Self::Float64) | (Self::Float64, Self::Int64) => Some(Self::Float64),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
