//! Runtime value representation.

use serde::{Deserialize, Serialize};

use super::DataType;

/// Runtime scalar value in Opal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
}

impl Value {
    /// Check if this value is null.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as boolean.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub const fn as_int64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64, widening integers.
    pub fn as_float64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            Self::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the type name for error messages.
    pub const fn type_name(&self) -> &'static str {
        self.data_type().display_name()
    }

    /// The data type this value inhabits. `Null` reports `DataType::Null`,
    /// which coerces to every other type.
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Bool(_) => DataType::Bool,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::String(_) => DataType::String,
        }
    }

    /// Cast this value to `target`, returning `None` when the cast is invalid
    /// or the value does not convert (e.g. a non-numeric string to `Int64`).
    pub fn cast_to(&self, target: &DataType) -> Option<Self> {
        if self.data_type() == *target {
            return Some(self.clone());
        }

        match (self, target) {
            (Self::Null, _) => Some(Self::Null),
            (Self::Int64(i), DataType::Float64) => Some(Self::Float64(*i as f64)),
            (Self::Float64(f), DataType::Int64) => Some(Self::Int64(*f as i64)),
            (Self::Bool(b), DataType::String) => Some(Self::String(b.to_string())),
            (Self::Int64(i), DataType::String) => Some(Self::String(i.to_string())),
            (Self::Float64(f), DataType::String) => Some(Self::String(f.to_string())),
            (Self::String(s), DataType::Int64) => s.parse().ok().map(Self::Int64),
            (Self::String(s), DataType::Float64) => s.parse().ok().map(Self::Float64),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
