//! Core error types for Opal.

use thiserror::Error;

/// Result type alias using `OpalError`.
pub type OpalResult<T> = std::result::Result<T, OpalError>;

/// Core error type for Opal operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpalError {
    /// Type mismatch or invalid type operation.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Schema-related error (column not found, ambiguous reference, etc.).
    #[error("SchemaError: {0}")]
    SchemaError(String),

    /// A plan handed to the optimizer still contains unresolved references.
    #[error("UnresolvedPlan: {0}")]
    UnresolvedPlan(String),

    /// An optimizer rule produced a malformed plan. The result must not be used.
    #[error("InvariantViolation: {0}")]
    InvariantViolation(String),

    /// The caller's abort predicate fired mid-optimization.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Feature not yet implemented.
    #[error("NotImplemented: {0}")]
    NotImplemented(String),

    /// Internal error (bug in Opal).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// IO error.
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl OpalError {
    /// Create a new `TypeError`.
    pub fn type_error<S: Into<String>>(msg: S) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a new `SchemaError`.
    pub fn schema_error<S: Into<String>>(msg: S) -> Self {
        Self::SchemaError(msg.into())
    }

    /// Create a new `UnresolvedPlan` error.
    pub fn unresolved<S: Into<String>>(msg: S) -> Self {
        Self::UnresolvedPlan(msg.into())
    }

    /// Create a new `InvariantViolation`.
    pub fn invariant<S: Into<String>>(msg: S) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create a cancellation error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Create a new `NotImplemented` error.
    pub fn not_implemented<S: Into<String>>(msg: S) -> Self {
        Self::NotImplemented(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }
}

/// Ensure a condition holds, returning the given error variant if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::OpalError::$variant(format!($($msg)*)));
        }
    };
}
