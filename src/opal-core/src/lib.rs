//! Core data model for the Opal analytical engine.
//!
//! This crate provides the fundamental types shared by the planning layers:
//! - `Value` and `DataType` for the scalar type system
//! - `ExpressionId` and `IdGenerator` for stable attribute identities
//! - The generic `TreeNode` algebra both expressions and plans instantiate

pub mod ids;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use ids::{ExpressionId, IdGenerator};
pub use tree::TreeNode;
pub use types::{DataType, Value};
