//! Scalar type system for Opal.

mod data_type;
mod value;

pub use data_type::DataType;
pub use value::Value;
