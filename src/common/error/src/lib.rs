//! Error types and result aliases for Opal.
//!
//! This module provides the core error handling infrastructure shared by
//! every Opal layer, from the logical IR down to the optimizer.

mod error;

pub use error::{OpalError, OpalResult};
