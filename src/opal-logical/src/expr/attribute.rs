//! Resolved attribute references.

use opal_core::{DataType, ExpressionId};
use serde::{Deserialize, Serialize};

use super::Expr;

/// A resolved reference to an attribute produced somewhere below in the plan.
///
/// The `id` is what identifies the attribute; `name` and `qualifier` are
/// cosmetic and may be cleared or rewritten (subquery elimination does) while
/// the id stays put. `generated` marks attributes synthesized by the analyzer
/// rather than written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeRef {
    /// Stable identity, assigned at resolution time.
    pub id: ExpressionId,
    /// Attribute name as written or synthesized.
    pub name: String,
    /// Data type of the attribute.
    pub data_type: DataType,
    /// Whether the attribute may be null.
    pub nullable: bool,
    /// Optional relation qualifier (`t1.a`).
    pub qualifier: Option<String>,
    /// Whether the analyzer synthesized this attribute.
    pub generated: bool,
}

impl AttributeRef {
    /// Create a new attribute reference.
    pub fn new(
        id: ExpressionId,
        name: impl Into<String>,
        data_type: DataType,
        nullable: bool,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
            nullable,
            qualifier: None,
            generated: false,
        }
    }

    /// Attach a relation qualifier.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Strip the relation qualifier, keeping the id.
    #[must_use]
    pub fn without_qualifier(mut self) -> Self {
        self.qualifier = None;
        self
    }

    /// Mark the attribute nullable.
    #[must_use]
    pub fn as_nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark the attribute as analyzer-synthesized.
    #[must_use]
    pub fn as_generated(mut self) -> Self {
        self.generated = true;
        self
    }

    /// Wrap into an expression.
    pub fn to_expr(&self) -> Expr {
        Expr::Attribute(self.clone())
    }
}

impl std::fmt::Display for AttributeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{qualifier}.")?;
        }
        write!(f, "{}{}", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let attr = AttributeRef::new(ExpressionId::new(3), "a", DataType::Int64, false);
        assert_eq!(attr.to_string(), "a#3");

        let qualified = attr.with_qualifier("t1");
        assert_eq!(qualified.to_string(), "t1.a#3");
    }

    #[test]
    fn test_qualifier_roundtrip() {
        let attr = AttributeRef::new(ExpressionId::new(0), "x", DataType::Bool, true)
            .with_qualifier("s")
            .without_qualifier();
        assert_eq!(attr.qualifier, None);
        assert_eq!(attr.id, ExpressionId::new(0));
    }

    #[test]
    fn test_markers() {
        let attr = AttributeRef::new(ExpressionId::new(1), "x", DataType::Int64, false)
            .as_nullable()
            .as_generated();
        assert!(attr.nullable);
        assert!(attr.generated);
    }
}
