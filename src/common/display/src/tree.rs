//! Tree display utilities for query plans.

use std::fmt;

/// A node in a display tree.
pub trait DisplayNode {
    /// Get the display name of this node.
    fn node_name(&self) -> &str;

    /// Get child nodes.
    fn child_nodes(&self) -> Vec<&dyn DisplayNode>;

    /// Get additional details to display.
    fn details(&self) -> Option<String> {
        None
    }
}

/// Helper for displaying tree structures.
pub struct DisplayTree<'a> {
    root: &'a dyn DisplayNode,
}

impl<'a> DisplayTree<'a> {
    /// Create a new display tree.
    pub fn new(root: &'a dyn DisplayNode) -> Self {
        Self { root }
    }

    fn fmt_head(f: &mut fmt::Formatter<'_>, node: &dyn DisplayNode) -> fmt::Result {
        write!(f, "{}", node.node_name())?;
        if let Some(details) = node.details() {
            write!(f, " ({details})")?;
        }
        writeln!(f)
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        node: &dyn DisplayNode,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let connector = if is_last { "└─ " } else { "├─ " };

        write!(f, "{prefix}{connector}")?;
        Self::fmt_head(f, node)?;

        let children = node.child_nodes();
        let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });

        for (i, child) in children.iter().enumerate() {
            let is_last_child = i == children.len() - 1;
            self.fmt_node(f, *child, &child_prefix, is_last_child)?;
        }

        Ok(())
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::fmt_head(f, self.root)?;

        let children = self.root.child_nodes();
        for (i, child) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;
            self.fmt_node(f, *child, "", is_last)?;
        }

        Ok(())
    }
}
