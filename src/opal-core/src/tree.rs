//! Generic tree algebra shared by expressions and logical plans.
//!
//! Both node families are enums whose children are `Arc`-held values of the
//! same family. The traversal operators below are written once against the
//! `TreeNode` trait and never know which family they walk.
//!
//! Rewrites are persistent: a transformation allocates only the nodes that
//! actually change, and returns the input `Arc` untouched everywhere else.
//! Callers detect "nothing happened" with `Arc::ptr_eq`, which is also what
//! the optimizer's fixed-point loop leans on.

use std::sync::Arc;

/// A node with an ordered sequence of same-family children.
pub trait TreeNode: Sized + Clone + PartialEq {
    /// The node's children, in order.
    fn children(&self) -> Vec<&Arc<Self>>;

    /// Rebuild this node with its children replaced. `children` must have the
    /// same arity as `children()`; every other attribute is kept intact.
    fn with_children(&self, children: Vec<Arc<Self>>) -> Self;

    /// Whether any node in this subtree satisfies `f`.
    fn any<F>(&self, f: &F) -> bool
    where
        F: Fn(&Self) -> bool,
    {
        f(self) || self.children().iter().any(|child| child.any(f))
    }

    /// Number of nodes in this subtree.
    fn node_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|child| child.node_count())
            .sum::<usize>()
    }
}

/// Pre-order rewrite: apply `f` to the node itself, then recurse into the
/// children of the result. `f` returns `None` where it does not match.
pub fn transform_down<T, F>(node: &Arc<T>, f: &F) -> Arc<T>
where
    T: TreeNode,
    F: Fn(&T) -> Option<T>,
{
    let node = match f(node) {
        Some(rewritten) => Arc::new(rewritten),
        None => Arc::clone(node),
    };
    replace_children(&node, |child| transform_down(child, f))
}

/// Post-order rewrite: recurse into the children first, then apply `f` to the
/// rebuilt node. `f` returns `None` where it does not match.
pub fn transform_up<T, F>(node: &Arc<T>, f: &F) -> Arc<T>
where
    T: TreeNode,
    F: Fn(&T) -> Option<T>,
{
    let node = replace_children(node, |child| transform_up(child, f));
    match f(&node) {
        Some(rewritten) => Arc::new(rewritten),
        None => node,
    }
}

/// Pre-order collection: gather `f`'s matches across the subtree in document
/// order.
pub fn collect<T, B, F>(node: &Arc<T>, f: &F) -> Vec<B>
where
    T: TreeNode,
    F: Fn(&T) -> Option<B>,
{
    let mut out = Vec::new();
    collect_into(node, f, &mut out);
    out
}

fn collect_into<T, B, F>(node: &Arc<T>, f: &F, out: &mut Vec<B>)
where
    T: TreeNode,
    F: Fn(&T) -> Option<B>,
{
    if let Some(found) = f(node) {
        out.push(found);
    }
    for child in node.children() {
        collect_into(child, f, out);
    }
}

/// Rebuild `node` with each child replaced by `f(child)`, reusing the input
/// node when every child comes back pointer-identical.
pub fn replace_children<T, F>(node: &Arc<T>, mut f: F) -> Arc<T>
where
    T: TreeNode,
    F: FnMut(&Arc<T>) -> Arc<T>,
{
    let children = node.children();
    if children.is_empty() {
        return Arc::clone(node);
    }

    let mut changed = false;
    let new_children: Vec<Arc<T>> = children
        .into_iter()
        .map(|child| {
            let new_child = f(child);
            if !Arc::ptr_eq(&new_child, child) {
                changed = true;
            }
            new_child
        })
        .collect();

    if changed {
        Arc::new(node.with_children(new_children))
    } else {
        Arc::clone(node)
    }
}
