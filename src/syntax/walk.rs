//! Pre-order traversal over a parsed document.

use crate::syntax::{Fragment, Node};
use crate::HtmlxError;

/// What the walker should do after entering a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Visit the node's children next.
    Continue,
    /// Leave the node's children alone and move on to its next sibling.
    Skip,
}

pub trait Visitor {
    /// Called once per node, parent before children.
    fn enter(&mut self, node: &Node) -> Result<Walk, HtmlxError>;
}

/// Visits every node under `fragment` depth-first in source order.
pub fn walk_fragment<V: Visitor + ?Sized>(fragment: &Fragment, visitor: &mut V) -> Result<(), HtmlxError> {
    for node in &fragment.nodes {
        walk_node(node, visitor)?;
    }
    Ok(())
}

pub fn walk_node<V: Visitor + ?Sized>(node: &Node, visitor: &mut V) -> Result<(), HtmlxError> {
    if visitor.enter(node)? == Walk::Skip {
        return Ok(());
    }
    for fragment in node.child_fragments() {
        walk_fragment(fragment, visitor)?;
    }
    Ok(())
}
