//! Structural removal, single and batched

use std::collections::BTreeSet;

use stencil_core_types::NodeId;

use super::{OperatorContext, OperatorId};
use crate::errors::{Result, StencilError};
use crate::model::Snippet;

/// `remove-node`: drop the node and its subtree from the pattern
pub(crate) fn remove_node(snippet: &Snippet, node: NodeId, _: &OperatorContext<'_>) -> Result<Snippet> {
    let mut next = snippet.clone();
    next.unbind_subtree(node);
    Ok(next)
}

/// Batch form of `remove-node`
///
/// Targets are treated as a set, so the result does not depend on their
/// order. A target already covered by another target's subtree is accepted
/// even when a previous edit unbound it.
///
/// # Errors
///
/// `OperatorPrecondition` for the root, or for a node that is neither bound
/// nor below another target.
pub fn remove_nodes(snippet: &Snippet, nodes: &[NodeId]) -> Result<Snippet> {
    let id = OperatorId::RemoveNode;
    let targets: BTreeSet<NodeId> = nodes.iter().copied().collect();
    let ast = snippet.ast();

    for &node in &targets {
        if node == snippet.root_node() {
            return Err(StencilError::precondition(
                id.as_str(),
                Some(node),
                "the snippet root cannot be removed",
            ));
        }
        let covered = targets
            .iter()
            .any(|&other| other != node && ast.is_ancestor(other, node));
        if !snippet.is_bound(node) && !covered {
            return Err(StencilError::precondition(
                id.as_str(),
                Some(node),
                "node is not part of the snippet",
            ));
        }
    }

    let mut next = snippet.clone();
    for &node in &targets {
        next.unbind_subtree(node);
    }
    Ok(next)
}
