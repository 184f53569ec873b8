//! AST collaborator interface
//!
//! Syntax trees are produced by an external parser and are immutable once
//! built. The engine only relies on node identity ([`NodeId`]), the tree
//! shape, a display kind per node and byte spans into the parsed text.

pub mod token_tree;

use std::collections::BTreeMap;

use serde::Serialize;
pub use stencil_core_types::NodeId;

use crate::errors::{Result, StencilError};

pub use token_tree::TokenTreeParser;

/// Turns plain source text into a syntax tree
///
/// Implementations must hand out node ids that are unique for the lifetime
/// of the process.
pub trait SourceParser: Send + Sync {
    /// # Errors
    ///
    /// `SourceParse` when the text is not valid input for this language.
    fn parse(&self, source: &str) -> Result<Ast>;
}

/// One syntax node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AstNode {
    pub id: NodeId,
    /// Display type name, e.g. `Identifier`
    pub kind: String,
    /// Literal text for leaf nodes
    pub label: Option<String>,
    /// Byte range in the parsed text
    pub start: usize,
    pub end: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl AstNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Human-readable description, e.g. `Identifier 'x'`
    pub fn describe(&self) -> String {
        match &self.label {
            Some(label) => format!("{} '{}'", self.kind, label),
            None => self.kind.clone(),
        }
    }
}

/// An immutable syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    root: NodeId,
    nodes: BTreeMap<NodeId, AstNode>,
    preorder: Vec<NodeId>,
}

impl Ast {
    /// Assemble a tree from its nodes
    ///
    /// # Errors
    ///
    /// `SourceParse` if the root is missing, a child is unknown, or parent
    /// links disagree with child lists.
    pub fn from_nodes(root: NodeId, nodes: Vec<AstNode>) -> Result<Self> {
        let nodes: BTreeMap<NodeId, AstNode> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let malformed = |message: String| StencilError::SourceParse { offset: 0, message };

        if !nodes.contains_key(&root) {
            return Err(malformed(format!("root {} is not a node of the tree", root)));
        }

        let mut preorder = Vec::with_capacity(nodes.len());
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = nodes
                .get(&id)
                .ok_or_else(|| malformed(format!("unknown child {}", id)))?;
            if id != root && node.parent.is_none() {
                return Err(malformed(format!("node {} has no parent link", id)));
            }
            for child in &node.children {
                let child_node = nodes
                    .get(child)
                    .ok_or_else(|| malformed(format!("unknown child {}", child)))?;
                if child_node.parent != Some(id) {
                    return Err(malformed(format!("node {} is not linked to parent {}", child, id)));
                }
            }
            preorder.push(id);
            stack.extend(node.children.iter().rev());
        }

        if preorder.len() != nodes.len() {
            return Err(malformed("tree contains unreachable nodes".to_string()));
        }

        Ok(Self {
            root,
            nodes,
            preorder,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in document (pre-)order
    pub fn preorder(&self) -> &[NodeId] {
        &self.preorder
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Strict descendants of `id`, in pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// True if `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Outermost node spanning exactly `start..end`
    pub fn node_at_span(&self, start: usize, end: usize) -> Option<NodeId> {
        self.preorder.iter().copied().find(|id| {
            self.nodes
                .get(id)
                .is_some_and(|n| n.start == start && n.end == end)
        })
    }
}
