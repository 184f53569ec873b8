//! Functional-boundary apply function
//!
//! `apply()` is the single entry point through which operators change a
//! group. It takes ownership of a group value, routes the request to the
//! operator's shape, and returns either the new group or an error.
//!
//! ## Atomicity Contract
//!
//! - **All-or-nothing**: every target is processed on the owned working
//!   copy; a failure anywhere drops that copy, so the caller's previous
//!   version (typically an `Arc` held by a history) is untouched
//! - **No panics**: malformed requests return typed errors
//! - **Validated**: the result passes [`SnippetGroup::check_invariants`]
//!
//! ## Example
//!
//! ```
//! use stencil_core::{apply::{apply, OperatorRequest}, ast::TokenTreeParser};
//! use stencil_core::model::SnippetGroup;
//! use stencil_core::operators::{Catalog, OperatorId, Target};
//!
//! let mut group = SnippetGroup::new("demo");
//! let snippet = group.add_snippet(&TokenTreeParser, "f(x)").unwrap();
//!
//! let request = OperatorRequest::new(OperatorId::RelaxSize, Target::Node(snippet.root_node()));
//! let next = apply(group.clone(), &request, &Catalog::standard()).unwrap();
//! assert_ne!(next, group);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use stencil_core_types::{NodeId, SnippetId};

use crate::errors::{Result, StencilError};
use crate::model::SnippetGroup;
use crate::operators::{
    conditions, structure, Catalog, OperatorContext, OperatorId, OperatorKind, OperatorShape,
    OperatorSpec, Target,
};

/// One operator application, as handed to the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorRequest {
    pub operator: OperatorId,
    pub target: Target,
    pub operands: Vec<String>,
}

impl OperatorRequest {
    pub fn new(operator: OperatorId, target: Target) -> Self {
        Self {
            operator,
            target,
            operands: Vec::new(),
        }
    }

    pub fn with_operand(mut self, operand: impl Into<String>) -> Self {
        self.operands.push(operand.into());
        self
    }

    /// Short description used as a history label
    pub fn label(&self) -> String {
        let target = match &self.target {
            Target::Group => "group".to_string(),
            Target::Node(node) => node.to_string(),
            Target::Nodes(nodes) => nodes
                .iter()
                .map(NodeId::to_string)
                .collect::<Vec<_>>()
                .join(","),
        };
        if self.operands.is_empty() {
            format!("{} {}", self.operator, target)
        } else {
            format!("{} {} {}", self.operator, target, self.operands.join(" "))
        }
    }
}

/// Apply an operator request to a group, returning the new group
///
/// # Errors
///
/// - `UnknownOperator` if the catalog lacks the operator
/// - `PairingViolation` for transform operators, which only run through a
///   paired transformation
/// - `NodeNotInGroup` for targets no member binds
/// - `OperatorPrecondition` when the operator rejects a node or argument
/// - `GroupInvariant` if the result would break the group invariants
pub fn apply(mut group: SnippetGroup, request: &OperatorRequest, catalog: &Catalog) -> Result<SnippetGroup> {
    let spec = catalog.get(request.operator)?;
    if spec.is_transform() {
        return Err(StencilError::pairing(format!(
            "{} is a transform operator and needs a paired rewrite",
            spec.id
        )));
    }

    match &request.target {
        Target::Group => {
            if !spec.group_scope {
                return Err(StencilError::precondition(
                    spec.id.as_str(),
                    None,
                    "operator needs a target node",
                ));
            }
            conditions::apply_to_group(&mut group, spec.id, &request.operands)?;
        }
        Target::Nodes(nodes) if spec.batch && nodes.len() > 1 => {
            apply_batch(&mut group, spec, nodes)?;
        }
        target => {
            if target.nodes().is_empty() {
                return Err(StencilError::precondition(
                    spec.id.as_str(),
                    None,
                    "no target nodes selected",
                ));
            }
            for &node in target.nodes() {
                apply_one(&mut group, spec, node, &request.operands)?;
            }
        }
    }

    group.check_invariants()?;
    Ok(group)
}

fn apply_one(group: &mut SnippetGroup, spec: &OperatorSpec, node: NodeId, operands: &[String]) -> Result<()> {
    let snippet = Arc::clone(group.require_snippet_for(node)?);
    let kind = match spec.shape {
        OperatorShape::Generalize => OperatorKind::Generalize {
            original: Arc::clone(&snippet),
            variable: operands.first().cloned(),
        },
        OperatorShape::Rename => OperatorKind::Rename {
            node,
            new_name: operands.first().cloned().unwrap_or_default(),
        },
        OperatorShape::Generic | OperatorShape::Transform => OperatorKind::Generic(operands.to_vec()),
    };
    let next = spec.apply_to(&snippet, node, &OperatorContext { group: &*group, kind: &kind })?;
    group.replace_snippet(next)?;
    Ok(())
}

/// Route every target through the batch removal, one call per owning snippet
fn apply_batch(group: &mut SnippetGroup, spec: &OperatorSpec, nodes: &[NodeId]) -> Result<()> {
    let mut by_snippet: BTreeMap<SnippetId, Vec<NodeId>> = BTreeMap::new();
    for &node in nodes {
        let owner = group
            .snippets()
            .iter()
            .find(|s| s.ast().contains(node))
            .ok_or_else(|| StencilError::NodeNotInGroup {
                node,
                group: group.name().to_string(),
            })?;
        by_snippet.entry(owner.id().clone()).or_default().push(node);
    }

    for (id, targets) in by_snippet {
        let snippet = group
            .snippet(&id)
            .cloned()
            .ok_or_else(|| StencilError::SnippetNotFound {
                snippet_id: id.to_string(),
            })?;
        let next = structure::remove_nodes(&snippet, &targets)?;
        group.replace_snippet(next)?;
    }
    tracing::debug!(operator = spec.id.as_str(), targets = nodes.len(), "batch applied");
    Ok(())
}
