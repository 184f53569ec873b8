//! Operators - named, parameterized transformations of snippets
//!
//! An operator is a pure function from a snippet, a target node and an
//! argument payload to a new snippet. The payload shape depends on the
//! operator (see [`OperatorKind`]). Operators never touch their input; the
//! apply boundary swaps the derived snippet into a copy of the group.

pub mod catalog;
pub mod conditions;
pub mod directives;
pub mod generalize;
pub mod rename;
pub mod structure;
pub mod transform;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stencil_core_types::NodeId;

use crate::errors::{Result, StencilError};
use crate::model::{LogicVar, Snippet, SnippetGroup};

pub use catalog::{Catalog, Menu};

/// Identifier of a standard operator; also its directive name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperatorId {
    ReplaceByVariable,
    ReplaceByWildcard,
    EqualsVariable,
    MatchSubtype,
    RelaxSize,
    RestoreExact,
    GroundExact,
    GroundDeep,
    RemoveNode,
    AddLogicCondition,
    RemoveLogicCondition,
    RenameVariable,
    RewriteWithTemplateNode,
    RewriteRemoveNode,
    RewriteWithText,
}

impl OperatorId {
    pub const ALL: [OperatorId; 15] = [
        OperatorId::ReplaceByVariable,
        OperatorId::ReplaceByWildcard,
        OperatorId::EqualsVariable,
        OperatorId::MatchSubtype,
        OperatorId::RelaxSize,
        OperatorId::RestoreExact,
        OperatorId::GroundExact,
        OperatorId::GroundDeep,
        OperatorId::RemoveNode,
        OperatorId::AddLogicCondition,
        OperatorId::RemoveLogicCondition,
        OperatorId::RenameVariable,
        OperatorId::RewriteWithTemplateNode,
        OperatorId::RewriteRemoveNode,
        OperatorId::RewriteWithText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorId::ReplaceByVariable => "replace-by-variable",
            OperatorId::ReplaceByWildcard => "replace-by-wildcard",
            OperatorId::EqualsVariable => "equals-variable",
            OperatorId::MatchSubtype => "match-subtype",
            OperatorId::RelaxSize => "relax-size",
            OperatorId::RestoreExact => "restore-exact",
            OperatorId::GroundExact => "ground-exact",
            OperatorId::GroundDeep => "ground-deep",
            OperatorId::RemoveNode => "remove-node",
            OperatorId::AddLogicCondition => "add-logic-condition",
            OperatorId::RemoveLogicCondition => "remove-logic-condition",
            OperatorId::RenameVariable => "rename-variable",
            OperatorId::RewriteWithTemplateNode => "rewrite-with-template-node",
            OperatorId::RewriteRemoveNode => "rewrite-remove-node",
            OperatorId::RewriteWithText => "rewrite-with-text",
        }
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorId {
    type Err = StencilError;

    fn from_str(s: &str) -> Result<Self> {
        OperatorId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| StencilError::UnknownOperator {
                operator: s.to_string(),
            })
    }
}

/// Menu grouping of operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    Generalization,
    Restriction,
    Structure,
    Conditions,
    Variables,
    Rewrite,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How an operator's arguments are assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorShape {
    /// A flat operand list
    Generic,
    /// Needs the original snippet and an optional variable name
    Generalize,
    /// Needs the renamed node and the new name
    Rename,
    /// Edits a rewritten snippet against its template counterpart
    Transform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A logic variable, `?name`
    Variable,
    /// A logic variable already introduced by a `Variable` constraint in the group
    BoundVariable,
    /// Free text
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub optional: bool,
}

/// Argument payload of one application
#[derive(Debug, Clone)]
pub enum OperatorKind {
    Generic(Vec<String>),
    Generalize {
        original: Arc<Snippet>,
        variable: Option<String>,
    },
    Rename {
        node: NodeId,
        new_name: String,
    },
    Transform {
        template: Arc<Snippet>,
        template_node: NodeId,
        operands: Vec<String>,
    },
}

impl OperatorKind {
    /// The flat operand list, empty for shapes that do not carry one
    pub fn operands(&self) -> &[String] {
        match self {
            OperatorKind::Generic(operands) | OperatorKind::Transform { operands, .. } => operands,
            _ => &[],
        }
    }
}

/// What an application addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Group scope, no node
    Group,
    Node(NodeId),
    Nodes(Vec<NodeId>),
}

impl Target {
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            Target::Group => &[],
            Target::Node(node) => std::slice::from_ref(node),
            Target::Nodes(nodes) => nodes,
        }
    }
}

/// Everything an operator may read besides its snippet and node
pub struct OperatorContext<'a> {
    pub group: &'a SnippetGroup,
    pub kind: &'a OperatorKind,
}

pub type ApplicableFn = fn(&Snippet, NodeId) -> bool;
pub type ApplyFn = fn(&Snippet, NodeId, &OperatorContext<'_>) -> Result<Snippet>;

/// Catalog entry describing one operator
pub struct OperatorSpec {
    pub id: OperatorId,
    pub name: &'static str,
    pub description: &'static str,
    pub categories: &'static [Category],
    pub shape: OperatorShape,
    pub params: &'static [ParamSpec],
    /// Accepts `Target::Group`
    pub group_scope: bool,
    /// Structural removal, routed through the batch form for several nodes
    pub batch: bool,
    /// Arguments can be derived automatically, so search may try it
    pub search_move: bool,
    applicable: ApplicableFn,
    apply: ApplyFn,
}

impl fmt::Debug for OperatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorSpec")
            .field("id", &self.id)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl OperatorSpec {
    pub fn is_transform(&self) -> bool {
        self.shape == OperatorShape::Transform
    }

    /// True if the operator may be applied to `node` of `snippet`
    pub fn is_applicable(&self, snippet: &Snippet, node: NodeId) -> bool {
        snippet.is_bound(node) && (self.applicable)(snippet, node)
    }

    /// Derive a new snippet
    ///
    /// # Errors
    ///
    /// `OperatorPrecondition` when the node is rejected by the applicability
    /// predicate or an argument is missing or malformed.
    pub fn apply_to(&self, snippet: &Snippet, node: NodeId, ctx: &OperatorContext<'_>) -> Result<Snippet> {
        if !self.is_applicable(snippet, node) {
            let what = snippet
                .ast()
                .node(node)
                .map_or_else(|| node.to_string(), |n| n.describe());
            return Err(StencilError::precondition(
                self.id.as_str(),
                Some(node),
                format!("not applicable to {}", what),
            ));
        }
        let next = (self.apply)(snippet, node, ctx)?;
        tracing::debug!(operator = self.id.as_str(), node = %node, "operator applied");
        Ok(next)
    }
}

// ---- argument helpers shared by the operator modules ----

pub(crate) fn operand<'a>(id: OperatorId, node: Option<NodeId>, operands: &'a [String], name: &str) -> Result<&'a str> {
    match operands {
        [single] if !single.trim().is_empty() => Ok(single.trim()),
        [] => Err(StencilError::precondition(
            id.as_str(),
            node,
            format!("missing argument '{}'", name),
        )),
        _ => Err(StencilError::precondition(
            id.as_str(),
            node,
            format!("expected exactly one argument '{}'", name),
        )),
    }
}

pub(crate) fn variable_operand(id: OperatorId, node: Option<NodeId>, text: &str) -> Result<LogicVar> {
    LogicVar::parse(text).ok_or_else(|| {
        StencilError::precondition(
            id.as_str(),
            node,
            format!("'{}' is not a logic variable (expected ?name)", text),
        )
    })
}
