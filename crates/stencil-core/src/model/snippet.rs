use std::collections::BTreeMap;
use std::sync::Arc;

use stencil_core_types::{NodeId, SnippetId};

use super::binding::{Binding, Constraint, Grounding, LogicCondition, LogicVar};
use crate::ast::{Ast, AstNode};

/// Snippet - a template unit anchored to one AST root
///
/// The syntax tree is shared and never mutated. Which of its nodes still take
/// part in the pattern, and how each is matched, lives in the snippet's own
/// binding table: a node without a binding has been removed from the pattern
/// (directly, or because an ancestor now matches its whole subtree).
///
/// Snippets are values. Operators derive new snippets; the id is carried
/// over so every version of a snippet can be recognised as the same unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    id: SnippetId,
    ast: Arc<Ast>,
    source: Arc<str>,
    bindings: BTreeMap<NodeId, Binding>,
    conditions: Vec<LogicCondition>,
}

impl Snippet {
    /// Wrap a parsed tree, binding every node for an exact match
    pub fn new(ast: Arc<Ast>, source: impl Into<Arc<str>>) -> Self {
        let bindings = ast
            .preorder()
            .iter()
            .map(|&node| (node, Binding::exact(node)))
            .collect();
        Self {
            id: SnippetId::new(),
            ast,
            source: source.into(),
            bindings,
            conditions: Vec::new(),
        }
    }

    /// Same pattern under a fresh id
    pub fn reidentified(&self) -> Self {
        Self {
            id: SnippetId::new(),
            ..self.clone()
        }
    }

    pub fn id(&self) -> &SnippetId {
        &self.id
    }

    pub fn ast(&self) -> &Arc<Ast> {
        &self.ast
    }

    /// The plain (unannotated) text the tree was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root_node(&self) -> NodeId {
        self.ast.root()
    }

    /// Binding of `node`, absent when the node is not part of this snippet
    pub fn binding_for(&self, node: NodeId) -> Option<&Binding> {
        self.bindings.get(&node)
    }

    pub fn logic_conditions(&self) -> &[LogicCondition] {
        &self.conditions
    }

    pub fn is_bound(&self, node: NodeId) -> bool {
        self.bindings.contains_key(&node)
    }

    /// Bound nodes in document order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ast
            .preorder()
            .iter()
            .copied()
            .filter(|node| self.bindings.contains_key(node))
    }

    pub fn bindings(&self) -> &BTreeMap<NodeId, Binding> {
        &self.bindings
    }

    /// AST node data for a bound node
    pub fn node(&self, node: NodeId) -> Option<&AstNode> {
        if self.is_bound(node) {
            self.ast.node(node)
        } else {
            None
        }
    }

    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        if !self.is_bound(node) {
            return Vec::new();
        }
        self.ast
            .children(node)
            .iter()
            .copied()
            .filter(|c| self.is_bound(*c))
            .collect()
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        if !self.is_bound(node) {
            return None;
        }
        self.ast.parent(node)
    }

    /// Bound strict descendants of `node`, in document order
    pub fn descendants_of(&self, node: NodeId) -> Vec<NodeId> {
        self.ast
            .descendants(node)
            .into_iter()
            .filter(|d| self.is_bound(*d))
            .collect()
    }

    /// True if every AST child of `node` is still bound
    pub fn has_all_children(&self, node: NodeId) -> bool {
        self.ast.children(node).iter().all(|c| self.is_bound(*c))
    }

    /// Byte span of a bound node in [`Self::source`]
    pub fn span(&self, node: NodeId) -> Option<(usize, usize)> {
        self.node(node).map(|n| (n.start, n.end))
    }

    /// Variables introduced by `Variable` constraints, in document order
    pub fn variables(&self) -> Vec<&LogicVar> {
        self.nodes()
            .filter_map(|n| match &self.bindings[&n].constraint {
                Constraint::Variable(var) => Some(var),
                _ => None,
            })
            .collect()
    }

    /// Node whose binding introduces `var`
    pub fn node_binding_variable(&self, var: &LogicVar) -> Option<NodeId> {
        self.nodes().find(|n| {
            matches!(&self.bindings[n].constraint, Constraint::Variable(v) if v == var)
        })
    }

    pub fn grounding(&self) -> Grounding {
        self.bindings
            .get(&self.root_node())
            .map_or(Grounding::Deep, |b| b.grounding)
    }

    // ---- derivation helpers, used by operators on their private copy ----

    pub(crate) fn set_constraint(&mut self, node: NodeId, constraint: Constraint) {
        if let Some(binding) = self.bindings.get_mut(&node) {
            binding.constraint = constraint;
        }
    }

    pub(crate) fn set_grounding(&mut self, grounding: Grounding) {
        let root = self.root_node();
        if let Some(binding) = self.bindings.get_mut(&root) {
            binding.grounding = grounding;
        }
    }

    /// Drop the bindings of every strict descendant of `node`
    pub(crate) fn unbind_descendants(&mut self, node: NodeId) {
        for descendant in self.ast.descendants(node) {
            self.bindings.remove(&descendant);
        }
    }

    /// Drop the bindings of `node` and its descendants
    pub(crate) fn unbind_subtree(&mut self, node: NodeId) {
        self.unbind_descendants(node);
        self.bindings.remove(&node);
    }

    pub(crate) fn push_condition(&mut self, condition: LogicCondition) {
        self.conditions.push(condition);
    }

    pub(crate) fn remove_condition(&mut self, condition: &LogicCondition) -> bool {
        match self.conditions.iter().position(|c| c == condition) {
            Some(index) => {
                self.conditions.remove(index);
                true
            }
            None => false,
        }
    }

    /// Rename `from` everywhere: binding variables, constraints and conditions
    pub(crate) fn rename_variable(&mut self, from: &LogicVar, to: &LogicVar) {
        for binding in self.bindings.values_mut() {
            if &binding.variable == from {
                binding.variable = to.clone();
            }
            match &mut binding.constraint {
                Constraint::Variable(var) | Constraint::Equals(var) if var == from => {
                    *var = to.clone();
                }
                _ => {}
            }
        }
        for condition in &mut self.conditions {
            *condition = condition.rename_variable(from, to);
        }
    }
}
