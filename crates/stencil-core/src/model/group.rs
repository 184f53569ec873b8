//! SnippetGroup - an ordered, named collection of snippets
//!
//! A group is the unit that is matched, transformed and versioned. It owns the
//! node index mapping every bound node to the snippet that claims it; the
//! index is derived from the snippets and is rebuilt for every snippet that
//! enters or leaves the group.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use stencil_core_types::{NodeId, SnippetId};

use super::binding::{Binding, Constraint, LogicCondition, LogicVar};
use super::snippet::Snippet;
use crate::ast::SourceParser;
use crate::errors::{Result, StencilError};
use crate::operators::Catalog;

/// Text plus the byte range of one node, for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub snippet_id: SnippetId,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetGroup {
    name: String,
    snippets: Vec<Arc<Snippet>>,
    node_index: BTreeMap<NodeId, SnippetId>,
    conditions: Vec<LogicCondition>,
}

impl SnippetGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            snippets: Vec::new(),
            node_index: BTreeMap::new(),
            conditions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snippets in insertion order
    pub fn snippets(&self) -> &[Arc<Snippet>] {
        &self.snippets
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    pub fn snippet(&self, id: &SnippetId) -> Option<&Arc<Snippet>> {
        self.snippets.iter().find(|s| s.id() == id)
    }

    /// Snippet claiming `node`
    ///
    /// `None` for a node no member binds, and for `None` itself, which
    /// callers use to address group scope.
    pub fn snippet_for(&self, node: Option<NodeId>) -> Option<&Arc<Snippet>> {
        let id = self.node_index.get(&node?)?;
        self.snippet(id)
    }

    /// Like [`Self::snippet_for`], failing for nodes outside the group
    ///
    /// # Errors
    ///
    /// `NodeNotInGroup` if no member binds `node`.
    pub fn require_snippet_for(&self, node: NodeId) -> Result<&Arc<Snippet>> {
        self.snippet_for(Some(node))
            .ok_or_else(|| StencilError::NodeNotInGroup {
                node,
                group: self.name.clone(),
            })
    }

    /// Parse `source` and register the result as a new snippet
    ///
    /// # Errors
    ///
    /// `SourceParse` from the parser; the group is unchanged on error.
    pub fn add_snippet(&mut self, parser: &dyn SourceParser, source: &str) -> Result<Arc<Snippet>> {
        let ast = parser.parse(source)?;
        self.insert_snippet(Snippet::new(Arc::new(ast), source))
    }

    /// Build a snippet from annotated text and register it
    ///
    /// Directives in the annotations are applied as operators of the same id
    /// on the node each annotation encloses.
    ///
    /// # Errors
    ///
    /// `DirectiveParse`, `SourceParse`, `UnanchoredDirective`,
    /// `UnknownDirective` or the precondition violation of a directive.
    pub fn add_annotated_snippet(
        &mut self,
        parser: &dyn SourceParser,
        catalog: &Catalog,
        annotated: &str,
    ) -> Result<Arc<Snippet>> {
        let snippet = crate::operators::directives::annotated_snippet(parser, catalog, self, annotated)?;
        self.insert_snippet(snippet)
    }

    /// Register an already built snippet
    ///
    /// # Errors
    ///
    /// `DuplicateNode` if one of its bound nodes is already claimed.
    pub fn insert_snippet(&mut self, snippet: Snippet) -> Result<Arc<Snippet>> {
        for node in snippet.nodes() {
            if let Some(owner) = self.node_index.get(&node) {
                return Err(StencilError::DuplicateNode {
                    node,
                    snippet_id: owner.to_string(),
                });
            }
        }
        let snippet = Arc::new(snippet);
        self.register(&snippet);
        self.snippets.push(Arc::clone(&snippet));
        Ok(snippet)
    }

    /// Swap in a new version of a member snippet, keeping its position
    ///
    /// # Errors
    ///
    /// `SnippetNotFound` if no member has the snippet's id, `DuplicateNode` if
    /// the new version binds a node another member claims.
    pub fn replace_snippet(&mut self, snippet: Snippet) -> Result<Arc<Snippet>> {
        let position = self
            .snippets
            .iter()
            .position(|s| s.id() == snippet.id())
            .ok_or_else(|| StencilError::SnippetNotFound {
                snippet_id: snippet.id().to_string(),
            })?;
        for node in snippet.nodes() {
            match self.node_index.get(&node) {
                Some(owner) if owner != snippet.id() => {
                    return Err(StencilError::DuplicateNode {
                        node,
                        snippet_id: owner.to_string(),
                    });
                }
                _ => {}
            }
        }
        let old = Arc::clone(&self.snippets[position]);
        self.unregister(&old);
        let snippet = Arc::new(snippet);
        self.register(&snippet);
        self.snippets[position] = Arc::clone(&snippet);
        Ok(snippet)
    }

    /// Remove the snippet claiming `node` together with all its bindings
    ///
    /// A node no member claims is not an error: the group is left as is and
    /// `None` returned.
    pub fn remove_snippet(&mut self, node: NodeId) -> Option<Arc<Snippet>> {
        let id = self.node_index.get(&node)?.clone();
        self.remove_snippet_by_id(&id)
    }

    pub fn remove_snippet_by_id(&mut self, id: &SnippetId) -> Option<Arc<Snippet>> {
        let position = self.snippets.iter().position(|s| s.id() == id)?;
        let removed = self.snippets.remove(position);
        self.unregister(&removed);
        Some(removed)
    }

    /// Root nodes of all members, in insertion order
    pub fn roots(&self) -> Vec<NodeId> {
        Self::roots_of(self.snippets.iter().map(Arc::as_ref))
    }

    pub fn roots_of<'a>(snippets: impl IntoIterator<Item = &'a Snippet>) -> Vec<NodeId> {
        snippets.into_iter().map(Snippet::root_node).collect()
    }

    /// Group-scope logic conditions
    pub fn conditions(&self) -> &[LogicCondition] {
        &self.conditions
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

    /// Logic variables introduced by `Variable` constraints of any member
    pub fn variables(&self) -> BTreeSet<&LogicVar> {
        self.snippets
            .iter()
            .flat_map(|s| s.variables())
            .collect()
    }

    /// Number of bound nodes across all members
    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    /// Source text of the snippet claiming `node` with the node's byte range
    pub fn highlight(&self, node: NodeId) -> Option<Highlight> {
        let snippet = self.snippet_for(Some(node))?;
        let (start, end) = snippet.span(node)?;
        Some(Highlight {
            snippet_id: snippet.id().clone(),
            text: snippet.source().to_string(),
            start,
            end,
        })
    }

    /// Verify the structural invariants of the group
    ///
    /// - the node index equals the one derived from the members
    /// - every member binds its root
    /// - every bound non-root node has a bound parent
    /// - nodes under a subtree-covering constraint carry no bindings
    ///
    /// # Errors
    ///
    /// `GroupInvariant` naming the first violation found.
    pub fn check_invariants(&self) -> Result<()> {
        let violation = |reason: String| StencilError::GroupInvariant {
            group: self.name.clone(),
            reason,
        };

        let mut derived = BTreeMap::new();
        for snippet in &self.snippets {
            if !snippet.is_bound(snippet.root_node()) {
                return Err(violation(format!("snippet {} does not bind its root", snippet.id())));
            }
            for node in snippet.nodes() {
                if derived.insert(node, snippet.id().clone()).is_some() {
                    return Err(violation(format!("node {} is claimed twice", node)));
                }
                if node != snippet.root_node() {
                    match snippet.ast().parent(node) {
                        Some(parent) if snippet.is_bound(parent) => {}
                        _ => return Err(violation(format!("node {} has no bound parent", node))),
                    }
                }
                let covers = snippet
                    .binding_for(node)
                    .is_some_and(|b| b.constraint.covers_subtree());
                if covers && !snippet.descendants_of(node).is_empty() {
                    return Err(violation(format!(
                        "node {} matches its whole subtree but has bound descendants",
                        node
                    )));
                }
            }
        }
        if derived != self.node_index {
            return Err(violation("node index diverges from members".to_string()));
        }
        Ok(())
    }

    /// SHA-256 over the canonical form of the group, hex encoded
    ///
    /// Snippet ids and the group name do not take part, so two groups with the
    /// same patterns share a fingerprint.
    ///
    /// # Errors
    ///
    /// `Internal` if the canonical form cannot be serialized.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = CanonicalGroup {
            snippets: self
                .snippets
                .iter()
                .map(|s| CanonicalSnippet {
                    root: s.root_node().raw(),
                    source: s.source(),
                    bindings: s
                        .bindings()
                        .iter()
                        .map(|(node, binding)| (node.raw(), binding))
                        .collect(),
                    conditions: s.logic_conditions(),
                })
                .collect(),
            conditions: &self.conditions,
        };
        let bytes = serde_json::to_vec(&canonical).map_err(|e| StencilError::Internal {
            message: format!("cannot fingerprint group {}: {}", self.name, e),
        })?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    fn register(&mut self, snippet: &Snippet) {
        for node in snippet.nodes() {
            self.node_index.insert(node, snippet.id().clone());
        }
    }

    fn unregister(&mut self, snippet: &Snippet) {
        self.node_index.retain(|_, owner| owner != snippet.id());
    }
}

#[derive(Serialize)]
struct CanonicalGroup<'a> {
    snippets: Vec<CanonicalSnippet<'a>>,
    conditions: &'a [LogicCondition],
}

#[derive(Serialize)]
struct CanonicalSnippet<'a> {
    root: u64,
    source: &'a str,
    bindings: Vec<(u64, &'a Binding)>,
    conditions: &'a [LogicCondition],
}

/// True if any member binds `node` under a `Variable` constraint naming `var`
pub(crate) fn binds_variable(group: &SnippetGroup, var: &LogicVar, except: Option<NodeId>) -> bool {
    group.snippets().iter().any(|s| {
        s.nodes().any(|n| {
            Some(n) != except
                && matches!(&s.bindings()[&n].constraint, Constraint::Variable(v) if v == var)
        })
    })
}
