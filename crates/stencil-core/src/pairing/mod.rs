//! Paired transformation - a template group and its rewritten counterpart
//!
//! The rewritten side starts as a copy of the template whose snippets get
//! fresh ids; `original_of` links each rewritten snippet to the template
//! snippet it was copied from, for its whole life. Transform operators edit
//! the rewritten side and are only accepted for nodes of a linked pair.
//! Each side keeps its own history.

pub mod mapping;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use stencil_core_types::{NodeId, SnippetId};

use crate::apply::OperatorRequest;
use crate::ast::SourceParser;
use crate::errors::{Result, StencilError};
use crate::history::History;
use crate::model::{Snippet, SnippetGroup};
use crate::operators::{OperatorContext, OperatorId, OperatorKind};
use crate::query::QueryEngine;
use crate::{log_op_end, log_op_error, log_op_start};

pub use mapping::{mapping_rows, MappingRow};

#[derive(Debug, Clone)]
pub struct PairedGroup {
    template: History,
    rewritten: History,
    original_of: BTreeMap<SnippetId, SnippetId>,
}

impl PairedGroup {
    /// Pair the current version of `template` with a fresh rewritten copy
    ///
    /// # Errors
    ///
    /// `DuplicateNode` if the template group is inconsistent.
    pub fn from_template(template: &History) -> Result<Self> {
        let template = template.fork();
        let source = template.current();
        let mut rewritten = SnippetGroup::new(format!("{} (rewrite)", source.name()));
        let mut original_of = BTreeMap::new();
        for snippet in source.snippets() {
            let copy = rewritten.insert_snippet(snippet.reidentified())?;
            original_of.insert(copy.id().clone(), snippet.id().clone());
        }
        let rewritten = History::with_catalog(rewritten, Arc::clone(template.catalog()), Default::default());
        Ok(Self {
            template,
            rewritten,
            original_of,
        })
    }

    pub fn template(&self) -> &History {
        &self.template
    }

    pub fn rewritten(&self) -> &History {
        &self.rewritten
    }

    /// Template snippet a rewritten snippet was created from
    pub fn original_of(&self, rewritten: &SnippetId) -> Option<&SnippetId> {
        self.original_of.get(rewritten)
    }

    /// Current rewritten snippet linked to `template`
    pub fn rewritten_counterpart_of(&self, template: &SnippetId) -> Option<&Arc<Snippet>> {
        self.rewritten
            .current()
            .snippets()
            .iter()
            .find(|s| self.original_of.get(s.id()) == Some(template))
    }

    /// Add code to the template and a linked copy to the rewrite
    ///
    /// # Errors
    ///
    /// `SourceParse` from the parser; neither side changes on error.
    pub fn add_snippet(&mut self, parser: &dyn SourceParser, source: &str) -> Result<(Arc<Snippet>, Arc<Snippet>)> {
        let mut template_group = (**self.template.current()).clone();
        let template = template_group.add_snippet(parser, source)?;
        let mut rewritten_group = (**self.rewritten.current()).clone();
        let rewritten = rewritten_group.insert_snippet(template.reidentified())?;

        self.template
            .commit_group(template_group, format!("add snippet {}", template.root_node()))?;
        self.rewritten
            .commit_group(rewritten_group, format!("add snippet {}", rewritten.root_node()))?;
        self.original_of
            .insert(rewritten.id().clone(), template.id().clone());
        Ok((template, rewritten))
    }

    /// Add code that only exists on the rewritten side
    ///
    /// The snippet is unpaired: transform operators reject its nodes.
    ///
    /// # Errors
    ///
    /// `SourceParse` from the parser.
    pub fn add_rewritten_snippet(&mut self, parser: &dyn SourceParser, source: &str) -> Result<Arc<Snippet>> {
        self.rewritten.add_snippet(parser, source)
    }

    /// Apply a template-side operator
    ///
    /// # Errors
    ///
    /// Any error of [`History::apply_request`].
    pub fn apply_template(&mut self, request: &OperatorRequest) -> Result<&Arc<SnippetGroup>> {
        crate::log_op_scope!(
            "pairing.apply_template",
            { operator = request.operator.as_str() },
            self.template.apply_request(request).map(|_| ())
        )?;
        Ok(self.template.current())
    }

    /// Remove the template snippet claiming `node`
    ///
    /// # Errors
    ///
    /// `PairingViolation` while the snippet has a rewritten counterpart.
    pub fn remove_template_snippet(&mut self, node: NodeId) -> Result<Option<Arc<Snippet>>> {
        let owner = self.template.current().snippet_for(Some(node)).cloned();
        if let Some(owner) = owner {
            if let Some(counterpart) = self.rewritten_counterpart_of(owner.id()) {
                return Err(StencilError::pairing(format!(
                    "template snippet {} still has rewritten counterpart {}",
                    owner.id(),
                    counterpart.id()
                )));
            }
        }
        self.template.remove_snippet(node)
    }

    /// Remove the rewritten snippet claiming `node`
    ///
    /// # Errors
    ///
    /// Infallible today; the `Result` matches the other edits.
    pub fn remove_rewritten_snippet(&mut self, node: NodeId) -> Result<Option<Arc<Snippet>>> {
        self.rewritten.remove_snippet(node)
    }

    /// Apply a transform operator to `rewritten_node` against `template_node`
    ///
    /// # Errors
    ///
    /// - `UnknownOperator` / `OperatorPrecondition` for non-transform operators
    /// - `NodeNotInGroup` if either node is not bound on its side
    /// - `PairingViolation` if the two snippets are not a linked pair
    /// - the operator's own precondition violations
    pub fn apply_transform(
        &mut self,
        operator: OperatorId,
        template_node: NodeId,
        rewritten_node: NodeId,
        operands: Vec<String>,
    ) -> Result<&Arc<SnippetGroup>> {
        let op = "pairing.apply_transform";
        let started = Instant::now();
        log_op_start!(op, operator = operator.as_str(), node_id = %rewritten_node);

        match self.transform(operator, template_node, rewritten_node, operands) {
            Ok(group) => {
                let label = format!("{} {}", operator, rewritten_node);
                self.rewritten.commit_group(group, label)?;
                log_op_end!(op, duration_ms = started.elapsed().as_millis() as u64);
                Ok(self.rewritten.current())
            }
            Err(err) => {
                log_op_error!(
                    op,
                    err.clone(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    operator = operator.as_str()
                );
                Err(err)
            }
        }
    }

    fn transform(
        &self,
        operator: OperatorId,
        template_node: NodeId,
        rewritten_node: NodeId,
        operands: Vec<String>,
    ) -> Result<SnippetGroup> {
        let spec = self.rewritten.catalog().get(operator)?;
        if !spec.is_transform() {
            return Err(StencilError::precondition(
                operator.as_str(),
                Some(rewritten_node),
                "not a transform operator",
            ));
        }

        let template_group = self.template.current();
        let rewritten_group = self.rewritten.current();
        let template = template_group.require_snippet_for(template_node)?;
        let rewritten = rewritten_group.require_snippet_for(rewritten_node)?;
        match self.original_of.get(rewritten.id()) {
            Some(original) if original == template.id() => {}
            Some(original) => {
                return Err(StencilError::pairing(format!(
                    "rewritten snippet {} belongs to template snippet {}, not {}",
                    rewritten.id(),
                    original,
                    template.id()
                )));
            }
            None => {
                return Err(StencilError::pairing(format!(
                    "rewritten snippet {} has no template counterpart",
                    rewritten.id()
                )));
            }
        }

        let kind = OperatorKind::Transform {
            template: Arc::clone(template),
            template_node,
            operands,
        };
        let next = spec.apply_to(
            rewritten,
            rewritten_node,
            &OperatorContext {
                group: &**rewritten_group,
                kind: &kind,
            },
        )?;
        let mut group = (**rewritten_group).clone();
        group.replace_snippet(next)?;
        Ok(group)
    }

    /// Move the template side back one version
    ///
    /// # Errors
    ///
    /// - `NothingToUndo` at the first template entry
    /// - `PairingViolation` if that version lacks a linked template snippet;
    ///   undo the rewritten side first
    pub fn undo_template(&mut self) -> Result<&Arc<SnippetGroup>> {
        let target = self.template.peek_undo().ok_or(StencilError::NothingToUndo)?;
        self.ensure_linked(target, self.rewritten.current())?;
        self.template.undo()
    }

    /// # Errors
    ///
    /// `NothingToRedo` at the last template entry, `PairingViolation` as for
    /// [`Self::undo_template`].
    pub fn redo_template(&mut self) -> Result<&Arc<SnippetGroup>> {
        let target = self.template.peek_redo().ok_or(StencilError::NothingToRedo)?;
        self.ensure_linked(target, self.rewritten.current())?;
        self.template.redo()
    }

    /// Move the rewritten side back one version
    ///
    /// # Errors
    ///
    /// - `NothingToUndo` at the first rewritten entry
    /// - `PairingViolation` if that version brings back a snippet whose
    ///   template snippet is gone; undo the template side first
    pub fn undo_rewritten(&mut self) -> Result<&Arc<SnippetGroup>> {
        let target = self.rewritten.peek_undo().ok_or(StencilError::NothingToUndo)?;
        self.ensure_linked(self.template.current(), target)?;
        self.rewritten.undo()
    }

    /// # Errors
    ///
    /// `NothingToRedo` at the last rewritten entry, `PairingViolation` as for
    /// [`Self::undo_rewritten`].
    pub fn redo_rewritten(&mut self) -> Result<&Arc<SnippetGroup>> {
        let target = self.rewritten.peek_redo().ok_or(StencilError::NothingToRedo)?;
        self.ensure_linked(self.template.current(), target)?;
        self.rewritten.redo()
    }

    /// Every linked snippet of `rewritten` has its template snippet in `template`
    fn ensure_linked(&self, template: &SnippetGroup, rewritten: &SnippetGroup) -> Result<()> {
        for snippet in rewritten.snippets() {
            if let Some(original) = self.original_of.get(snippet.id()) {
                if template.snippet(original).is_none() {
                    return Err(StencilError::pairing(format!(
                        "rewritten snippet {} would outlive template snippet {}",
                        snippet.id(),
                        original
                    )));
                }
            }
        }
        Ok(())
    }

    /// Verify the pairing invariant on the current versions
    ///
    /// Every linked rewritten snippet points at a snippet of the current
    /// template group, and no template snippet is linked twice.
    ///
    /// # Errors
    ///
    /// `PairingViolation` naming the offending snippet.
    pub fn check_pairing(&self) -> Result<()> {
        self.ensure_linked(self.template.current(), self.rewritten.current())?;
        let mut linked = BTreeSet::new();
        for snippet in self.rewritten.current().snippets() {
            if let Some(original) = self.original_of.get(snippet.id()) {
                if !linked.insert(original) {
                    return Err(StencilError::pairing(format!(
                        "template snippet {} is linked to more than one rewritten snippet",
                        original
                    )));
                }
            }
        }
        Ok(())
    }

    /// Differences between each linked pair, in rewritten-side order
    pub fn render_mapping(&self) -> Vec<MappingRow> {
        let template_group = self.template.current();
        self.rewritten
            .current()
            .snippets()
            .iter()
            .filter_map(|rewritten| {
                let original = self.original_of.get(rewritten.id())?;
                let template = template_group.snippet(original)?;
                Some(mapping_rows(template, rewritten))
            })
            .flatten()
            .collect()
    }

    /// Template query followed by one rewrite clause per mapping row
    pub fn render_rewrite(&self, engine: &dyn QueryEngine) -> String {
        let mut out = engine.render_query(self.template.current());
        for row in self.render_mapping() {
            writeln!(out).ok();
            write!(
                out,
                "(rewrite {:?} :from {:?} :to {:?})",
                row.field, row.before, row.after
            )
            .ok();
        }
        out
    }
}
