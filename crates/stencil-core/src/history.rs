//! History - linear undo/redo over immutable group versions
//!
//! Every edit commits a new `Arc<SnippetGroup>` after the cursor. Undo and
//! redo only move the cursor. Committing while the cursor is not at the end
//! first discards the entries after it, so a redo branch never survives an
//! edit.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use stencil_core_types::NodeId;

use crate::apply::{apply, OperatorRequest};
use crate::ast::SourceParser;
use crate::config::HistoryConfig;
use crate::errors::{Result, StencilError};
use crate::model::{Snippet, SnippetGroup};
use crate::operators::{Catalog, OperatorId, Target};
use crate::{log_op_end, log_op_error, log_op_start};

/// One committed version
#[derive(Debug, Clone)]
pub struct Revision {
    group: Arc<SnippetGroup>,
    label: String,
    committed_at: DateTime<Utc>,
}

impl Revision {
    fn new(group: Arc<SnippetGroup>, label: impl Into<String>) -> Self {
        Self {
            group,
            label: label.into(),
            committed_at: Utc::now(),
        }
    }

    pub fn group(&self) -> &Arc<SnippetGroup> {
        &self.group
    }

    /// Which edit produced this version
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Revision>,
    cursor: usize,
    max_entries: Option<usize>,
    catalog: Arc<Catalog>,
}

impl History {
    /// Start a history whose first entry is `group`, using the shared catalog
    pub fn new(group: SnippetGroup) -> Self {
        Self::with_catalog(group, Catalog::shared(), HistoryConfig::default())
    }

    pub fn with_config(group: SnippetGroup, config: HistoryConfig) -> Self {
        Self::with_catalog(group, Catalog::shared(), config)
    }

    pub fn with_catalog(group: SnippetGroup, catalog: Arc<Catalog>, config: HistoryConfig) -> Self {
        Self {
            entries: vec![Revision::new(Arc::new(group), "initial")],
            cursor: 0,
            max_entries: config.max_entries,
            catalog,
        }
    }

    /// The version under the cursor
    pub fn current(&self) -> &Arc<SnippetGroup> {
        &self.entries[self.cursor].group
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn revisions(&self) -> &[Revision] {
        &self.entries
    }

    /// Labels of all entries, oldest first
    pub fn entries(&self) -> Vec<&str> {
        self.entries.iter().map(Revision::label).collect()
    }

    /// Apply an operator and commit the result
    ///
    /// # Errors
    ///
    /// Any error of [`crate::apply::apply`]; the history is unchanged.
    pub fn apply(&mut self, operator: OperatorId, target: Target, operands: Vec<String>) -> Result<&Arc<SnippetGroup>> {
        self.apply_request(&OperatorRequest {
            operator,
            target,
            operands,
        })
    }

    /// # Errors
    ///
    /// Any error of [`crate::apply::apply`]; the history is unchanged.
    pub fn apply_request(&mut self, request: &OperatorRequest) -> Result<&Arc<SnippetGroup>> {
        let op = "history.apply";
        let started = Instant::now();
        log_op_start!(op, operator = request.operator.as_str(), history_len = self.len());

        match apply((**self.current()).clone(), request, &self.catalog) {
            Ok(group) => {
                self.commit(group, request.label());
                log_op_end!(
                    op,
                    duration_ms = started.elapsed().as_millis() as u64,
                    operator = request.operator.as_str(),
                    history_len = self.len()
                );
                Ok(self.current())
            }
            Err(err) => {
                log_op_error!(
                    op,
                    err.clone(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    operator = request.operator.as_str()
                );
                Err(err)
            }
        }
    }

    /// Parse `source` into a new snippet and commit
    ///
    /// # Errors
    ///
    /// `SourceParse` or `DuplicateNode`; the history is unchanged.
    pub fn add_snippet(&mut self, parser: &dyn SourceParser, source: &str) -> Result<Arc<Snippet>> {
        crate::log_op_scope!("history.add_snippet", { history_len = self.len() }, {
            let mut group = (**self.current()).clone();
            group.add_snippet(parser, source).map(|snippet| {
                self.commit(group, format!("add snippet {}", snippet.root_node()));
                snippet
            })
        })
    }

    /// Build a snippet from annotated text and commit
    ///
    /// # Errors
    ///
    /// Any error of [`SnippetGroup::add_annotated_snippet`]; the history is
    /// unchanged.
    pub fn add_annotated_snippet(&mut self, parser: &dyn SourceParser, annotated: &str) -> Result<Arc<Snippet>> {
        crate::log_op_scope!("history.add_snippet", { history_len = self.len() }, {
            let mut group = (**self.current()).clone();
            let catalog = Arc::clone(&self.catalog);
            group
                .add_annotated_snippet(parser, &catalog, annotated)
                .map(|snippet| {
                    self.commit(group, format!("add annotated snippet {}", snippet.root_node()));
                    snippet
                })
        })
    }

    /// Remove the snippet claiming `node` and commit
    ///
    /// A node no snippet claims commits nothing and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Infallible today; the `Result` matches the other edits.
    pub fn remove_snippet(&mut self, node: NodeId) -> Result<Option<Arc<Snippet>>> {
        crate::log_op_scope!("history.remove_snippet", { node_id = %node }, {
            let mut group = (**self.current()).clone();
            let removed = group.remove_snippet(node);
            if let Some(snippet) = &removed {
                self.commit(group, format!("remove snippet {}", snippet.root_node()));
            }
            Ok(removed)
        })
    }

    /// Commit a group built outside the operator boundary
    ///
    /// # Errors
    ///
    /// `GroupInvariant` if the group is inconsistent; nothing is committed.
    pub fn commit_group(&mut self, group: SnippetGroup, label: impl Into<String>) -> Result<&Arc<SnippetGroup>> {
        group.check_invariants()?;
        self.commit(group, label);
        Ok(self.current())
    }

    /// Version [`Self::undo`] would move to, without moving
    pub fn peek_undo(&self) -> Option<&Arc<SnippetGroup>> {
        self.cursor.checked_sub(1).map(|i| self.entries[i].group())
    }

    /// Version [`Self::redo`] would move to, without moving
    pub fn peek_redo(&self) -> Option<&Arc<SnippetGroup>> {
        self.entries.get(self.cursor + 1).map(Revision::group)
    }

    /// Move back one version
    ///
    /// # Errors
    ///
    /// `NothingToUndo` at the first entry.
    pub fn undo(&mut self) -> Result<&Arc<SnippetGroup>> {
        if !self.can_undo() {
            return Err(StencilError::NothingToUndo);
        }
        self.cursor -= 1;
        tracing::debug!(cursor = self.cursor, "history.undo");
        Ok(self.current())
    }

    /// Move forward one version
    ///
    /// # Errors
    ///
    /// `NothingToRedo` at the last entry.
    pub fn redo(&mut self) -> Result<&Arc<SnippetGroup>> {
        if !self.can_redo() {
            return Err(StencilError::NothingToRedo);
        }
        self.cursor += 1;
        tracing::debug!(cursor = self.cursor, "history.redo");
        Ok(self.current())
    }

    /// A new, independent history starting at the current version
    pub fn fork(&self) -> History {
        History {
            entries: vec![Revision::new(Arc::clone(self.current()), "fork")],
            cursor: 0,
            max_entries: self.max_entries,
            catalog: Arc::clone(&self.catalog),
        }
    }

    fn commit(&mut self, group: SnippetGroup, label: impl Into<String>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Revision::new(Arc::new(group), label));
        self.cursor = self.entries.len() - 1;

        if let Some(max) = self.max_entries {
            if self.entries.len() > max {
                let excess = self.entries.len() - max;
                self.entries.drain(..excess);
                self.cursor -= excess;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TokenTreeParser;

    fn history_with(source: &str) -> (History, Arc<Snippet>) {
        let mut history = History::new(SnippetGroup::new("g"));
        let snippet = history.add_snippet(&TokenTreeParser, source).unwrap();
        (history, snippet)
    }

    #[test]
    fn test_undo_redo_move_cursor() {
        let (mut history, s) = history_with("f(x)");
        let before = Arc::clone(history.current());
        history
            .apply(OperatorId::RelaxSize, Target::Node(s.root_node()), Vec::new())
            .unwrap();
        let after = Arc::clone(history.current());

        assert!(Arc::ptr_eq(history.undo().unwrap(), &before));
        assert!(Arc::ptr_eq(history.redo().unwrap(), &after));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_edit_after_undo_discards_redo_branch() {
        let (mut history, s) = history_with("f(x)");
        history
            .apply(OperatorId::RelaxSize, Target::Node(s.root_node()), Vec::new())
            .unwrap();
        history.undo().unwrap();
        history
            .apply(OperatorId::GroundExact, Target::Node(s.root_node()), Vec::new())
            .unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert!(history.entries()[2].starts_with("ground-exact"));
    }

    #[test]
    fn test_nothing_to_undo_or_redo() {
        let mut history = History::new(SnippetGroup::new("g"));
        assert_eq!(history.undo().unwrap_err(), StencilError::NothingToUndo);
        assert_eq!(history.redo().unwrap_err(), StencilError::NothingToRedo);
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_rejected_apply_leaves_history_untouched() {
        let (mut history, s) = history_with("a");
        let len = history.len();
        let current = Arc::clone(history.current());
        assert!(history
            .apply(OperatorId::ReplaceByWildcard, Target::Node(s.root_node()), Vec::new())
            .is_err());
        assert_eq!(history.len(), len);
        assert!(Arc::ptr_eq(history.current(), &current));
    }

    #[test]
    fn test_max_entries_drops_oldest() {
        let mut history = History::with_config(
            SnippetGroup::new("g"),
            HistoryConfig {
                max_entries: Some(2),
            },
        );
        history.add_snippet(&TokenTreeParser, "a").unwrap();
        history.add_snippet(&TokenTreeParser, "b").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.cursor(), 1);
        assert_eq!(history.current().len(), 2);
    }

    #[test]
    fn test_fork_is_independent() {
        let (history, s) = history_with("f(x)");
        let mut fork = history.fork();
        fork.apply(OperatorId::RelaxSize, Target::Node(s.root_node()), Vec::new())
            .unwrap();
        assert_eq!(fork.len(), 2);
        assert_eq!(history.len(), 2);
        assert_ne!(fork.current(), history.current());
    }

    #[test]
    fn test_remove_missing_snippet_commits_nothing() {
        let (mut history, _) = history_with("a");
        assert!(history.remove_snippet(NodeId::new(u64::MAX)).unwrap().is_none());
        assert_eq!(history.len(), 2);
    }
}
