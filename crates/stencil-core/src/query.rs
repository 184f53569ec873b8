//! Query collaborator interface
//!
//! Matching a group against code is the job of an external logic-query
//! engine. The core only needs to ask whether a group's derived query
//! matches an example, and to render that query as text.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::model::{Grounding, SnippetGroup};

/// A code fragment handed to the query engine as is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub code: String,
}

impl Example {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

/// Bindings produced by a successful match, one row per solution
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub matches: bool,
    pub table: Option<ResultTable>,
}

impl Verdict {
    pub fn matched() -> Self {
        Self {
            matches: true,
            table: None,
        }
    }

    pub fn rejected() -> Self {
        Self {
            matches: false,
            table: None,
        }
    }
}

/// The structural query engine
///
/// Implementations are shared with the off-thread search, hence `Send + Sync`.
pub trait QueryEngine: Send + Sync {
    /// Does the query derived from `group` match `example`?
    ///
    /// # Errors
    ///
    /// `Query` when the engine fails; search aborts with it.
    fn evaluate(&self, group: &SnippetGroup, example: &Example) -> Result<Verdict>;

    /// Textual form of the query derived from `group`
    fn render_query(&self, group: &SnippetGroup) -> String {
        render_query(group)
    }
}

/// Default rendering of a group's query
///
/// ```text
/// (group "name"
///   (snippet :root ?n1 :grounding deep
///     (?n1 Sequence exact)
///     (?n2 Identifier "x" variable ?x)
///     (condition (local ?x)))
///   (condition (differs ?a ?b)))
/// ```
pub fn render_query(group: &SnippetGroup) -> String {
    let mut out = String::new();
    write!(out, "(group {:?}", group.name()).ok();
    for snippet in group.snippets() {
        let root = snippet.root_node();
        let root_var = snippet
            .binding_for(root)
            .map(|b| b.variable.to_string())
            .unwrap_or_default();
        let grounding = match snippet.grounding() {
            Grounding::Deep => "deep",
            Grounding::Exact => "exact",
        };
        write!(out, "\n  (snippet :root {} :grounding {}", root_var, grounding).ok();
        for node in snippet.nodes() {
            let (Some(ast_node), Some(binding)) = (snippet.ast().node(node), snippet.binding_for(node)) else {
                continue;
            };
            write!(out, "\n    ({} {}", binding.variable, ast_node.kind).ok();
            if let Some(label) = &ast_node.label {
                write!(out, " {:?}", label).ok();
            }
            write!(out, " {})", binding.constraint).ok();
        }
        for condition in snippet.logic_conditions() {
            write!(out, "\n    (condition {})", condition).ok();
        }
        out.push(')');
    }
    for condition in group.conditions() {
        write!(out, "\n  (condition {})", condition).ok();
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TokenTreeParser;

    #[test]
    fn test_render_lists_bound_nodes() {
        let mut group = SnippetGroup::new("demo");
        let s = group.add_snippet(&TokenTreeParser, "x").unwrap();
        let text = render_query(&group);
        let var = s.binding_for(s.root_node()).unwrap().variable.to_string();
        assert!(text.starts_with("(group \"demo\""));
        assert!(text.contains(&format!("(snippet :root {} :grounding deep", var)));
        assert!(text.contains("Identifier \"x\" exact)"));
        assert!(text.ends_with("))"));
    }

    #[test]
    fn test_render_empty_group() {
        assert_eq!(render_query(&SnippetGroup::new("e")), "(group \"e\")");
    }
}
