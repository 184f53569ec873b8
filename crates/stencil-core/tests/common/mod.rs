use std::collections::BTreeMap;

use stencil_core::ast::{Ast, NodeId, SourceParser, TokenTreeParser};
use stencil_core::errors::{Result, StencilError};
use stencil_core::model::{Constraint, Grounding};
use stencil_core::{Example, History, QueryEngine, Snippet, SnippetGroup, Verdict};

/// A history over an empty group named `name`
#[allow(dead_code)]
pub fn new_history(name: &str) -> History {
    History::new(SnippetGroup::new(name))
}

/// A history holding one plain snippet parsed from `source`
#[allow(dead_code)]
pub fn history_with(source: &str) -> (History, std::sync::Arc<Snippet>) {
    let mut history = new_history("test");
    let snippet = history.add_snippet(&TokenTreeParser, source).unwrap();
    (history, snippet)
}

/// First node of `snippet` whose label is `label`
#[allow(dead_code)]
pub fn node_labelled(snippet: &Snippet, label: &str) -> NodeId {
    snippet
        .ast()
        .preorder()
        .iter()
        .copied()
        .find(|id| snippet.ast().node(*id).and_then(|n| n.label.as_deref()) == Some(label))
        .unwrap_or_else(|| panic!("no node labelled {label}"))
}

/// First node of `snippet` whose kind is `kind`
#[allow(dead_code)]
pub fn node_of_kind(snippet: &Snippet, kind: &str) -> NodeId {
    snippet
        .ast()
        .preorder()
        .iter()
        .copied()
        .find(|id| snippet.ast().node(*id).is_some_and(|n| n.kind == kind))
        .unwrap_or_else(|| panic!("no node of kind {kind}"))
}

/// Naive structural matcher over the token tree language
///
/// Every snippet of the group must match somewhere in the example (only at
/// the example root for exact grounding), all sharing one variable
/// environment. Logic conditions are ignored.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct StructuralEngine;

type Env = BTreeMap<String, String>;

#[allow(dead_code)]
impl StructuralEngine {
    fn match_snippet(snippet: &Snippet, example: &Ast, source: &str, env: &mut Env) -> bool {
        let root = snippet.root_node();
        let starts: Vec<NodeId> = match snippet.grounding() {
            Grounding::Exact => vec![example.root()],
            Grounding::Deep => example.preorder().to_vec(),
        };
        for start in starts {
            let mut attempt = env.clone();
            if Self::match_node(snippet, root, example, source, start, &mut attempt) {
                *env = attempt;
                return true;
            }
        }
        false
    }

    fn match_node(snippet: &Snippet, node: NodeId, example: &Ast, source: &str, target: NodeId, env: &mut Env) -> bool {
        let (Some(binding), Some(pattern), Some(candidate)) =
            (snippet.binding_for(node), snippet.node(node), example.node(target))
        else {
            return false;
        };
        let text = source[candidate.start..candidate.end].to_string();
        let children = snippet.children_of(node);
        match &binding.constraint {
            Constraint::Wildcard => true,
            Constraint::Variable(var) => match env.get(var.as_str()) {
                Some(bound) => *bound == text,
                None => {
                    env.insert(var.as_str().to_string(), text);
                    true
                }
            },
            Constraint::Equals(var) => env.get(var.as_str()) == Some(&text),
            Constraint::Exact => {
                pattern.kind == candidate.kind
                    && pattern.label == candidate.label
                    && Self::match_pairwise(snippet, &children, example, source, &candidate.children, env)
            }
            Constraint::Subtype => {
                pattern.kind == candidate.kind
                    && Self::match_pairwise(snippet, &children, example, source, &candidate.children, env)
            }
            Constraint::RelaxSize => {
                pattern.kind == candidate.kind
                    && Self::match_subsequence(snippet, &children, example, source, &candidate.children, env)
            }
        }
    }

    fn match_pairwise(
        snippet: &Snippet,
        children: &[NodeId],
        example: &Ast,
        source: &str,
        targets: &[NodeId],
        env: &mut Env,
    ) -> bool {
        children.len() == targets.len()
            && children
                .iter()
                .zip(targets)
                .all(|(c, t)| Self::match_node(snippet, *c, example, source, *t, env))
    }

    fn match_subsequence(
        snippet: &Snippet,
        children: &[NodeId],
        example: &Ast,
        source: &str,
        targets: &[NodeId],
        env: &mut Env,
    ) -> bool {
        let mut remaining = targets.iter();
        children.iter().all(|child| {
            remaining.any(|t| {
                let mut attempt = env.clone();
                let ok = Self::match_node(snippet, *child, example, source, *t, &mut attempt);
                if ok {
                    *env = attempt;
                }
                ok
            })
        })
    }
}

impl QueryEngine for StructuralEngine {
    fn evaluate(&self, group: &SnippetGroup, example: &Example) -> Result<Verdict> {
        let ast = TokenTreeParser.parse(&example.code).map_err(|e| StencilError::Query {
            message: e.to_string(),
        })?;
        let mut env = Env::new();
        let matches = !group.is_empty()
            && group
                .snippets()
                .iter()
                .all(|s| Self::match_snippet(s, &ast, &example.code, &mut env));
        Ok(if matches {
            Verdict::matched()
        } else {
            Verdict::rejected()
        })
    }
}

/// Engine that sleeps on every evaluation and never matches
#[allow(dead_code)]
#[derive(Debug)]
pub struct SlowEngine(pub std::time::Duration);

impl QueryEngine for SlowEngine {
    fn evaluate(&self, _group: &SnippetGroup, _example: &Example) -> Result<Verdict> {
        std::thread::sleep(self.0);
        Ok(Verdict::rejected())
    }
}

#[allow(dead_code)]
pub fn examples(codes: &[&str]) -> Vec<Example> {
    codes.iter().map(|c| Example::new(*c)).collect()
}
