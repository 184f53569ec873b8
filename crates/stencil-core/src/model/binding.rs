use serde::{Deserialize, Serialize};
use stencil_core_types::NodeId;

/// A logic variable, written `?name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogicVar(String);

impl LogicVar {
    /// Validate and wrap a variable name
    ///
    /// Returns `None` unless `name` starts with `?`, has at least one more
    /// character, and contains no whitespace or parentheses.
    pub fn parse(name: &str) -> Option<Self> {
        let valid = name.len() > 1
            && name.starts_with('?')
            && !name
                .chars()
                .any(|c| c.is_whitespace() || c == '(' || c == ')');
        valid.then(|| Self(name.to_string()))
    }

    /// The default variable naming a node
    pub fn for_node(node: NodeId) -> Self {
        Self(format!("?n{}", node.raw()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LogicVar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a template node is matched against candidate code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "var", rename_all = "kebab-case")]
pub enum Constraint {
    /// Same kind, same label, children matched pairwise
    Exact,
    /// Any subtree, bound to the variable
    Variable(LogicVar),
    /// Any subtree
    Wildcard,
    /// The value previously bound to the variable
    Equals(LogicVar),
    /// Same kind, any label
    Subtype,
    /// Same kind, children matched as an ordered subsequence
    RelaxSize,
}

impl Constraint {
    /// Variable referenced by this constraint, if any
    pub fn variable(&self) -> Option<&LogicVar> {
        match self {
            Constraint::Variable(var) | Constraint::Equals(var) => Some(var),
            _ => None,
        }
    }

    /// True if the constraint matches whole subtrees, so descendants carry no bindings
    pub fn covers_subtree(&self) -> bool {
        matches!(
            self,
            Constraint::Variable(_) | Constraint::Wildcard | Constraint::Equals(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Exact => "exact",
            Constraint::Variable(_) => "variable",
            Constraint::Wildcard => "wildcard",
            Constraint::Equals(_) => "equals",
            Constraint::Subtype => "subtype",
            Constraint::RelaxSize => "relax-size",
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.variable() {
            Some(var) => write!(f, "{} {}", self.name(), var),
            None => f.write_str(self.name()),
        }
    }
}

/// Where a snippet root may match in candidate code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Grounding {
    /// Anywhere in the candidate tree
    #[default]
    Deep,
    /// Only at the candidate's root
    Exact,
}

/// Side-table entry for one template node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub variable: LogicVar,
    pub constraint: Constraint,
    pub grounding: Grounding,
}

impl Binding {
    /// Default binding: exact match under the node's own variable
    pub fn exact(node: NodeId) -> Self {
        Self {
            variable: LogicVar::for_node(node),
            constraint: Constraint::Exact,
            grounding: Grounding::Deep,
        }
    }
}

/// A user-authored condition, opaque to the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicCondition(String);

impl LogicCondition {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Copy of this condition with every whole-token occurrence of `from` replaced by `to`
    pub fn rename_variable(&self, from: &LogicVar, to: &LogicVar) -> Self {
        let mut out = String::with_capacity(self.0.len());
        let mut token = String::new();
        let flush = |token: &mut String, out: &mut String| {
            if token.as_str() == from.as_str() {
                out.push_str(to.as_str());
            } else {
                out.push_str(token);
            }
            token.clear();
        };
        for c in self.0.chars() {
            if c.is_whitespace() || c == '(' || c == ')' {
                flush(&mut token, &mut out);
                out.push(c);
            } else {
                token.push(c);
            }
        }
        flush(&mut token, &mut out);
        Self(out)
    }
}

impl std::fmt::Display for LogicCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
