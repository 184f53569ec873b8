//! Opaque identity handles
//!
//! AST nodes are owned by an external parsing collaborator. The engine never
//! relies on the collaborator's own equality or hashing; it keys every side
//! table by these handles instead.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of one AST node
///
/// Handles are allocated by the parser that built the tree and are unique for
/// the lifetime of the process. Two handles are equal only if they name the
/// same node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Stable identity of one snippet
///
/// A snippet keeps its id across every version an operator derives from it,
/// which is what lets a rewritten snippet stay linked to its template.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnippetId(String);

impl SnippetId {
    /// Generate a new SnippetId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization and tests)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for SnippetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SnippetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
