//! Reference source parser over token trees
//!
//! Understands a deliberately small language: identifiers, numbers, string
//! literals, single-character punctuation, and `( )` / `{ }` groups. The
//! root is always a `Sequence` node spanning the first to the last token.
//! It stands in for a real language front end wherever the engine has to be
//! driven end to end.

use std::sync::atomic::{AtomicU64, Ordering};

use super::{Ast, AstNode, NodeId, SourceParser};
use crate::errors::{Result, StencilError};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> NodeId {
    NodeId::new(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
}

pub const KIND_SEQUENCE: &str = "Sequence";
pub const KIND_PAREN: &str = "Paren";
pub const KIND_BLOCK: &str = "Block";
pub const KIND_IDENTIFIER: &str = "Identifier";
pub const KIND_NUMBER: &str = "Number";
pub const KIND_STRING: &str = "String";
pub const KIND_PUNCT: &str = "Punct";

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenTreeParser;

impl SourceParser for TokenTreeParser {
    fn parse(&self, source: &str) -> Result<Ast> {
        let mut builder = Builder {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            nodes: Vec::new(),
        };
        let root = next_id();
        builder.nodes.push(AstNode {
            id: root,
            kind: KIND_SEQUENCE.to_string(),
            label: None,
            start: 0,
            end: 0,
            parent: None,
            children: Vec::new(),
        });

        let children = builder.items(root, None)?;
        let (Some(first), Some(last)) = (children.first(), children.last()) else {
            return Err(StencilError::SourceParse {
                offset: 0,
                message: "source contains no code".to_string(),
            });
        };
        let start = builder.span_of(*first).0;
        let end = builder.span_of(*last).1;
        let root_node = &mut builder.nodes[0];
        root_node.start = start;
        root_node.end = end;
        root_node.children = children;

        Ast::from_nodes(root, builder.nodes)
    }
}

struct Builder<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    nodes: Vec<AstNode>,
}

impl Builder<'_> {
    fn span_of(&self, id: NodeId) -> (usize, usize) {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .map_or((0, 0), |n| (n.start, n.end))
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> StencilError {
        StencilError::SourceParse {
            offset,
            message: message.into(),
        }
    }

    /// Parse items until `closer` (or end of input when `None`)
    fn items(&mut self, parent: NodeId, closer: Option<u8>) -> Result<Vec<NodeId>> {
        let mut children = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(&byte) = self.bytes.get(self.pos) else {
                return match closer {
                    None => Ok(children),
                    Some(c) => Err(self.error(self.pos, format!("expected '{}'", c as char))),
                };
            };
            match byte {
                b')' | b'}' => {
                    if closer == Some(byte) {
                        return Ok(children);
                    }
                    return Err(self.error(self.pos, format!("unexpected '{}'", byte as char)));
                }
                b'(' | b'{' => children.push(self.group(parent, byte)?),
                _ => children.push(self.atom(parent)?),
            }
        }
    }

    fn group(&mut self, parent: NodeId, opener: u8) -> Result<NodeId> {
        let (kind, closer) = if opener == b'(' {
            (KIND_PAREN, b')')
        } else {
            (KIND_BLOCK, b'}')
        };
        let id = next_id();
        let start = self.pos;
        let index = self.nodes.len();
        self.nodes.push(AstNode {
            id,
            kind: kind.to_string(),
            label: None,
            start,
            end: start,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.pos += 1;
        let children = self.items(id, Some(closer))?;
        self.pos += 1;
        let node = &mut self.nodes[index];
        node.end = self.pos;
        node.children = children;
        Ok(id)
    }

    fn atom(&mut self, parent: NodeId) -> Result<NodeId> {
        let start = self.pos;
        let first = self.bytes[start];
        let kind = if first.is_ascii_alphabetic() || first == b'_' {
            while self.pos < self.bytes.len()
                && (self.bytes[self.pos].is_ascii_alphanumeric() || self.bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }
            KIND_IDENTIFIER
        } else if first.is_ascii_digit() {
            while self.pos < self.bytes.len()
                && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'.')
            {
                self.pos += 1;
            }
            KIND_NUMBER
        } else if first == b'"' {
            self.pos += 1;
            loop {
                match self.bytes.get(self.pos) {
                    None => return Err(self.error(start, "unterminated string literal")),
                    Some(b'\\') => self.pos += 2,
                    Some(b'"') => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => self.pos += 1,
                }
            }
            KIND_STRING
        } else {
            // One punctuation character, which may be multi-byte.
            let width = self.source[start..].chars().next().map_or(1, char::len_utf8);
            self.pos += width;
            KIND_PUNCT
        };

        let end = self.pos.min(self.bytes.len());
        let id = next_id();
        self.nodes.push(AstNode {
            id,
            kind: kind.to_string(),
            label: Some(self.source[start..end].to_string()),
            start,
            end,
            parent: Some(parent),
            children: Vec::new(),
        });
        Ok(id)
    }
}
