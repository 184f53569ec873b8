//! Directive items
//!
//! The directive text of a region is a whitespace-separated list of items.
//! An item is a bare name (`relax-size`) or a parenthesized call whose first
//! element is the name and whose remaining elements are operands
//! (`(equals-variable ?x)`). Operands may themselves be balanced
//! parenthesized text, kept verbatim.

use serde::Serialize;

use super::parser::BoundRegion;
use crate::errors::{Result, StencilError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    pub name: String,
    pub operands: Vec<String>,
    /// Byte offset of the item in the annotated input
    pub offset: usize,
}

impl Directive {
    /// Parse the directive items of one region
    pub fn from_region(region: &BoundRegion) -> Result<Vec<Directive>> {
        Self::parse_all(&region.directive_text, region.directive_start)
    }

    /// Parse directive `text` whose first byte sits at `base` in the input
    ///
    /// # Errors
    ///
    /// `DirectiveParse` for unbalanced parentheses or an empty call.
    pub fn parse_all(text: &str, base: usize) -> Result<Vec<Directive>> {
        let mut directives = Vec::new();
        for (start, end) in split_items(text, 0, text.len(), base)? {
            let item = &text[start..end];
            if item.starts_with('(') {
                let inner = split_items(text, start + 1, end - 1, base)?;
                let Some(&(name_start, name_end)) = inner.first() else {
                    return Err(StencilError::DirectiveParse {
                        offset: base + start,
                        message: "empty directive call".to_string(),
                    });
                };
                let name = &text[name_start..name_end];
                if name.starts_with('(') {
                    return Err(StencilError::DirectiveParse {
                        offset: base + name_start,
                        message: "directive name must be a bare word".to_string(),
                    });
                }
                directives.push(Directive {
                    name: name.to_string(),
                    operands: inner[1..]
                        .iter()
                        .map(|&(s, e)| text[s..e].to_string())
                        .collect(),
                    offset: base + start,
                });
            } else {
                directives.push(Directive {
                    name: item.to_string(),
                    operands: Vec::new(),
                    offset: base + start,
                });
            }
        }
        Ok(directives)
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.operands.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "({} {})", self.name, self.operands.join(" "))
        }
    }
}

/// Split `text[from..to]` into top-level items: words or balanced groups
fn split_items(text: &str, from: usize, to: usize, base: usize) -> Result<Vec<(usize, usize)>> {
    let bytes = text.as_bytes();
    let mut items = Vec::new();
    let mut i = from;

    while i < to {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        match bytes[i] {
            b'(' => {
                let mut depth = 0usize;
                while i < to {
                    match bytes[i] {
                        b'(' => depth += 1,
                        b')' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    i += 1;
                }
                if i >= to {
                    return Err(StencilError::DirectiveParse {
                        offset: base + start,
                        message: "unbalanced '(' in directive".to_string(),
                    });
                }
                i += 1;
            }
            b')' => {
                return Err(StencilError::DirectiveParse {
                    offset: base + i,
                    message: "unbalanced ')' in directive".to_string(),
                });
            }
            _ => {
                while i < to
                    && !bytes[i].is_ascii_whitespace()
                    && bytes[i] != b'('
                    && bytes[i] != b')'
                {
                    i += 1;
                }
            }
        }
        items.push((start, i));
    }

    Ok(items)
}
