//! Recursive-descent extraction of annotation regions

use serde::Serialize;

use super::lexer::{tokenize, Token, TokenKind};
use crate::errors::{Result, StencilError};

/// One annotation occurrence in annotated text
///
/// All offsets are byte offsets into the annotated input. For
/// `[int]@[foo]` at offset 0:
///
/// ```text
/// [ i n t ] @ [ f o o ]
/// 0 1     4 5   7     10
/// ```
///
/// `open_offset = 0`, `content_start = 1`, `content_end = 4` (the `MIDDLE`
/// token), `directive_start = 7`, `close_offset = 10`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundRegion {
    pub open_offset: usize,
    pub content_start: usize,
    pub content_end: usize,
    pub directive_start: usize,
    pub close_offset: usize,
    pub directive_text: String,
    /// Nesting depth, 0 for top-level regions
    pub depth: usize,
}

impl BoundRegion {
    /// Offset of the `]@[` token
    pub fn middle_offset(&self) -> usize {
        self.content_end
    }

    /// Byte range of the whole annotation, `OPEN` through `CLOSE`
    pub fn span(&self) -> std::ops::Range<usize> {
        self.open_offset..self.close_offset + 1
    }

    /// Raw (still annotated) content text
    pub fn content<'a>(&self, input: &'a str) -> &'a str {
        &input[self.content_start..self.content_end]
    }

    /// True if `other` lies entirely inside this region's content
    pub fn encloses(&self, other: &BoundRegion) -> bool {
        other.open_offset >= self.content_start && other.close_offset < self.content_end
    }
}

/// Extract every annotation region of `input`, in pre-order
///
/// Outer regions precede the regions nested in them; siblings appear in text
/// order. Input without annotations yields no regions.
///
/// # Errors
///
/// Returns `DirectiveParse` with the offending offset for unbalanced or
/// malformed annotation syntax. Extraction aborts at the first error.
///
/// # Example
///
/// ```
/// use stencil_core::directive::extract_regions;
///
/// let regions = extract_regions("[[int]@[foo] [x]@[relax]]@[dunno]").unwrap();
/// let names: Vec<_> = regions.iter().map(|r| r.directive_text.as_str()).collect();
/// assert_eq!(names, ["dunno", "foo", "relax"]);
/// ```
pub fn extract_regions(input: &str) -> Result<Vec<BoundRegion>> {
    let mut parser = Parser {
        input,
        tokens: tokenize(input),
        pos: 0,
        regions: Vec::new(),
    };
    parser.parse_document()?;
    Ok(parser.regions)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    regions: Vec<BoundRegion>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> StencilError {
        StencilError::DirectiveParse {
            offset,
            message: message.into(),
        }
    }

    fn parse_document(&mut self) -> Result<()> {
        if self.tokens.is_empty() {
            return Ok(());
        }
        self.parse_snippet(0)?;
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(
                token.start,
                format!("unbalanced '{}'", token.text(self.input)),
            )),
        }
    }

    // Snippet := (Meta | TXT)+
    fn parse_snippet(&mut self, depth: usize) -> Result<()> {
        let start = self.peek().map_or(self.input.len(), |t| t.start);
        let mut items = 0usize;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Open => self.parse_meta(depth)?,
                TokenKind::Txt => {
                    self.advance();
                }
                TokenKind::Middle | TokenKind::Close => break,
            }
            items += 1;
        }

        if items == 0 {
            return Err(self.error(start, "empty annotation content"));
        }
        Ok(())
    }

    // Meta := OPEN Snippet MIDDLE Directives CLOSE
    fn parse_meta(&mut self, depth: usize) -> Result<()> {
        let open = match self.advance() {
            Some(token) if token.kind == TokenKind::Open => token,
            Some(token) => return Err(self.error(token.start, "expected '['")),
            None => return Err(self.error(self.input.len(), "expected '['")),
        };

        // Reserve the slot now so the outer region precedes nested ones.
        let slot = self.regions.len();
        self.regions.push(BoundRegion {
            open_offset: open.start,
            content_start: open.end,
            content_end: open.end,
            directive_start: open.end,
            close_offset: open.end,
            directive_text: String::new(),
            depth,
        });

        self.parse_snippet(depth + 1)?;

        let middle = self.expect(TokenKind::Middle, open.start)?;
        let directives = match self.peek() {
            Some(token) if token.kind == TokenKind::Txt => {
                self.advance();
                token
            }
            Some(token) if token.kind == TokenKind::Open => {
                return Err(self.error(token.start, "'[' is not allowed in directive text"));
            }
            Some(token) => return Err(self.error(token.start, "empty directive text")),
            None => return Err(self.unterminated(open.start)),
        };
        let close = self.expect(TokenKind::Close, open.start)?;

        let region = &mut self.regions[slot];
        region.content_end = middle.start;
        region.directive_start = directives.start;
        region.close_offset = close.start;
        region.directive_text = directives.text(self.input).to_string();
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind, open_offset: usize) -> Result<Token> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            Some(token) => {
                let expected = match kind {
                    TokenKind::Middle => "']@['",
                    TokenKind::Close => "']'",
                    TokenKind::Open => "'['",
                    TokenKind::Txt => "text",
                };
                Err(self.error(
                    token.start,
                    format!(
                        "expected {} for annotation opened at {}, found '{}'",
                        expected,
                        open_offset,
                        token.text(self.input)
                    ),
                ))
            }
            None => Err(self.unterminated(open_offset)),
        }
    }

    fn unterminated(&self, open_offset: usize) -> StencilError {
        self.error(
            self.input.len(),
            format!("unterminated annotation opened at {}", open_offset),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error_offset(input: &str) -> usize {
        match extract_regions(input) {
            Err(StencilError::DirectiveParse { offset, .. }) => offset,
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_has_no_regions() {
        assert!(extract_regions("int x = 1;").unwrap().is_empty());
        assert!(extract_regions("").unwrap().is_empty());
    }

    #[test]
    fn test_single_region_offsets() {
        let regions = extract_regions("[int]@[foo]").unwrap();
        assert_eq!(regions.len(), 1);
        let r = &regions[0];
        assert_eq!(r.open_offset, 0);
        assert_eq!(r.content_start, 1);
        assert_eq!(r.content_end, 4);
        assert_eq!(r.directive_start, 7);
        assert_eq!(r.close_offset, 10);
        assert_eq!(r.directive_text, "foo");
        assert_eq!(r.content("[int]@[foo]"), "int");
    }

    #[test]
    fn test_nested_regions_in_preorder() {
        let input = "[[int]@[foo] [x]@[relax]]@[dunno]";
        let regions = extract_regions(input).unwrap();
        assert_eq!(regions.len(), 3);

        let outer = &regions[0];
        assert_eq!(outer.directive_text, "dunno");
        assert_eq!(outer.content_start, 1);
        assert_eq!(outer.depth, 0);

        assert_eq!(regions[1].directive_text, "foo");
        assert_eq!(regions[2].directive_text, "relax");
        for inner in &regions[1..] {
            assert!(outer.encloses(inner));
            assert_eq!(inner.depth, 1);
        }
        assert_eq!(regions[1].content(input), "int");
        assert_eq!(regions[2].content(input), "x");
    }

    #[test]
    fn test_text_around_regions() {
        let regions = extract_regions("a = [b]@[var] + [c]@[wild];").unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].open_offset, 4);
        assert_eq!(regions[1].directive_text, "wild");
    }

    #[test]
    fn test_unterminated_annotation() {
        assert_eq!(parse_error_offset("[int]@[foo"), 10);
        assert_eq!(parse_error_offset("[int"), 4);
    }

    #[test]
    fn test_stray_close_is_error() {
        assert_eq!(parse_error_offset("int]"), 3);
        assert_eq!(parse_error_offset("a ]@[b]"), 2);
    }

    #[test]
    fn test_empty_content_and_directives_are_errors() {
        assert_eq!(parse_error_offset("[]@[x]"), 1);
        assert_eq!(parse_error_offset("[x]@[]"), 5);
    }

    #[test]
    fn test_open_inside_directives_is_error() {
        assert_eq!(parse_error_offset("[x]@[a [b]"), 7);
    }

    #[test]
    fn test_close_where_middle_expected() {
        assert_eq!(parse_error_offset("[x] y"), 2);
    }
}
