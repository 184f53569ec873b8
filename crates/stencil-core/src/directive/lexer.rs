//! Tokenizer for the annotation grammar

/// Token kinds of the annotation grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `[`
    Open,
    /// `]@[`
    Middle,
    /// `]`
    Close,
    /// Maximal run of any other character
    Txt,
}

/// A token with its byte extent in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }
}

/// Split `input` into grammar tokens
///
/// `]@[` is recognised before `]`, so `]@[` never lexes as `CLOSE` followed
/// by text. Adjacent non-meta characters always merge into one `TXT` token.
pub fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut txt_start: Option<usize> = None;
    let mut i = 0;

    while i < bytes.len() {
        let meta = match bytes[i] {
            b'[' => Some((TokenKind::Open, 1)),
            b']' if bytes[i..].starts_with(b"]@[") => Some((TokenKind::Middle, 3)),
            b']' => Some((TokenKind::Close, 1)),
            _ => None,
        };

        match meta {
            Some((kind, width)) => {
                if let Some(start) = txt_start.take() {
                    tokens.push(Token {
                        kind: TokenKind::Txt,
                        start,
                        end: i,
                    });
                }
                tokens.push(Token {
                    kind,
                    start: i,
                    end: i + width,
                });
                i += width;
            }
            None => {
                txt_start.get_or_insert(i);
                i += 1;
            }
        }
    }

    if let Some(start) = txt_start {
        tokens.push(Token {
            kind: TokenKind::Txt,
            start,
            end: bytes.len(),
        });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_plain_text_is_one_token() {
        let tokens = tokenize("int x = 1;");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Txt);
        assert_eq!(tokens[0].text("int x = 1;"), "int x = 1;");
    }

    #[test]
    fn test_middle_wins_over_close() {
        assert_eq!(
            kinds("[x]@[y]"),
            vec![
                TokenKind::Open,
                TokenKind::Txt,
                TokenKind::Middle,
                TokenKind::Txt,
                TokenKind::Close
            ]
        );
    }

    #[test]
    fn test_close_followed_by_at_without_open_is_text() {
        assert_eq!(
            kinds("]@x"),
            vec![TokenKind::Close, TokenKind::Txt]
        );
    }

    #[test]
    fn test_multibyte_text_offsets_are_bytes() {
        let input = "é[x]@[y]";
        let tokens = tokenize(input);
        assert_eq!(tokens[0].end, 2);
        assert_eq!(tokens[1].start, 2);
    }

    #[test]
    fn test_empty_input_has_no_tokens() {
        assert!(tokenize("").is_empty());
    }
}
