//! Masking of annotation syntax
//!
//! Downstream consumers (the source parser, highlighting) want the annotated
//! text without its annotation syntax but with every byte offset unchanged,
//! so masked characters are replaced by spaces rather than removed. Newlines
//! are kept so line numbers survive as well.

use serde::{Deserialize, Serialize};

use super::parser::BoundRegion;

/// Which part of each annotation is blanked
///
/// The intended span of the masking pass is unresolved. `Literal` blanks the
/// `OPEN` character and every offset from content start through `CLOSE`
/// inclusive, which also blanks the annotated code. `MetaOnly` blanks `OPEN`
/// and `MIDDLE` through `CLOSE` inclusive and keeps the annotated code; it is
/// what snippet construction uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaskSpan {
    #[default]
    Literal,
    MetaOnly,
}

fn masked_bytes(len: usize, regions: &[BoundRegion], span: MaskSpan) -> Vec<bool> {
    let mut masked = vec![false; len];
    for region in regions {
        masked[region.open_offset] = true;
        let from = match span {
            MaskSpan::Literal => region.content_start,
            MaskSpan::MetaOnly => region.middle_offset(),
        };
        for flag in &mut masked[from..=region.close_offset] {
            *flag = true;
        }
    }
    masked
}

/// Render `input` with annotation syntax blanked
///
/// `regions` must come from [`super::extract_regions`] on the same input.
/// The result has exactly the byte length of `input`.
///
/// # Example
///
/// ```
/// use stencil_core::directive::{extract_regions, mask, MaskSpan};
///
/// let input = "a = [b]@[var];";
/// let regions = extract_regions(input).unwrap();
/// assert_eq!(mask(input, &regions, MaskSpan::MetaOnly), "a =  b       ;");
/// assert_eq!(mask(input, &regions, MaskSpan::Literal), "a =          ;");
/// ```
pub fn mask(input: &str, regions: &[BoundRegion], span: MaskSpan) -> String {
    let masked = masked_bytes(input.len(), regions, span);
    let mut out = String::with_capacity(input.len());
    for (offset, ch) in input.char_indices() {
        if masked[offset] && ch != '\n' {
            out.extend(std::iter::repeat(' ').take(ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }
    out
}

/// The code of `input` with all annotation syntax removed
///
/// Concatenates, in source order, every character outside the annotation
/// meta-syntax. For a well-formed input this is exactly the sequence of code
/// `TXT` tokens (directive text excluded).
pub fn content_text(input: &str, regions: &[BoundRegion]) -> String {
    let masked = masked_bytes(input.len(), regions, MaskSpan::MetaOnly);
    input
        .char_indices()
        .filter(|(offset, _)| !masked[*offset])
        .map(|(_, ch)| ch)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::extract_regions;

    #[test]
    fn test_mask_preserves_length() {
        let input = "[[int]@[foo] [x]@[relax]]@[dunno]";
        let regions = extract_regions(input).unwrap();
        for span in [MaskSpan::Literal, MaskSpan::MetaOnly] {
            assert_eq!(mask(input, &regions, span).len(), input.len());
        }
    }

    #[test]
    fn test_meta_only_keeps_nested_code() {
        let input = "[[int]@[foo] [x]@[relax]]@[dunno]";
        let regions = extract_regions(input).unwrap();
        let masked = mask(input, &regions, MaskSpan::MetaOnly);
        assert_eq!(masked.trim(), "int         x");
        assert_eq!(&masked[2..5], "int");
        assert_eq!(&masked[14..15], "x");
    }

    #[test]
    fn test_literal_blanks_everything_annotated() {
        let input = "f([x]@[var]);";
        let regions = extract_regions(input).unwrap();
        assert_eq!(mask(input, &regions, MaskSpan::Literal), "f(         );");
    }

    #[test]
    fn test_mask_keeps_newlines_and_multibyte_width() {
        let input = "[é\nx]@[d]";
        let regions = extract_regions(input).unwrap();
        let masked = mask(input, &regions, MaskSpan::Literal);
        assert_eq!(masked.len(), input.len());
        assert!(masked.contains('\n'));
    }

    #[test]
    fn test_content_text_drops_meta_syntax() {
        let input = "[[int]@[foo] [x]@[relax]]@[dunno]";
        let regions = extract_regions(input).unwrap();
        assert_eq!(content_text(input, &regions), "int x");
    }

    #[test]
    fn test_content_text_without_regions_is_identity() {
        assert_eq!(content_text("plain", &[]), "plain");
    }
}
