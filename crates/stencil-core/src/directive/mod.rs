//! Annotation grammar
//!
//! Annotated template text embeds `[ content ]@[ directives ]` regions in
//! otherwise arbitrary source text. Regions nest: the content of a region is
//! itself annotated text.
//!
//! ```text
//! Snippet     := Meta (Snippet)*  |  TXT+ (Snippet)*
//! Meta        := Premeta Postmeta
//! Premeta     := OPEN Snippet MIDDLE
//! Postmeta    := Directives CLOSE
//! Directives  := TXT+
//! ```
//!
//! with `OPEN = "["`, `MIDDLE = "]@["`, `CLOSE = "]"` and `TXT` the maximal
//! run of any other character.
//!
//! ## Entry points
//!
//! - [`extract_regions`]: all regions in pre-order
//! - [`mask`]: blank annotation syntax while keeping every offset valid
//! - [`content_text`]: the code with annotation syntax removed
//! - [`Directive::parse_all`]: split a region's directive text into items

pub mod item;
pub mod lexer;
pub mod mask;
pub mod parser;

pub use item::Directive;
pub use mask::{content_text, mask, MaskSpan};
pub use parser::{extract_regions, BoundRegion};
