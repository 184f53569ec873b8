//! Mask command
//!
//! Usage: stencil mask <FILE> [--span literal|meta-only]

use clap::{Args, ValueEnum};
use std::path::PathBuf;

use stencil_core::directive::{extract_regions, mask, MaskSpan};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SpanArg {
    /// Blank OPEN and everything from content start through CLOSE
    Literal,
    /// Blank only the annotation syntax, keep the annotated code
    MetaOnly,
}

impl From<SpanArg> for MaskSpan {
    fn from(span: SpanArg) -> Self {
        match span {
            SpanArg::Literal => MaskSpan::Literal,
            SpanArg::MetaOnly => MaskSpan::MetaOnly,
        }
    }
}

#[derive(Debug, Args)]
pub struct MaskArgs {
    /// Annotated file to read
    pub file: PathBuf,

    /// Which part of each annotation to blank
    #[arg(long, value_enum, default_value_t = SpanArg::Literal)]
    pub span: SpanArg,
}

/// Execute mask command
pub fn execute(args: MaskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let input = std::fs::read_to_string(&args.file)?;
    let regions = extract_regions(&input)?;
    print!("{}", mask(&input, &regions, args.span.into()));
    Ok(())
}
