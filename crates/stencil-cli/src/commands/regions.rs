//! Regions command
//!
//! Usage: stencil regions <FILE> [--json]

use clap::Args;
use std::path::PathBuf;

use stencil_core::directive::extract_regions;

#[derive(Debug, Args)]
pub struct RegionsArgs {
    /// Annotated file to read
    pub file: PathBuf,

    /// Print the regions as a JSON array
    #[arg(long)]
    pub json: bool,
}

/// Execute regions command
pub fn execute(args: RegionsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let input = std::fs::read_to_string(&args.file)?;
    let regions = extract_regions(&input)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&regions)?);
        return Ok(());
    }

    for region in &regions {
        println!(
            "{}[{}..{}] content {}..{} directives {:?}",
            "  ".repeat(region.depth),
            region.open_offset,
            region.close_offset,
            region.content_start,
            region.content_end,
            region.directive_text
        );
    }
    Ok(())
}
