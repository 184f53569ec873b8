//! Inspect command
//!
//! Usage: stencil inspect <FILE> [--config <TOML>]
//!
//! The file holds one annotated snippet, or several separated by lines that
//! contain only `---`.

use clap::Args;
use std::path::PathBuf;

use stencil_core::ast::{NodeId, TokenTreeParser};
use stencil_core::logging_facility::init;
use stencil_core::query::render_query;
use stencil_core::{Catalog, History, Snippet, SnippetGroup, StencilConfig};

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Annotated file to read
    pub file: PathBuf,

    /// Engine configuration (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Execute inspect command
pub fn execute(args: InspectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => {
            let config = StencilConfig::load(path)?;
            init(config.logging.profile);
            config
        }
        None => StencilConfig::default(),
    };
    let input = std::fs::read_to_string(&args.file)?;
    let name = args
        .file
        .file_stem()
        .map_or_else(|| "group".to_string(), |s| s.to_string_lossy().into_owned());

    let mut history = History::with_config(SnippetGroup::new(name), config.history);
    for section in split_sections(&input) {
        history.add_annotated_snippet(&TokenTreeParser, section)?;
    }

    let group = history.current();
    let catalog = Catalog::shared();
    println!("group: {}", group.name());
    for snippet in group.snippets() {
        println!();
        println!("snippet {}", snippet.id());
        for node in snippet.nodes() {
            let (Some(ast_node), Some(binding)) = (snippet.node(node), snippet.binding_for(node)) else {
                continue;
            };
            let indent = "  ".repeat(1 + nesting(snippet, node));
            println!("{}{} {}: {}", indent, node, ast_node.describe(), binding.constraint);
        }
        for condition in snippet.logic_conditions() {
            println!("  condition {}", condition);
        }
        println!("  menu:");
        for (category, operators) in catalog.menu(Some(&**snippet), Some(snippet.root_node())) {
            let names: Vec<&str> = operators.iter().map(|id| id.as_str()).collect();
            println!("    {}: {}", category, names.join(", "));
        }
    }
    println!();
    println!("query:");
    println!("{}", render_query(group));
    Ok(())
}

fn nesting(snippet: &Snippet, node: NodeId) -> usize {
    let mut depth = 0;
    let mut current = snippet.parent_of(node);
    while let Some(parent) = current {
        depth += 1;
        current = snippet.parent_of(parent);
    }
    depth
}

fn split_sections(input: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        if line.trim() == "---" {
            sections.push(&input[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    sections.push(&input[start..]);
    sections.into_iter().filter(|s| !s.trim().is_empty()).collect()
}
